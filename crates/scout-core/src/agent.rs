//! Role Agents
//!
//! An [`Agent`] is one role in a pipeline: a fixed system instruction bound
//! to a provider. The instruction is configuration, not logic; the agent's
//! only capability is turning an input string into generated text.

use std::sync::Arc;
use std::time::Duration;

use crate::error::{AgentError, Result};
use crate::message::Message;
use crate::provider::{GenerationOptions, LlmProvider};

/// Default upper bound on a single generation call
pub const DEFAULT_AGENT_TIMEOUT: Duration = Duration::from_secs(30);

/// A named role with its own instruction and generation options
#[derive(Clone)]
pub struct Agent {
    name: String,
    instructions: String,
    provider: Arc<dyn LlmProvider>,
    options: GenerationOptions,
    timeout: Duration,
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field("model", &self.options.model)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Agent {
    pub fn builder() -> AgentBuilder {
        AgentBuilder::new()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    pub const fn options(&self) -> &GenerationOptions {
        &self.options
    }

    /// Run the role on a single input
    pub async fn run(&self, input: &str) -> Result<String> {
        self.run_with_context(input, None).await
    }

    /// Run with an optional extra context block placed after the instruction
    pub async fn run_with_context(&self, input: &str, context: Option<&str>) -> Result<String> {
        let mut messages = vec![Message::system(&self.instructions).with_name(&self.name)];
        if let Some(context) = context.filter(|c| !c.trim().is_empty()) {
            messages.push(Message::system(context).with_name(&self.name));
        }
        messages.push(Message::user(input));

        tracing::debug!(
            agent = %self.name,
            model = %self.options.model,
            input_chars = input.len(),
            "Running agent"
        );

        let completion = tokio::time::timeout(
            self.timeout,
            self.provider.complete(&messages, &self.options),
        )
        .await
        .map_err(|_| AgentError::Timeout(self.timeout))??;

        tracing::debug!(
            agent = %self.name,
            output_chars = completion.content.len(),
            "Agent finished"
        );

        Ok(completion.content)
    }
}

/// Builder for [`Agent`]
pub struct AgentBuilder {
    name: String,
    instructions: String,
    provider: Option<Arc<dyn LlmProvider>>,
    options: GenerationOptions,
    timeout: Duration,
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self {
            name: "agent".into(),
            instructions: String::new(),
            provider: None,
            options: GenerationOptions::default(),
            timeout: DEFAULT_AGENT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    #[must_use]
    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.options.model = model.into();
        self
    }

    #[must_use]
    pub const fn temperature(mut self, temp: f32) -> Self {
        self.options.temperature = temp;
        self
    }

    #[must_use]
    pub fn options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<Agent> {
        let provider = self
            .provider
            .ok_or_else(|| AgentError::Config("Provider is required".into()))?;

        if self.instructions.trim().is_empty() {
            return Err(AgentError::Config(format!(
                "Agent '{}' has no instructions",
                self.name
            )));
        }

        Ok(Agent {
            name: self.name,
            instructions: self.instructions,
            provider,
            options: self.options,
            timeout: self.timeout,
        })
    }
}
