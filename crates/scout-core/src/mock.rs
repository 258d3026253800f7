//! Mock Provider
//!
//! Scripted, call-counting [`LlmProvider`] for tests and offline runs.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::{AgentError, Result};
use crate::message::Message;
use crate::provider::{Completion, GenerationOptions, LlmProvider, ModelInfo, ProviderInfo};

/// One scripted answer
#[derive(Clone, Debug)]
pub enum MockReply {
    Text(String),
    Error(String),
}

/// In-memory provider that replays scripted replies in order
///
/// Once the script is exhausted every call returns the default reply.
pub struct MockProvider {
    script: Mutex<VecDeque<MockReply>>,
    default_reply: MockReply,
    delay: Option<Duration>,
    calls: AtomicUsize,
    requests: Mutex<Vec<Vec<Message>>>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            default_reply: MockReply::Text("mock response".into()),
            delay: None,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A provider whose every call fails
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            default_reply: MockReply::Error(reason.into()),
            ..Self::new()
        }
    }

    /// Queue a text reply
    #[must_use]
    pub fn with_reply(self, text: impl Into<String>) -> Self {
        self.push(MockReply::Text(text.into()))
    }

    /// Queue a failing reply
    #[must_use]
    pub fn with_error(self, reason: impl Into<String>) -> Self {
        self.push(MockReply::Error(reason.into()))
    }

    #[must_use]
    pub fn with_default_reply(mut self, text: impl Into<String>) -> Self {
        self.default_reply = MockReply::Text(text.into());
        self
    }

    /// Sleep before answering each call
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn push(mut self, reply: MockReply) -> Self {
        self.script.get_mut().push_back(reply);
        self
    }

    /// Number of `complete` calls made so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Message lists received, in call order
    pub async fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    async fn info(&self) -> Result<ProviderInfo> {
        Ok(ProviderInfo {
            name: "Mock".into(),
            version: None,
            models: vec![ModelInfo::named("mock")],
        })
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    async fn complete(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<Completion> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().await.push(messages.to_vec());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let reply = self
            .script
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| self.default_reply.clone());

        match reply {
            MockReply::Text(text) => Ok(Completion::text(text, options.model.clone())),
            MockReply::Error(reason) => Err(AgentError::Provider(reason)),
        }
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        Ok(vec![ModelInfo::named("mock")])
    }
}
