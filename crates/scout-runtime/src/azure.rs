//! Azure OpenAI Provider
//!
//! `LlmProvider` for an Azure OpenAI chat-completions deployment. Requests go
//! to `{endpoint}/openai/deployments/{deployment}/chat/completions` with the
//! key in the `api-key` header.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use scout_core::{
    error::{AgentError, Result},
    message::Message,
    provider::{
        Completion, FinishReason, GenerationOptions, LlmProvider, ModelInfo, ProviderInfo,
        TokenUsage,
    },
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_VERSION: &str = "2024-06-01";

/// Azure OpenAI configuration
#[derive(Clone, Debug)]
pub struct AzureConfig {
    pub api_key: String,
    /// Resource endpoint, e.g. `https://my-resource.openai.azure.com`
    pub endpoint: String,
    /// Deployment name
    pub deployment: String,
    pub api_version: String,
    pub timeout_secs: u64,
}

impl AzureConfig {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        deployment: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            deployment: deployment.into(),
            api_version: DEFAULT_API_VERSION.into(),
            timeout_secs: 60,
        }
    }

    /// Read `AZURE_OPENAI_API_KEY`, `AZURE_OPENAI_ENDPOINT`, `MODEL_NAME`
    /// and `AZURE_OPENAI_API_VERSION`
    pub fn from_env() -> Result<Self> {
        let required = |name: &str| {
            std::env::var(name)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| AgentError::Config(format!("{name} must be set for Azure OpenAI")))
        };

        let mut config = Self::new(
            required("AZURE_OPENAI_ENDPOINT")?,
            required("AZURE_OPENAI_API_KEY")?,
            required("MODEL_NAME")?,
        );
        if let Ok(version) = std::env::var("AZURE_OPENAI_API_VERSION") {
            config.api_version = version;
        }
        Ok(config)
    }

    fn url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint.trim_end_matches('/'),
            self.deployment,
            self.api_version
        )
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    #[serde(skip_serializing_if = "no_stops")]
    stop: &'a [String],
}

const fn no_stops(stop: &&[String]) -> bool {
    stop.is_empty()
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct WireUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

/// Azure OpenAI chat-completions provider
pub struct AzureOpenAiProvider {
    client: Client,
    config: AzureConfig,
}

impl AzureOpenAiProvider {
    pub fn new(config: AzureConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(AzureConfig::from_env()?)
    }

    fn map_send_error(&self, err: &reqwest::Error) -> AgentError {
        if err.is_timeout() {
            AgentError::Timeout(Duration::from_secs(self.config.timeout_secs))
        } else if err.is_connect() {
            AgentError::ProviderUnavailable(err.to_string())
        } else {
            AgentError::Provider(err.to_string())
        }
    }

    fn map_status(status: StatusCode, body: String) -> AgentError {
        let detail = format!("status={status}: {body}");
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AgentError::Auth(detail),
            StatusCode::TOO_MANY_REQUESTS => AgentError::RateLimited(detail),
            s if s.is_server_error() => AgentError::ProviderUnavailable(detail),
            _ => AgentError::Provider(detail),
        }
    }
}

#[async_trait]
impl LlmProvider for AzureOpenAiProvider {
    async fn info(&self) -> Result<ProviderInfo> {
        Ok(ProviderInfo {
            name: "Azure OpenAI".into(),
            version: Some(self.config.api_version.clone()),
            models: self.list_models().await?,
        })
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(!self.config.api_key.is_empty() && !self.config.endpoint.is_empty())
    }

    async fn complete(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<Completion> {
        let body = ChatRequest {
            messages: messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            top_p: options.top_p,
            stop: &options.stop_sequences,
        };

        let resp = self
            .client
            .post(self.config.url())
            .header("api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(&e))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            tracing::warn!(%status, deployment = %self.config.deployment, "Azure OpenAI request failed");
            return Err(Self::map_status(status, text));
        }

        let parsed: ChatResponse = resp
            .json()
            .await
            .map_err(|e| AgentError::Parse(format!("Invalid chat completion body: {e}")))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::Parse("Chat completion had no choices".into()))?;

        Ok(Completion {
            content: choice.message.content.unwrap_or_default(),
            model: parsed
                .model
                .unwrap_or_else(|| self.config.deployment.clone()),
            usage: parsed
                .usage
                .map(|u| TokenUsage::from_counts(u.prompt_tokens, u.completion_tokens)),
            finish_reason: choice.finish_reason.as_deref().map(FinishReason::from_wire),
        })
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        Ok(vec![ModelInfo::named(self.config.deployment.clone())])
    }
}
