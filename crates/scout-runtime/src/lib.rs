//! # scout-runtime
//!
//! Concrete text-generation providers for scout.
//!
//! ## Providers
//!
//! - **Azure OpenAI** (feature `azure`): hosted chat completions
//! - **Ollama** (feature `ollama`): local inference
//!
//! ## Usage
//!
//! ```rust,ignore
//! let runtime = scout_runtime::provider_from_env()?;
//! let agent = Agent::builder()
//!     .provider(runtime.provider.clone())
//!     .model(&runtime.model)
//!     .instructions("Summarize.")
//!     .build()?;
//! ```

#[cfg(feature = "azure")]
pub mod azure;
#[cfg(feature = "ollama")]
pub mod ollama;

use std::sync::Arc;

#[cfg(feature = "azure")]
pub use azure::{AzureConfig, AzureOpenAiProvider};
#[cfg(feature = "ollama")]
pub use ollama::{OllamaConfig, OllamaProvider};

pub use scout_core::{AgentError, LlmProvider, Result};

/// Which backend is serving generation calls
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderKind {
    Azure,
    Ollama,
}

impl ProviderKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Azure => "azure",
            Self::Ollama => "ollama",
        }
    }

    /// Resolve from an explicit `SCOUT_PROVIDER` value, or infer from whether
    /// an Azure key is present
    pub fn resolve(explicit: Option<&str>, azure_key_present: bool) -> Result<Self> {
        match explicit.map(|s| s.trim().to_ascii_lowercase()) {
            Some(s) if s == "azure" => Ok(Self::Azure),
            Some(s) if s == "ollama" => Ok(Self::Ollama),
            Some(other) if !other.is_empty() => Err(AgentError::Config(format!(
                "Unknown SCOUT_PROVIDER '{other}' (expected azure or ollama)"
            ))),
            _ if azure_key_present => Ok(Self::Azure),
            _ => Ok(Self::Ollama),
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The provider selected for this process and the model its agents use
#[derive(Clone)]
pub struct RuntimeProvider {
    pub kind: ProviderKind,
    pub provider: Arc<dyn LlmProvider>,
    pub model: String,
}

/// Build the provider described by the environment
///
/// Missing Azure credentials are a configuration error, raised before any
/// request is served.
pub fn provider_from_env() -> Result<RuntimeProvider> {
    let explicit = std::env::var("SCOUT_PROVIDER").ok();
    let azure_key = std::env::var("AZURE_OPENAI_API_KEY").is_ok_and(|k| !k.trim().is_empty());
    let kind = ProviderKind::resolve(explicit.as_deref(), azure_key)?;
    let model_override = std::env::var("SCOUT_MODEL").ok().filter(|m| !m.trim().is_empty());

    match kind {
        #[cfg(feature = "azure")]
        ProviderKind::Azure => {
            let config = AzureConfig::from_env()?;
            let model = model_override.unwrap_or_else(|| config.deployment.clone());
            Ok(RuntimeProvider {
                kind,
                provider: Arc::new(AzureOpenAiProvider::new(config)?),
                model,
            })
        }
        #[cfg(feature = "ollama")]
        ProviderKind::Ollama => Ok(RuntimeProvider {
            kind,
            provider: Arc::new(OllamaProvider::from_env()),
            model: model_override.unwrap_or_else(|| "llama3.2".into()),
        }),
        #[allow(unreachable_patterns)]
        other => Err(AgentError::Config(format!(
            "Provider '{other}' is not compiled into this build"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_explicit() {
        assert_eq!(ProviderKind::resolve(Some("Azure"), false).unwrap(), ProviderKind::Azure);
        assert_eq!(ProviderKind::resolve(Some(" ollama "), true).unwrap(), ProviderKind::Ollama);
    }

    #[test]
    fn test_resolve_inferred() {
        assert_eq!(ProviderKind::resolve(None, true).unwrap(), ProviderKind::Azure);
        assert_eq!(ProviderKind::resolve(None, false).unwrap(), ProviderKind::Ollama);
        assert_eq!(ProviderKind::resolve(Some(""), false).unwrap(), ProviderKind::Ollama);
    }

    #[test]
    fn test_resolve_unknown() {
        let err = ProviderKind::resolve(Some("bard"), true).unwrap_err();
        assert!(matches!(err, AgentError::Config(_)));
    }
}
