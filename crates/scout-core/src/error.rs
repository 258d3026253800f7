//! Error Types

use std::time::Duration;

use thiserror::Error;

/// Result type alias for text-generation and agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Errors raised by providers, agents and preference stores
#[derive(Error, Debug)]
pub enum AgentError {
    /// Provider returned an error response
    #[error("Provider error: {0}")]
    Provider(String),

    /// Provider unreachable or not responding
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Call exceeded its deadline
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// Response could not be interpreted
    #[error("Parse error: {0}")]
    Parse(String),

    /// Preference store failure
    #[error("Session error: {0}")]
    Session(String),

    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl AgentError {
    /// Check if a retry could plausibly succeed
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ProviderUnavailable(_) | Self::RateLimited(_) | Self::Timeout(_)
        )
    }

    /// Convert to a message safe to show an end user
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Provider(msg) => format!("The AI service encountered an error: {msg}"),
            Self::ProviderUnavailable(_) => {
                "The AI service is currently unavailable. Please try again.".into()
            }
            Self::Timeout(limit) => format!("The AI service did not answer within {limit:?}."),
            Self::RateLimited(_) => "You've made too many requests. Please wait a moment.".into(),
            Self::Auth(_) => "Authentication failed. Please check your credentials.".into(),
            Self::Config(msg) => format!("The service is misconfigured: {msg}"),
            _ => "An unexpected error occurred.".into(),
        }
    }
}

impl From<anyhow::Error> for AgentError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(AgentError::Timeout(Duration::from_secs(20)).is_retryable());
        assert!(AgentError::ProviderUnavailable("down".into()).is_retryable());
        assert!(!AgentError::Parse("bad".into()).is_retryable());
        assert!(!AgentError::Config("missing key".into()).is_retryable());
    }

    #[test]
    fn test_user_message_hides_internal_detail() {
        let err = AgentError::Other("stack trace goes here".into());
        assert_eq!(err.user_message(), "An unexpected error occurred.");

        let err = AgentError::Timeout(Duration::from_secs(15));
        assert!(err.user_message().contains("within 15s"));
    }

    #[test]
    fn test_timeout_keeps_sub_second_precision() {
        let err = AgentError::Timeout(Duration::from_millis(250));
        assert_eq!(err.to_string(), "Timed out after 250ms");
    }

    #[test]
    fn test_from_anyhow() {
        let err: AgentError = anyhow::anyhow!("boom").into();
        assert_eq!(err.to_string(), "boom");
    }
}
