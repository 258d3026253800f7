//! Category Search Collaborators
//!
//! Each domain has one [`SearchClient`] that turns a single-category request
//! into JSON text: a list of records, or an `{"error": ...}` object. Clients
//! never crash the caller on network or credential problems; they degrade to
//! an error object or to documented mock fixtures.

mod jobs;
mod mock;
mod news;
mod travel;

pub use jobs::SerpApiJobsClient;
pub use mock::{MockSearchClient, fixtures};
pub use news::NewsApiClient;
pub use travel::SerpApiTravelClient;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::{PipelineError, Result};
use crate::model::{Category, Domain, Preferences, Record};

/// Default per-call timeout for search APIs
pub const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(20);

pub(crate) const SERPAPI_BASE_URL: &str = "https://serpapi.com";

/// One search scoped to exactly one category
#[derive(Clone, Debug, Serialize)]
pub struct SearchRequest {
    pub category: Category,
    /// The user's free-text query
    pub query: String,
    pub limit: usize,
    /// Request-scoped preferences (travel dates, origin, budget)
    pub params: Preferences,
}

impl SearchRequest {
    pub fn new(category: Category, query: impl Into<String>, limit: usize) -> Self {
        Self {
            category,
            query: query.into(),
            limit,
            params: Preferences::new(),
        }
    }

    #[must_use]
    pub fn with_params(mut self, params: Preferences) -> Self {
        self.params = params;
        self
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }
}

/// Search collaborator trait (Strategy pattern)
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Run one category search, returning JSON text
    async fn search(&self, request: &SearchRequest) -> Result<String>;

    /// Client name for logs
    fn name(&self) -> &str;
}

/// Search credentials and transport settings
#[derive(Clone, Debug)]
pub struct SearchConfig {
    pub newsapi_key: Option<String>,
    pub serpapi_key: Option<String>,
    /// Serve every domain from in-process fixtures
    pub mock: bool,
    pub timeout: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            newsapi_key: None,
            serpapi_key: None,
            mock: false,
            timeout: DEFAULT_SEARCH_TIMEOUT,
        }
    }
}

impl SearchConfig {
    /// Read `NEWSAPI_API_KEY`, `SERPAPI_API_KEY` and `SCOUT_MOCK_SEARCH`
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`SearchConfig::from_env`] over an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let key = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mock = lookup("SCOUT_MOCK_SEARCH")
            .is_some_and(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"));

        Self {
            newsapi_key: key("NEWSAPI_API_KEY"),
            serpapi_key: key("SERPAPI_API_KEY"),
            mock,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Build the search client serving a domain
pub fn client_for(domain: Domain, config: &SearchConfig) -> Result<Arc<dyn SearchClient>> {
    if config.mock {
        return Ok(Arc::new(MockSearchClient::with_fixtures(domain)));
    }

    let client: Arc<dyn SearchClient> = match domain {
        Domain::News => Arc::new(NewsApiClient::new(config.newsapi_key.clone(), config.timeout)?),
        Domain::Jobs => Arc::new(SerpApiJobsClient::new(
            config.serpapi_key.clone(),
            config.timeout,
        )?),
        Domain::Travel => Arc::new(SerpApiTravelClient::new(
            config.serpapi_key.clone(),
            config.timeout,
        )?),
    };
    Ok(client)
}

pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| PipelineError::Config(format!("Failed to create HTTP client: {e}")))
}

/// Encode an `{"error": ...}` payload
pub(crate) fn error_payload(message: impl Into<String>) -> String {
    serde_json::json!({ "error": message.into() }).to_string()
}

pub(crate) fn records_payload(records: &[Record]) -> Result<String> {
    Ok(serde_json::to_string(records)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_param_ignores_blank() {
        let mut params = Preferences::new();
        params.insert("origin".into(), "  ".into());
        params.insert("destination".into(), "JFK".into());
        let category = Category::parse(Domain::Travel, "flights").unwrap();
        let request = SearchRequest::new(category, "trip", 3).with_params(params);

        assert_eq!(request.param("origin"), None);
        assert_eq!(request.param("destination"), Some("JFK"));
        assert_eq!(request.param("missing"), None);
    }

    #[test]
    fn test_error_payload_shape() {
        let value: serde_json::Value = serde_json::from_str(&error_payload("nope")).unwrap();
        assert_eq!(value["error"], "nope");
    }

    #[test]
    fn test_config_from_lookup() {
        let config = SearchConfig::from_lookup(|name| match name {
            "NEWSAPI_API_KEY" => Some("news-key".into()),
            "SERPAPI_API_KEY" => Some("  ".into()),
            "SCOUT_MOCK_SEARCH" => Some("TRUE".into()),
            _ => None,
        });
        assert_eq!(config.newsapi_key.as_deref(), Some("news-key"));
        assert!(config.serpapi_key.is_none());
        assert!(config.mock);
    }

    #[tokio::test]
    async fn test_mock_config_serves_fixtures() {
        let config = SearchConfig {
            mock: true,
            ..SearchConfig::default()
        };
        let client = client_for(Domain::News, &config).unwrap();
        let category = Category::parse(Domain::News, "technology").unwrap();
        let body = client
            .search(&SearchRequest::new(category, "tech", 6))
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert!(value.as_array().is_some_and(|a| !a.is_empty()));
    }
}
