//! NewsAPI top-headlines client

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{SearchClient, SearchRequest, error_payload, http_client, records_payload};
use crate::error::Result;
use crate::model::Record;

const NEWSAPI_BASE_URL: &str = "https://newsapi.org";

#[derive(Deserialize)]
struct HeadlinesResponse {
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Deserialize)]
struct Article {
    title: Option<String>,
    author: Option<String>,
    source: Option<ArticleSource>,
    url: Option<String>,
    description: Option<String>,
}

#[derive(Deserialize)]
struct ArticleSource {
    name: Option<String>,
}

impl Article {
    fn into_record(self) -> Record {
        Record::new()
            .with("title", self.title)
            .with("author", self.author)
            .with("source", self.source.and_then(|s| s.name))
            .with("url", self.url)
            .with("description", self.description)
    }
}

/// NewsAPI `top-headlines` for US sources, one category per call
pub struct NewsApiClient {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl NewsApiClient {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            api_key,
            base_url: NEWSAPI_BASE_URL.into(),
        })
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn fetch_headlines(&self, api_key: &str, request: &SearchRequest) -> reqwest::Result<Vec<Record>> {
        let page_size = request.limit.to_string();
        let response: HeadlinesResponse = self
            .client
            .get(format!("{}/v2/top-headlines", self.base_url))
            .query(&[
                ("apiKey", api_key),
                ("pageSize", page_size.as_str()),
                ("country", "us"),
                ("category", request.category.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response
            .articles
            .into_iter()
            .take(request.limit)
            .map(Article::into_record)
            .collect())
    }
}

#[async_trait]
impl SearchClient for NewsApiClient {
    async fn search(&self, request: &SearchRequest) -> Result<String> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Ok(error_payload("NEWSAPI_API_KEY not set"));
        };

        match self.fetch_headlines(api_key, request).await {
            Ok(records) => {
                tracing::debug!(category = %request.category, records = records.len(), "NewsAPI headlines");
                records_payload(&records)
            }
            Err(e) => Ok(error_payload(format!("NewsAPI error: {e}"))),
        }
    }

    fn name(&self) -> &str {
        "newsapi"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, Domain};
    use serde_json::Value;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(category: &str) -> SearchRequest {
        SearchRequest::new(Category::parse(Domain::News, category).unwrap(), "news", 2)
    }

    #[tokio::test]
    async fn test_missing_key_is_error_object() {
        let client = NewsApiClient::new(None, Duration::from_secs(1)).unwrap();
        let body = client.search(&request("technology")).await.unwrap();
        let value: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["error"], "NEWSAPI_API_KEY not set");
    }

    #[tokio::test]
    async fn test_maps_articles() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/top-headlines"))
            .and(query_param("category", "technology"))
            .and(query_param("country", "us"))
            .and(query_param("pageSize", "2"))
            .and(query_param("apiKey", "k"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "ok",
                "articles": [
                    {"title": "A", "author": null, "source": {"id": null, "name": "Wired"},
                     "url": "https://wired.com/a", "description": "d", "content": "..."},
                    {"title": "B", "source": {"name": "Verge"}, "url": "https://verge.com/b"},
                    {"title": "C", "source": {"name": "Extra"}, "url": "https://x.com/c"}
                ]
            })))
            .mount(&server)
            .await;

        let client = NewsApiClient::new(Some("k".into()), Duration::from_secs(5))
            .unwrap()
            .with_base_url(server.uri());
        let body = client.search(&request("technology")).await.unwrap();
        let value: Value = serde_json::from_str(&body).unwrap();
        let items = value.as_array().unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["source"], "Wired");
        assert_eq!(items[0]["url"], "https://wired.com/a");
        assert!(items[0]["author"].is_null());
        assert!(items[0].get("content").is_none());
        assert!(items[1]["description"].is_null());
    }

    #[tokio::test]
    async fn test_http_failure_is_error_object() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = NewsApiClient::new(Some("k".into()), Duration::from_secs(5))
            .unwrap()
            .with_base_url(server.uri());
        let body = client.search(&request("sports")).await.unwrap();
        let value: Value = serde_json::from_str(&body).unwrap();
        assert!(value["error"].as_str().unwrap().starts_with("NewsAPI error:"));
    }
}
