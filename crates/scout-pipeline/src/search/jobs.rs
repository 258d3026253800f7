//! SerpAPI Google Jobs client

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{
    SERPAPI_BASE_URL, SearchClient, SearchRequest, error_payload, http_client, records_payload,
};
use crate::error::Result;
use crate::model::Record;
use crate::text::truncate_words;

const DESCRIPTION_WORDS: usize = 100;

#[derive(Deserialize)]
struct JobsResponse {
    #[serde(default)]
    jobs_results: Vec<JobResult>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct JobResult {
    title: Option<String>,
    company_name: Option<String>,
    company: Option<String>,
    location: Option<String>,
    description: Option<String>,
    #[serde(default)]
    apply_options: Vec<ApplyOption>,
    share_link: Option<String>,
}

#[derive(Deserialize)]
struct ApplyOption {
    link: Option<String>,
}

impl JobResult {
    fn into_record(self) -> Record {
        let url = self
            .apply_options
            .into_iter()
            .find_map(|o| o.link)
            .or(self.share_link);

        Record::new()
            .with("title", self.title)
            .with("company", self.company_name.or(self.company))
            .with("location", self.location)
            .with(
                "description",
                self.description
                    .map(|d| truncate_words(&d, DESCRIPTION_WORDS)),
            )
            .with("url", url)
    }
}

/// Build the `q` parameter: the user's query narrowed by category
fn job_query(request: &SearchRequest) -> String {
    let query = request.query.trim();
    let category = request.category.as_str();
    if category == "general" || query.to_lowercase().contains(category) {
        query.to_string()
    } else {
        format!("{query} {category}")
    }
}

/// SerpAPI `google_jobs` engine
pub struct SerpApiJobsClient {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl SerpApiJobsClient {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            api_key,
            base_url: SERPAPI_BASE_URL.into(),
        })
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn fetch_jobs(&self, api_key: &str, request: &SearchRequest) -> reqwest::Result<JobsResponse> {
        let q = job_query(request);
        let num = request.limit.to_string();
        let mut params = vec![
            ("api_key", api_key),
            ("engine", "google_jobs"),
            ("q", q.as_str()),
            ("num", num.as_str()),
        ];
        if let Some(location) = request.param("location") {
            params.push(("location", location));
        }

        self.client
            .get(format!("{}/search.json", self.base_url))
            .query(&params)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }
}

#[async_trait]
impl SearchClient for SerpApiJobsClient {
    async fn search(&self, request: &SearchRequest) -> Result<String> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Ok(error_payload("SERPAPI_API_KEY not set"));
        };

        match self.fetch_jobs(api_key, request).await {
            Ok(JobsResponse {
                error: Some(message),
                ..
            }) => Ok(error_payload(format!("SerpAPI error: {message}"))),
            Ok(response) => {
                let records: Vec<Record> = response
                    .jobs_results
                    .into_iter()
                    .take(request.limit)
                    .map(JobResult::into_record)
                    .collect();
                tracing::debug!(category = %request.category, records = records.len(), "SerpAPI jobs");
                records_payload(&records)
            }
            Err(e) => Ok(error_payload(format!("SerpAPI error: {e}"))),
        }
    }

    fn name(&self) -> &str {
        "serpapi-jobs"
    }
}
