//! Fan-out Fetcher
//!
//! Issues one search per category and turns each response into a
//! [`RecordSet`]. Categories are isolated from each other: an error, a
//! timeout or a malformed payload empties that category's set and is
//! logged, nothing more.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PipelineError;
use crate::model::{CATEGORY_FIELD, Category, FetchOutcome, Preferences, Record, RecordSet};
use crate::search::{DEFAULT_SEARCH_TIMEOUT, SearchClient, SearchRequest};
use crate::text::{truncate_words, unwrap_code_fence};

pub const DEFAULT_MAX_DESCRIPTION_WORDS: usize = 100;
const DESCRIPTION_FIELD: &str = "description";

/// How per-category searches are scheduled
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    #[default]
    Concurrent,
    Sequential,
}

impl fmt::Display for FetchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Concurrent => "concurrent",
            Self::Sequential => "sequential",
        })
    }
}

impl FromStr for FetchMode {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "concurrent" | "parallel" => Ok(Self::Concurrent),
            "sequential" => Ok(Self::Sequential),
            other => Err(PipelineError::Config(format!("Unknown fetch mode '{other}'"))),
        }
    }
}

/// Fetcher settings
#[derive(Clone, Debug)]
pub struct FetchConfig {
    /// Records requested per category
    pub limit: usize,
    /// Upper bound on each category's search
    pub timeout: Duration,
    pub mode: FetchMode,
    pub max_description_words: usize,
}

impl FetchConfig {
    pub const fn new(limit: usize) -> Self {
        Self {
            limit,
            timeout: DEFAULT_SEARCH_TIMEOUT,
            mode: FetchMode::Concurrent,
            max_description_words: DEFAULT_MAX_DESCRIPTION_WORDS,
        }
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_mode(mut self, mode: FetchMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub const fn with_max_description_words(mut self, words: usize) -> Self {
        self.max_description_words = words;
        self
    }
}

/// Decide a search response's outcome
///
/// Lists are successes (non-object items are skipped), objects with an
/// `error` key are failures, anything else is a failure too.
pub fn parse_payload(text: &str) -> FetchOutcome {
    let body = unwrap_code_fence(text);
    if body.is_empty() {
        return FetchOutcome::Failure("empty response".into());
    }

    match serde_json::from_str::<Value>(body) {
        Ok(Value::Array(items)) => {
            FetchOutcome::Success(items.into_iter().filter_map(Record::from_value).collect())
        }
        Ok(Value::Object(map)) if map.contains_key("error") => {
            let reason = match map.get("error") {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => String::new(),
            };
            FetchOutcome::Failure(reason)
        }
        Ok(other) => FetchOutcome::Failure(format!(
            "expected a list of records, got {}",
            json_kind(&other)
        )),
        Err(e) => FetchOutcome::Failure(format!("malformed JSON: {e}")),
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// Tag with the category unless the source already did, and bound the
/// description length
fn prepare(mut record: Record, category: &Category, max_words: usize) -> Record {
    if !record.has(CATEGORY_FIELD) {
        record.set(CATEGORY_FIELD, category.as_str());
    }
    if let Some(Value::String(description)) = record.get(DESCRIPTION_FIELD) {
        let bounded = truncate_words(description, max_words);
        record.set(DESCRIPTION_FIELD, bounded);
    }
    record
}

/// Per-category fan-out over one search client
#[derive(Clone)]
pub struct FanOutFetcher {
    client: Arc<dyn SearchClient>,
    config: FetchConfig,
}

impl FanOutFetcher {
    pub fn new(client: Arc<dyn SearchClient>, config: FetchConfig) -> Self {
        Self { client, config }
    }

    pub const fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetch every category; the result is in `categories` order
    pub async fn fetch(
        &self,
        query: &str,
        categories: &[Category],
        params: &Preferences,
    ) -> Vec<RecordSet> {
        match self.config.mode {
            FetchMode::Concurrent => {
                join_all(
                    categories
                        .iter()
                        .map(|category| self.fetch_one(query, category, params)),
                )
                .await
            }
            FetchMode::Sequential => {
                let mut sets = Vec::with_capacity(categories.len());
                for category in categories {
                    sets.push(self.fetch_one(query, category, params).await);
                }
                sets
            }
        }
    }

    async fn fetch_one(&self, query: &str, category: &Category, params: &Preferences) -> RecordSet {
        let request = SearchRequest::new(category.clone(), query, self.config.limit)
            .with_params(params.clone());

        let outcome = match tokio::time::timeout(self.config.timeout, self.client.search(&request)).await {
            Ok(Ok(body)) => {
                tracing::debug!(category = %category, bytes = body.len(), "Search response");
                parse_payload(&body)
            }
            Ok(Err(e)) => FetchOutcome::Failure(e.to_string()),
            Err(_) => FetchOutcome::Failure(
                PipelineError::Timeout(self.config.timeout).to_string(),
            ),
        };

        let outcome = match outcome {
            FetchOutcome::Success(records) => FetchOutcome::Success(
                records
                    .into_iter()
                    .map(|r| prepare(r, category, self.config.max_description_words))
                    .collect(),
            ),
            failure @ FetchOutcome::Failure(_) => failure,
        };

        let set = RecordSet::from_outcome(category.clone(), outcome);
        match &set.failure {
            Some(reason) => tracing::warn!(
                category = %category,
                client = self.client.name(),
                reason = %reason,
                "Fetch failed, category contributes no records"
            ),
            None => tracing::info!(category = %category, records = set.records.len(), "Fetched"),
        }
        set
    }
}
