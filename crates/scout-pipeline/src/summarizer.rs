//! Summarizer
//!
//! Hands the deduplicated records to the model and returns its synthesis.
//! An empty list never reaches the model, and a failed call becomes a
//! failure text rather than an error.
//!
//! With a batch size set, longer lists are summarized one batch at a time
//! and a final call combines the partial summaries into one brief.

use serde::Serialize;

use scout_core::Agent;

use crate::model::{Domain, Record};
use crate::{JOBS_SUMMARY_PROMPT, NEWS_SUMMARY_PROMPT, TRAVEL_SUMMARY_PROMPT};

/// Result text when there is nothing to summarize
pub const NOTHING_FOUND: &str = "No results found.";

/// Result text when the model answered with nothing
pub const EMPTY_SUMMARY: &str = "Summarizer produced no output.";

/// News articles per summarizer call before batching kicks in
pub const NEWS_BATCH_SIZE: usize = 6;

/// Leads the combining call's input, ahead of the partial summaries
pub const COMBINE_PROMPT: &str = "Synthesize a 5-bullet executive brief from the following partial summaries. Keep the inline sources.";

/// Summarizer instructions for a domain
pub const fn summarizer_instructions(domain: Domain) -> &'static str {
    match domain {
        Domain::News => NEWS_SUMMARY_PROMPT,
        Domain::Jobs => JOBS_SUMMARY_PROMPT,
        Domain::Travel => TRAVEL_SUMMARY_PROMPT,
    }
}

/// Records per summarizer call; `None` sends everything at once
pub const fn summary_batch_size(domain: Domain) -> Option<usize> {
    match domain {
        Domain::News => Some(NEWS_BATCH_SIZE),
        Domain::Jobs | Domain::Travel => None,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryStatus {
    Generated,
    NothingFound,
    Empty,
    Failed,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub text: String,
    pub status: SummaryStatus,
}

impl Summary {
    fn nothing_found() -> Self {
        Self {
            text: NOTHING_FOUND.into(),
            status: SummaryStatus::NothingFound,
        }
    }

    fn empty() -> Self {
        Self {
            text: EMPTY_SUMMARY.into(),
            status: SummaryStatus::Empty,
        }
    }

    fn failed(reason: impl std::fmt::Display) -> Self {
        Self {
            text: format!("Failed to summarize: {reason}"),
            status: SummaryStatus::Failed,
        }
    }
}

/// Summarizer role
#[derive(Clone, Debug)]
pub struct Summarizer {
    agent: Agent,
    batch_size: Option<usize>,
}

impl Summarizer {
    pub const fn new(agent: Agent) -> Self {
        Self {
            agent,
            batch_size: None,
        }
    }

    /// Summarize at most `size` records per call; zero disables batching
    #[must_use]
    pub const fn with_batch_size(mut self, size: Option<usize>) -> Self {
        self.batch_size = size;
        self
    }

    /// Summarize `records`; `context` is passed along as a system message
    ///
    /// Each record-bearing user message is exactly the JSON array of the
    /// records in that call.
    pub async fn summarize(&self, records: &[Record], context: Option<&str>) -> Summary {
        if records.is_empty() {
            return Summary::nothing_found();
        }

        match self.batch_size {
            Some(size) if size > 0 && records.len() > size => {
                self.summarize_batches(records, size, context).await
            }
            _ => self.summarize_once(records, context).await,
        }
    }

    async fn summarize_batches(
        &self,
        records: &[Record],
        size: usize,
        context: Option<&str>,
    ) -> Summary {
        let mut partials = Vec::new();
        for (batch, chunk) in records.chunks(size).enumerate() {
            let summary = self.summarize_once(chunk, context).await;
            match summary.status {
                SummaryStatus::Generated => partials.push(summary.text),
                SummaryStatus::Empty => tracing::warn!(batch, "Batch summary was empty"),
                SummaryStatus::Failed | SummaryStatus::NothingFound => return summary,
            }
        }

        if partials.is_empty() {
            return Summary::empty();
        }

        tracing::info!(batches = partials.len(), "Combining batch summaries");
        let input = format!("{COMBINE_PROMPT}\n\n{}", partials.join("\n\n"));
        self.complete(&input, context).await
    }

    async fn summarize_once(&self, records: &[Record], context: Option<&str>) -> Summary {
        let input = match serde_json::to_string(records) {
            Ok(json) => json,
            Err(e) => return Summary::failed(e),
        };

        tracing::info!(records = records.len(), bytes = input.len(), "Summarizing");
        self.complete(&input, context).await
    }

    async fn complete(&self, input: &str, context: Option<&str>) -> Summary {
        match self.agent.run_with_context(input, context).await {
            Ok(text) if text.trim().is_empty() => {
                tracing::warn!("Summarizer returned empty output");
                Summary::empty()
            }
            Ok(text) => Summary {
                text: text.trim().to_string(),
                status: SummaryStatus::Generated,
            },
            Err(e) => {
                tracing::error!(error = %e, "Summarizer call failed");
                Summary::failed(e)
            }
        }
    }
}
