//! Aggregation Pipeline
//!
//! ```text
//!   query ─▶ Classifier ─▶ FanOutFetcher ─▶ dedup ─▶ Summarizer ─▶ report
//!               │               │             │
//!               └── empty ──────┴── empty ────┴──▶ "No results found."
//! ```
//!
//! Stages run in a fixed order with no retries. Every failure below the
//! entry point is turned into text, so [`AggregationPipeline::run`]
//! always returns a report.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use scout_core::preferences::render_context;
use scout_core::{Agent, LlmProvider};

use crate::classifier::{Classifier, classifier_instructions};
use crate::config::PipelineConfig;
use crate::dedup::dedup;
use crate::error::Result;
use crate::fetcher::FanOutFetcher;
use crate::model::{Category, Domain, FetchReport, Preferences, Record};
use crate::search::{SearchClient, client_for};
use crate::summarizer::{
    NOTHING_FOUND, Summarizer, SummaryStatus, summarizer_instructions, summary_batch_size,
};
use crate::text::host;

const SOURCE_FIELD: &str = "source";

/// Pipeline progress
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Start,
    Classified,
    Fetched,
    Deduped,
    Summarized,
    Done,
}

/// Everything one run produced
#[derive(Clone, Debug, Serialize)]
pub struct PipelineReport {
    pub request_id: Uuid,
    pub domain: Domain,
    pub query: String,
    /// Final stage; always [`Stage::Done`]
    pub stage: Stage,
    /// Stages passed through, in order
    pub trace: Vec<Stage>,
    pub short_circuited: bool,
    pub categories: Vec<Category>,
    pub fetches: Vec<FetchReport>,
    pub raw_count: usize,
    pub unique_count: usize,
    pub records: Vec<Record>,
    pub summary: String,
    pub summary_status: SummaryStatus,
    /// Rendered result shown to the user
    pub output: String,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}

impl PipelineReport {
    fn start(domain: Domain, query: &str) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            domain,
            query: query.to_string(),
            stage: Stage::Start,
            trace: vec![Stage::Start],
            short_circuited: false,
            categories: Vec::new(),
            fetches: Vec::new(),
            raw_count: 0,
            unique_count: 0,
            records: Vec::new(),
            summary: String::new(),
            summary_status: SummaryStatus::NothingFound,
            output: String::new(),
            started_at: Utc::now(),
            elapsed_ms: 0,
        }
    }

    fn advance(&mut self, stage: Stage) {
        self.stage = stage;
        self.trace.push(stage);
    }

    fn finish(mut self, clock: Instant) -> Self {
        self.advance(Stage::Done);
        self.elapsed_ms = u64::try_from(clock.elapsed().as_millis()).unwrap_or(u64::MAX);
        self
    }

    fn nothing_found(mut self, clock: Instant) -> Self {
        tracing::info!(
            request_id = %self.request_id,
            stage = ?self.stage,
            "Nothing to summarize, short-circuiting"
        );
        self.short_circuited = true;
        self.summary = NOTHING_FOUND.into();
        self.summary_status = SummaryStatus::NothingFound;
        self.output = NOTHING_FOUND.into();
        self.finish(clock)
    }
}

/// Header, summary and (when records carry a source) a source footer
pub fn render_output(categories: &[Category], summary: &str, records: &[Record]) -> String {
    let labels: Vec<&str> = categories.iter().map(Category::as_str).collect();
    let header = if labels.len() == 1 {
        format!("**Category analyzed:** {}", labels[0])
    } else {
        format!("**Categories analyzed:** {}", labels.join(", "))
    };

    let mut out = format!("{header}\n\n{summary}");

    let sources: BTreeSet<(String, String)> = records
        .iter()
        .filter(|r| r.has(SOURCE_FIELD))
        .map(|r| (r.field(SOURCE_FIELD), host(&r.field("url"))))
        .filter(|(source, host)| !source.is_empty() || !host.is_empty())
        .collect();

    if !sources.is_empty() {
        out.push_str("\n\nTop sources:");
        for (source, host) in &sources {
            match (source.is_empty(), host.is_empty()) {
                (false, false) => out.push_str(&format!("\n- {source} ({host})")),
                (false, true) => out.push_str(&format!("\n- {source}")),
                _ => out.push_str(&format!("\n- {host}")),
            }
        }
    }

    out
}

/// Classifier → fetch → dedup → summarize for one domain
#[derive(Clone)]
pub struct AggregationPipeline {
    domain: Domain,
    classifier: Classifier,
    fetcher: FanOutFetcher,
    summarizer: Summarizer,
}

impl AggregationPipeline {
    pub const fn new(
        domain: Domain,
        classifier: Classifier,
        fetcher: FanOutFetcher,
        summarizer: Summarizer,
    ) -> Self {
        Self {
            domain,
            classifier,
            fetcher,
            summarizer,
        }
    }

    /// Wire the roles for `domain` over one provider and search client
    pub fn build(
        domain: Domain,
        provider: Arc<dyn LlmProvider>,
        model: &str,
        search: Arc<dyn SearchClient>,
        config: &PipelineConfig,
    ) -> Result<Self> {
        let classifier_agent = Agent::builder()
            .name(format!("{domain}_classifier"))
            .instructions(classifier_instructions(domain))
            .provider(provider.clone())
            .model(model)
            .temperature(0.0)
            .timeout(config.agent_timeout)
            .build()?;

        let summarizer_agent = Agent::builder()
            .name(format!("{domain}_summarizer"))
            .instructions(summarizer_instructions(domain))
            .provider(provider)
            .model(model)
            .timeout(config.agent_timeout)
            .build()?;

        Ok(Self::new(
            domain,
            Classifier::new(domain, classifier_agent),
            FanOutFetcher::new(search, config.fetch_config(domain)),
            Summarizer::new(summarizer_agent).with_batch_size(summary_batch_size(domain)),
        ))
    }

    /// Build with the search client `config` selects for `domain`
    pub fn from_config(
        domain: Domain,
        provider: Arc<dyn LlmProvider>,
        model: &str,
        config: &PipelineConfig,
    ) -> Result<Self> {
        let search = client_for(domain, &config.search)?;
        Self::build(domain, provider, model, search, config)
    }

    pub const fn domain(&self) -> Domain {
        self.domain
    }

    /// Run one request end to end
    pub async fn run(&self, query: &str, preferences: &Preferences) -> PipelineReport {
        let clock = Instant::now();
        let mut report = PipelineReport::start(self.domain, query);
        tracing::info!(
            request_id = %report.request_id,
            domain = %self.domain,
            query = %query,
            "Pipeline started"
        );

        report.categories = self.classifier.classify(query).await;
        report.advance(Stage::Classified);
        tracing::info!(
            request_id = %report.request_id,
            categories = ?report.categories,
            "Classified"
        );
        if report.categories.is_empty() {
            return report.nothing_found(clock);
        }

        let sets = self
            .fetcher
            .fetch(query, &report.categories, preferences)
            .await;
        report.fetches = sets.iter().map(FetchReport::from).collect();
        let merged: Vec<Record> = sets.into_iter().flat_map(|s| s.records).collect();
        report.raw_count = merged.len();
        report.advance(Stage::Fetched);
        tracing::info!(
            request_id = %report.request_id,
            records = report.raw_count,
            failed = report.fetches.iter().filter(|f| f.error.is_some()).count(),
            "Fetched"
        );
        if merged.is_empty() {
            return report.nothing_found(clock);
        }

        report.records = dedup(self.domain, merged);
        report.unique_count = report.records.len();
        report.advance(Stage::Deduped);
        tracing::info!(
            request_id = %report.request_id,
            raw = report.raw_count,
            unique = report.unique_count,
            "Deduplicated"
        );
        if report.records.is_empty() {
            return report.nothing_found(clock);
        }

        let context = (!preferences.is_empty()).then(|| render_context(preferences));
        let summary = self
            .summarizer
            .summarize(&report.records, context.as_deref())
            .await;
        report.advance(Stage::Summarized);

        report.output = render_output(&report.categories, &summary.text, &report.records);
        report.summary = summary.text;
        report.summary_status = summary.status;

        let report = report.finish(clock);
        tracing::info!(
            request_id = %report.request_id,
            status = ?report.summary_status,
            elapsed_ms = report.elapsed_ms,
            "Pipeline finished"
        );
        report
    }
}
