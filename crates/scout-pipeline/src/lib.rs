//! # scout-pipeline
//!
//! Multi-source result aggregation: one free-text query is routed to a few
//! categories, each category is searched independently, the merged results
//! are deduplicated and the survivors are summarized.
//!
//! ## Flow
//!
//! ```text
//! ┌──────────────┐   ┌──────────────────────────┐   ┌─────────┐   ┌────────────┐
//! │  Classifier  │──▶│      FanOutFetcher       │──▶│  dedup  │──▶│ Summarizer │
//! │ query → cats │   │ cat₁ │ cat₂ │ cat₃ (≤3)  │   │ url/key │   │  (model)   │
//! └──────────────┘   └──────────────────────────┘   └─────────┘   └────────────┘
//!                      each: SearchClient + timeout
//! ```
//!
//! ## Domains
//!
//! | Domain | Categories                                                  |
//! |--------|-------------------------------------------------------------|
//! | news   | technology, sports, business, science, health, entertainment, general |
//! | jobs   | engineering, data, design, product, management, general     |
//! | travel | flights, hotels                                             |
//!
//! A failing category never fails the request; it contributes no records and
//! shows up in [`PipelineReport::fetches`].

pub mod classifier;
pub mod config;
pub mod dedup;
pub mod error;
pub mod fetcher;
pub mod model;
pub mod pipeline;
pub mod search;
pub mod summarizer;
pub mod text;

pub use classifier::{Classifier, MAX_CATEGORIES};
pub use config::PipelineConfig;
pub use dedup::dedup;
pub use error::{PipelineError, Result};
pub use fetcher::{FanOutFetcher, FetchConfig, FetchMode};
pub use model::{Category, Domain, FetchOutcome, FetchReport, Preferences, Record, RecordSet};
pub use pipeline::{AggregationPipeline, PipelineReport, Stage};
pub use search::{MockSearchClient, SearchClient, SearchConfig, SearchRequest};
pub use summarizer::{NEWS_BATCH_SIZE, NOTHING_FOUND, Summarizer, Summary, SummaryStatus};

/// Summarizer instructions for news
pub const NEWS_SUMMARY_PROMPT: &str = "You write executive news briefings.

You receive a JSON array of articles, each with a title, source, url and description.

- Write 5 bullet points covering the most important stories
- Cite each point inline as [Source](url)
- Group related stories from different categories into one point
- Keep a neutral, professional tone

Do not invent stories that are not in the input.";

/// Summarizer instructions for job search
pub const JOBS_SUMMARY_PROMPT: &str = "You are a career advisor presenting job openings.

You receive a JSON array of postings, each with a title, company, location, url and description.

For each posting give the title, company and location, then one or two lines on what stands out.
Use any user preferences (location, seniority, remote) to order the postings, best match first.
Write readable prose and bullet points, not JSON. Always present every posting you received.";

/// Summarizer instructions for trip planning
pub const TRAVEL_SUMMARY_PROMPT: &str = "You are a travel itinerary specialist.

You receive a JSON array of flight and hotel options.

Produce an itinerary with these sections:

1. **Travel Summary** - dates and duration
2. **Flights** - airline, flight number, times, price
3. **Accommodation** - hotel name, address, nightly rate, distance to the venue
4. **Total Cost Estimate** - flights, hotel nights, grand total

Respect any budget or airline preferences in the user preferences.
Only use options present in the input.";
