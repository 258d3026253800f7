//! Domain Models
//!
//! Domains and their closed category vocabularies, the loosely-typed
//! [`Record`] every search collaborator returns, and the per-category
//! [`RecordSet`] produced by the fetcher.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::PipelineError;

/// Request-scoped preference snapshot (dates, budget, origin, ...)
pub type Preferences = BTreeMap<String, String>;

/// Field the fetcher tags each record with
pub const CATEGORY_FIELD: &str = "category";

const NEWS_VOCABULARY: &[&str] = &[
    "technology",
    "sports",
    "business",
    "science",
    "health",
    "entertainment",
    "general",
];

const JOBS_VOCABULARY: &[&str] = &[
    "engineering",
    "data",
    "design",
    "product",
    "management",
    "general",
];

const TRAVEL_VOCABULARY: &[&str] = &["flights", "hotels"];

/// A family of searches sharing one vocabulary and record schema
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    News,
    Jobs,
    Travel,
}

/// Fields that make up a record's identity for deduplication
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IdentityFields {
    pub title: &'static str,
    /// Fields paired with the title in the title key
    pub extra: &'static [&'static str],
    pub url: &'static str,
}

impl Domain {
    pub const ALL: [Self; 3] = [Self::News, Self::Jobs, Self::Travel];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::News => "news",
            Self::Jobs => "jobs",
            Self::Travel => "travel",
        }
    }

    /// Closed category vocabulary, in tie-breaking order
    pub const fn vocabulary(self) -> &'static [&'static str] {
        match self {
            Self::News => NEWS_VOCABULARY,
            Self::Jobs => JOBS_VOCABULARY,
            Self::Travel => TRAVEL_VOCABULARY,
        }
    }

    /// Category substituted when none can be recovered
    pub const fn fallback(self) -> &'static str {
        match self {
            Self::News | Self::Jobs => "general",
            Self::Travel => "flights",
        }
    }

    /// Records requested per category
    pub const fn default_limit(self) -> usize {
        match self {
            Self::News => 6,
            Self::Jobs => 10,
            Self::Travel => 4,
        }
    }

    /// Plural noun for log lines and prompts
    pub const fn noun(self) -> &'static str {
        match self {
            Self::News => "articles",
            Self::Jobs => "job postings",
            Self::Travel => "travel options",
        }
    }

    /// Identity fields for a record fetched under `category`
    ///
    /// News is keyed by title, jobs by title and company, hotels by name and
    /// address. Flights are keyed by flight number, departure time, airline
    /// and price so offers missing a flight number stay apart.
    pub fn identity(self, category: &str) -> IdentityFields {
        match self {
            Self::News => IdentityFields {
                title: "title",
                extra: &[],
                url: "url",
            },
            Self::Jobs => IdentityFields {
                title: "title",
                extra: &["company"],
                url: "url",
            },
            Self::Travel if category == "hotels" => IdentityFields {
                title: "name",
                extra: &["address"],
                url: "link",
            },
            Self::Travel => IdentityFields {
                title: "flight_number",
                extra: &["departure_time", "airline", "price"],
                url: "link",
            },
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "news" => Ok(Self::News),
            "jobs" => Ok(Self::Jobs),
            "travel" => Ok(Self::Travel),
            other => Err(PipelineError::UnknownDomain(other.to_string())),
        }
    }
}

/// A label from a domain's vocabulary
///
/// Only constructible through [`Category::parse`] or [`Category::fallback`],
/// so every value is a vocabulary member.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    /// Accept a label if it belongs to the domain's vocabulary
    pub fn parse(domain: Domain, label: &str) -> Option<Self> {
        let label = label.trim().to_lowercase();
        domain
            .vocabulary()
            .iter()
            .find(|v| **v == label)
            .map(|v| Self((*v).to_string()))
    }

    pub fn fallback(domain: Domain) -> Self {
        Self(domain.fallback().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One structured search result
///
/// Schemas differ per domain, so the record keeps the JSON object as-is
/// and reads fields as strings on demand.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a JSON value, accepting only objects
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// String view of a field; missing and null fields read as ""
    pub fn field(&self, name: &str) -> String {
        match self.0.get(name) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Whether the field is present and not null
    pub fn has(&self, name: &str) -> bool {
        self.0.get(name).is_some_and(|v| !v.is_null())
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl<const N: usize> From<[(&str, &str); N]> for Record {
    fn from(pairs: [(&str, &str); N]) -> Self {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
                .collect(),
        )
    }
}

/// Result of one category's fetch, decided once at the parse boundary
#[derive(Clone, Debug, PartialEq)]
pub enum FetchOutcome {
    Success(Vec<Record>),
    Failure(String),
}

/// Records fetched for one category
///
/// A failed fetch yields an empty set that still carries the reason.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RecordSet {
    pub category: Category,
    pub records: Vec<Record>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl RecordSet {
    pub fn from_outcome(category: Category, outcome: FetchOutcome) -> Self {
        match outcome {
            FetchOutcome::Success(records) => Self {
                category,
                records,
                failure: None,
            },
            FetchOutcome::Failure(reason) => Self {
                category,
                records: Vec::new(),
                failure: Some(reason),
            },
        }
    }

    pub const fn is_failed(&self) -> bool {
        self.failure.is_some()
    }
}

/// Per-category fetch counts for reporting
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FetchReport {
    pub category: Category,
    pub records: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&RecordSet> for FetchReport {
    fn from(set: &RecordSet) -> Self {
        Self {
            category: set.category.clone(),
            records: set.records.len(),
            error: set.failure.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parse_is_closed() {
        assert_eq!(
            Category::parse(Domain::News, " Technology ").unwrap().as_str(),
            "technology"
        );
        assert!(Category::parse(Domain::News, "politics").is_none());
        assert!(Category::parse(Domain::Jobs, "sports").is_none());
        assert!(Category::parse(Domain::Travel, "hotels").is_some());
    }

    #[test]
    fn test_fallbacks_are_vocabulary_members() {
        for domain in Domain::ALL {
            assert!(domain.vocabulary().contains(&domain.fallback()));
            assert!(Category::parse(domain, domain.fallback()).is_some());
        }
    }

    #[test]
    fn test_domain_from_str() {
        assert_eq!("NEWS".parse::<Domain>().unwrap(), Domain::News);
        assert!(matches!(
            "weather".parse::<Domain>(),
            Err(PipelineError::UnknownDomain(_))
        ));
    }

    #[test]
    fn test_travel_identity_depends_on_category() {
        assert_eq!(Domain::Travel.identity("hotels").title, "name");
        assert_eq!(Domain::Travel.identity("flights").title, "flight_number");
        assert_eq!(Domain::Jobs.identity("data").extra, ["company"]);
        assert_eq!(
            Domain::Travel.identity("flights").extra,
            ["departure_time", "airline", "price"]
        );
    }

    #[test]
    fn test_record_field_defaults() {
        let record = Record::from_value(serde_json::json!({
            "title": "Hello",
            "author": null,
            "rating": 4.5
        }))
        .unwrap();

        assert_eq!(record.field("title"), "Hello");
        assert_eq!(record.field("author"), "");
        assert_eq!(record.field("missing"), "");
        assert_eq!(record.field("rating"), "4.5");
        assert!(!record.has("author"));
        assert!(Record::from_value(serde_json::json!([1, 2])).is_none());
    }

    #[test]
    fn test_record_set_from_failure() {
        let category = Category::parse(Domain::News, "sports").unwrap();
        let set = RecordSet::from_outcome(category, FetchOutcome::Failure("timed out".into()));
        assert!(set.is_failed());
        assert!(set.records.is_empty());

        let report = FetchReport::from(&set);
        assert_eq!(report.records, 0);
        assert_eq!(report.error.as_deref(), Some("timed out"));
    }
}
