//! Query Classifier
//!
//! Maps a free-text query to 1-3 categories of a domain's vocabulary. The
//! model's answer is parsed as JSON first (a list, a single string, or an
//! object holding a list), then scanned for vocabulary terms. Anything that
//! goes wrong ends in the domain's fallback category.

use serde_json::Value;

use scout_core::Agent;

use crate::model::{Category, Domain};
use crate::text::unwrap_code_fence;

/// Most categories a single query may fan out to
pub const MAX_CATEGORIES: usize = 3;

/// Object fields that may hold the category list
const LIST_FIELDS: &[&str] = &["targets", "categories", "category"];

/// Instruction for a domain's classifier role
pub fn classifier_instructions(domain: Domain) -> String {
    format!(
        "You route {noun} requests. Choose at most {MAX_CATEGORIES} categories from: {vocab}.\n\
         Return ONLY a JSON array of category names, e.g. [\"{first}\"]. \
         If nothing fits, return [\"{fallback}\"].",
        noun = domain.as_str(),
        vocab = domain.vocabulary().join(", "),
        first = domain.vocabulary()[0],
        fallback = domain.fallback(),
    )
}

fn push_unique(out: &mut Vec<Category>, category: Category) {
    if out.len() < MAX_CATEGORIES && !out.contains(&category) {
        out.push(category);
    }
}

fn labels_from_json(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Value::Object(map) => LIST_FIELDS
            .iter()
            .find_map(|field| map.get(*field))
            .map(labels_from_json)
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// Vocabulary terms appearing in `text`, ordered by first occurrence
fn scan_vocabulary(domain: Domain, text: &str) -> Vec<Category> {
    let lowered = text.to_lowercase();
    let mut hits: Vec<(usize, usize, &str)> = domain
        .vocabulary()
        .iter()
        .enumerate()
        .filter_map(|(rank, term)| lowered.find(term).map(|pos| (pos, rank, *term)))
        .collect();
    hits.sort_unstable();

    let mut out = Vec::new();
    for (_, _, term) in hits {
        if let Some(category) = Category::parse(domain, term) {
            push_unique(&mut out, category);
        }
    }
    out
}

/// Recover categories from a model response
///
/// Returns an empty list when nothing valid can be recovered; the caller
/// substitutes the fallback.
pub fn parse_categories(domain: Domain, response: &str) -> Vec<Category> {
    let body = unwrap_code_fence(response);

    if let Ok(value) = serde_json::from_str::<Value>(body) {
        let mut out = Vec::new();
        for label in labels_from_json(&value) {
            if let Some(category) = Category::parse(domain, &label) {
                push_unique(&mut out, category);
            }
        }
        if !out.is_empty() {
            return out;
        }
    }

    scan_vocabulary(domain, body)
}

/// Classifier role bound to one domain
#[derive(Clone, Debug)]
pub struct Classifier {
    domain: Domain,
    agent: Agent,
}

impl Classifier {
    pub const fn new(domain: Domain, agent: Agent) -> Self {
        Self { domain, agent }
    }

    pub const fn domain(&self) -> Domain {
        self.domain
    }

    /// Classify a query; never empty, every element in the vocabulary
    pub async fn classify(&self, query: &str) -> Vec<Category> {
        let response = match self.agent.run(query).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(
                    domain = %self.domain,
                    error = %e,
                    "Classifier call failed, using fallback category"
                );
                return vec![Category::fallback(self.domain)];
            }
        };
        tracing::debug!(domain = %self.domain, response = %response, "Classifier response");

        let categories = parse_categories(self.domain, &response);
        if categories.is_empty() {
            tracing::warn!(
                domain = %self.domain,
                "No valid categories in classifier response, using fallback"
            );
            return vec![Category::fallback(self.domain)];
        }

        categories
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use proptest::prelude::*;
    use scout_core::MockProvider;

    use super::*;

    fn labels(categories: &[Category]) -> Vec<&str> {
        categories.iter().map(Category::as_str).collect()
    }

    fn classifier(mock: MockProvider) -> Classifier {
        let agent = Agent::builder()
            .name("classifier")
            .instructions(classifier_instructions(Domain::News))
            .provider(Arc::new(mock))
            .build()
            .unwrap();
        Classifier::new(Domain::News, agent)
    }

    #[test]
    fn test_parse_json_list() {
        let cats = parse_categories(Domain::News, r#"["technology", "business"]"#);
        assert_eq!(labels(&cats), vec!["technology", "business"]);
    }

    #[test]
    fn test_parse_fenced_object() {
        let cats = parse_categories(
            Domain::News,
            "```json\n{\"targets\": [\"Sports\", \"politics\", \"health\"]}\n```",
        );
        assert_eq!(labels(&cats), vec!["sports", "health"]);
    }

    #[test]
    fn test_parse_caps_and_dedups() {
        let cats = parse_categories(
            Domain::News,
            r#"["science", "science", "health", "sports", "business"]"#,
        );
        assert_eq!(labels(&cats), vec!["science", "health", "sports"]);
    }

    #[test]
    fn test_parse_falls_back_to_substring_scan() {
        let cats = parse_categories(
            Domain::News,
            "I'd pick Business first, then technology.",
        );
        assert_eq!(labels(&cats), vec!["business", "technology"]);
    }

    #[test]
    fn test_parse_invalid_json_labels_scan_raw_text() {
        let cats = parse_categories(Domain::Travel, r#"["hotel", "flights please"]"#);
        assert_eq!(labels(&cats), vec!["flights"]);
    }

    #[test]
    fn test_parse_nothing_recoverable() {
        assert!(parse_categories(Domain::News, "no idea").is_empty());
        assert!(parse_categories(Domain::News, "").is_empty());
    }

    #[test]
    fn test_instructions_list_vocabulary() {
        let text = classifier_instructions(Domain::Jobs);
        for term in Domain::Jobs.vocabulary() {
            assert!(text.contains(term));
        }
    }

    #[tokio::test]
    async fn test_classify_uses_model_answer() {
        let c = classifier(MockProvider::new().with_reply(r#"["technology","business"]"#));
        let cats = c.classify("tech and business news").await;
        assert_eq!(labels(&cats), vec!["technology", "business"]);
    }

    #[tokio::test]
    async fn test_classify_provider_failure_falls_back() {
        let c = classifier(MockProvider::failing("503"));
        let cats = c.classify("anything").await;
        assert_eq!(labels(&cats), vec!["general"]);
    }

    #[tokio::test]
    async fn test_classify_garbage_falls_back() {
        let c = classifier(MockProvider::new().with_reply("¯\\_(ツ)_/¯"));
        assert_eq!(labels(&c.classify("x").await), vec!["general"]);
    }

    proptest! {
        #[test]
        fn prop_parse_is_closed_and_bounded(response in ".{0,200}") {
            for domain in Domain::ALL {
                let cats = parse_categories(domain, &response);
                prop_assert!(cats.len() <= MAX_CATEGORIES);
                for c in &cats {
                    prop_assert!(domain.vocabulary().contains(&c.as_str()));
                }
            }
        }
    }
}
