//! Deduplicator
//!
//! Collapses the merged per-category lists into one list of distinct
//! records. Two keys are tracked per record: the normalized URL and the
//! normalized title (paired with the domain's extra fields, e.g. the
//! company for job postings). Placeholder values such as `N/A` count as
//! missing. A record is dropped if either key was already seen, or if it
//! has neither. Kept records stay in input order.

use std::collections::HashSet;

use crate::model::{CATEGORY_FIELD, Domain, Record};
use crate::text::{is_placeholder, normalize_title, normalize_url};

const KEY_SEPARATOR: char = '\u{1f}';

/// Identity keys of one record
#[derive(Debug, PartialEq, Eq)]
struct Identity {
    url: Option<String>,
    title: Option<String>,
}

fn identity(domain: Domain, record: &Record) -> Identity {
    let fields = domain.identity(&record.field(CATEGORY_FIELD));

    let part = |name: &str| {
        let value = record.field(name);
        if is_placeholder(&value) {
            String::new()
        } else {
            normalize_title(&value)
        }
    };

    let url = normalize_url(&record.field(fields.url));
    let title = part(fields.title);
    let extra: Vec<String> = fields.extra.iter().map(|name| part(name)).collect();

    let has_title = !title.is_empty() || extra.iter().any(|e| !e.is_empty());
    let title_key = has_title.then(|| {
        let mut key = format!("{}:{title}", fields.title);
        for value in &extra {
            key.push(KEY_SEPARATOR);
            key.push_str(value);
        }
        key
    });

    Identity {
        url: (!url.is_empty()).then_some(url),
        title: title_key,
    }
}

/// Drop duplicates, keeping the first occurrence of each record
pub fn dedup(domain: Domain, records: Vec<Record>) -> Vec<Record> {
    let mut seen_urls = HashSet::new();
    let mut seen_titles = HashSet::new();
    let mut kept = Vec::with_capacity(records.len());

    for record in records {
        let Identity { url, title } = identity(domain, &record);
        if url.is_none() && title.is_none() {
            tracing::debug!(domain = %domain, "Dropping record with no url or title");
            continue;
        }

        let duplicate = url.as_ref().is_some_and(|u| seen_urls.contains(u))
            || title.as_ref().is_some_and(|t| seen_titles.contains(t));
        if duplicate {
            continue;
        }

        seen_urls.extend(url);
        seen_titles.extend(title);
        kept.push(record);
    }

    kept
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn article(title: &str, url: &str) -> Record {
        Record::from([("title", title), ("url", url), ("category", "technology")])
    }

    fn posting(title: &str, company: &str) -> Record {
        Record::from([("title", title), ("company", company)])
    }

    fn titles(records: &[Record]) -> Vec<String> {
        records.iter().map(|r| r.field("title")).collect()
    }

    #[test]
    fn test_duplicate_url_keeps_first() {
        let records = vec![
            article("Chip shortage eases", "https://example.com/a/"),
            article("Chips are back", "https://example.com/a#comments"),
            article("Markets rally", "https://example.com/b"),
        ];
        let out = dedup(Domain::News, records);
        assert_eq!(titles(&out), vec!["Chip shortage eases", "Markets rally"]);
    }

    #[test]
    fn test_duplicate_title_with_different_urls() {
        let records = vec![
            article("Markets Rally!", "https://a.com/1"),
            article("  markets rally ", "https://b.com/2"),
        ];
        assert_eq!(dedup(Domain::News, records).len(), 1);
    }

    #[test]
    fn test_jobs_key_includes_company() {
        let records = vec![
            posting("Software Engineer", "Contoso"),
            posting("Software Engineer", "Fabrikam"),
            posting("software engineer.", "contoso"),
        ];
        let out = dedup(Domain::Jobs, records);
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].field("company"), "Fabrikam");
    }

    #[test]
    fn test_records_without_identity_are_dropped() {
        let records = vec![
            Record::from([("description", "orphan")]),
            Record::from([("title", "   "), ("url", "")]),
            article("kept", ""),
        ];
        assert_eq!(titles(&dedup(Domain::News, records)), vec!["kept"]);
    }

    #[test]
    fn test_travel_identity_follows_category() {
        let flight = |number: &str, time: &str| {
            Record::from([
                ("flight_number", number),
                ("departure_time", time),
                ("category", "flights"),
            ])
        };
        let hotel = |name: &str| Record::from([("name", name), ("address", "1 Main St"), ("category", "hotels")]);

        let records = vec![
            flight("UA 1234", "08:00 AM"),
            flight("UA 1234", "08:00 AM"),
            flight("UA 1234", "06:00 PM"),
            hotel("Hyatt"),
            hotel("hyatt"),
        ];
        assert_eq!(dedup(Domain::Travel, records).len(), 3);
    }

    #[test]
    fn test_flights_missing_numbers_stay_distinct() {
        let offer = |airline: &str, price: &str| {
            Record::from([
                ("airline", airline),
                ("flight_number", "N/A"),
                ("departure_time", "N/A"),
                ("price", price),
                ("category", "flights"),
            ])
        };

        let records = vec![
            offer("Delta", "$410"),
            offer("United", "$300"),
            offer("Delta", "$410"),
        ];
        let out = dedup(Domain::Travel, records);
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].field("airline"), "United");
    }

    #[test]
    fn test_placeholder_only_records_are_dropped() {
        let records = vec![Record::from([
            ("name", "Unknown Hotel"),
            ("address", "N/A"),
            ("category", "hotels"),
        ])];
        assert!(dedup(Domain::Travel, records).is_empty());
    }

    #[test]
    fn test_dropped_records_do_not_register_keys() {
        // The second record duplicates the first by url; its title must not
        // shadow the third record.
        let records = vec![
            article("one", "https://x.com/1"),
            article("two", "https://x.com/1"),
            article("two", "https://x.com/2"),
        ];
        assert_eq!(titles(&dedup(Domain::News, records)), vec!["one", "two"]);
    }

    fn arb_article() -> impl Strategy<Value = Record> {
        (
            prop::sample::select(vec!["Alpha", "alpha!", "Beta", "", "Gamma"]),
            prop::sample::select(vec!["https://a.com/1", "https://a.com/1/", "https://b.com", ""]),
        )
            .prop_map(|(title, url)| article(title, url))
    }

    proptest! {
        #[test]
        fn prop_dedup_is_idempotent(records in prop::collection::vec(arb_article(), 0..20)) {
            let once = dedup(Domain::News, records);
            let twice = dedup(Domain::News, once.clone());
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_dedup_is_a_stable_subsequence(records in prop::collection::vec(arb_article(), 0..20)) {
            let out = dedup(Domain::News, records.clone());
            prop_assert!(out.len() <= records.len());

            let mut rest = records.iter();
            for kept in &out {
                prop_assert!(rest.any(|r| r == kept));
            }
        }
    }
}
