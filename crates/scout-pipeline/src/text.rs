//! Text normalization helpers shared by the classifier, fetcher and
//! deduplicator.

use url::Url;

const FENCE: &str = "```";

/// Strip markdown code-fence wrapping from a model or tool response
///
/// A leading fence line (with or without a language tag) and a trailing
/// fence are removed; unfenced text is returned trimmed.
pub fn unwrap_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix(FENCE) else {
        return trimmed;
    };

    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        // Single-line fence such as ```["a"]```
        None => rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
    };

    body.trim_end()
        .strip_suffix(FENCE)
        .unwrap_or(body)
        .trim()
}

/// Keep at most `max_words` whitespace-separated words, appending `...`
/// when anything was cut
pub fn truncate_words(text: &str, max_words: usize) -> String {
    let mut words = text.split_whitespace();
    let kept: Vec<&str> = words.by_ref().take(max_words).collect();
    if words.next().is_none() {
        return text.to_string();
    }
    let mut out = kept.join(" ");
    out.push_str("...");
    out
}

/// Values search tools write in place of a missing field
pub const PLACEHOLDERS: [&str; 3] = ["N/A", "Unknown", "Unknown Hotel"];

/// Whether a field value is blank or one of [`PLACEHOLDERS`]
pub fn is_placeholder(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || PLACEHOLDERS.iter().any(|p| p.eq_ignore_ascii_case(value))
}

/// Lowercase, trim and strip trailing `. - ! ? $`
pub fn normalize_title(title: &str) -> String {
    title
        .trim()
        .to_lowercase()
        .trim_end_matches(['.', '-', '!', '?', '$'])
        .trim_end()
        .to_string()
}

/// Canonical form of a URL for identity comparison
///
/// Parsable URLs lose their fragment and any trailing slash, and get a
/// lowercase scheme and host. Anything else is only trimmed.
pub fn normalize_url(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }
    match Url::parse(raw) {
        Ok(mut url) => {
            url.set_fragment(None);
            url.as_str().trim_end_matches('/').to_string()
        }
        Err(_) => raw.to_string(),
    }
}

/// Host part of a URL, or "" when it has none
pub fn host(raw: &str) -> String {
    Url::parse(raw.trim())
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unwrap_fence_with_language_tag() {
        assert_eq!(
            unwrap_code_fence("```json\n[\"technology\"]\n```"),
            "[\"technology\"]"
        );
    }

    #[test]
    fn test_unwrap_fence_without_language_tag() {
        assert_eq!(unwrap_code_fence("```\n{\"a\": 1}\n```\n"), "{\"a\": 1}");
    }

    #[test]
    fn test_unwrap_unfenced_and_empty() {
        assert_eq!(unwrap_code_fence("  [1, 2]  "), "[1, 2]");
        assert_eq!(unwrap_code_fence(""), "");
        assert_eq!(unwrap_code_fence("```"), "");
    }

    #[test]
    fn test_unwrap_unterminated_fence() {
        assert_eq!(unwrap_code_fence("```json\n[1]"), "[1]");
    }

    #[test]
    fn test_unwrap_single_line_fence() {
        assert_eq!(unwrap_code_fence("```json[\"sports\"]```"), "[\"sports\"]");
    }

    #[test]
    fn test_placeholders() {
        assert!(is_placeholder(" n/a "));
        assert!(is_placeholder("Unknown Hotel"));
        assert!(is_placeholder(""));
        assert!(!is_placeholder("UA 1234"));
    }

    #[test]
    fn test_truncate_words() {
        assert_eq!(truncate_words("one two three", 5), "one two three");
        assert_eq!(truncate_words("one two three", 3), "one two three");
        assert_eq!(truncate_words("one  two three four", 2), "one two...");
        assert_eq!(truncate_words("", 2), "");
    }

    #[test]
    fn test_truncate_at_hundred_words() {
        let long = vec!["word"; 150].join(" ");
        let out = truncate_words(&long, 100);
        assert!(out.ends_with("..."));
        assert_eq!(out.trim_end_matches("...").split_whitespace().count(), 100);
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title("  Big News!!  "), "big news");
        assert_eq!(normalize_title("Markets rally -"), "markets rally");
        assert_eq!(normalize_title("Costs $"), "costs");
        assert_eq!(normalize_title(""), "");
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(
            normalize_url(" HTTPS://Example.com/a/#top "),
            "https://example.com/a"
        );
        assert_eq!(normalize_url("https://example.com/"), "https://example.com");
        assert_eq!(normalize_url("job-id-123"), "job-id-123");
        assert_eq!(normalize_url("   "), "");
    }

    #[test]
    fn test_host() {
        assert_eq!(host("https://www.reuters.com/world/x"), "www.reuters.com");
        assert_eq!(host("not a url"), "");
    }
}
