//! Pipeline configuration

use std::time::Duration;

use scout_core::agent::DEFAULT_AGENT_TIMEOUT;

use crate::error::{PipelineError, Result};
use crate::fetcher::{DEFAULT_MAX_DESCRIPTION_WORDS, FetchConfig, FetchMode};
use crate::model::Domain;
use crate::search::SearchConfig;

/// Default per-category fetch timeout, in seconds
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 20;
/// Fetch and agent timeouts are clamped into this range
pub const FETCH_TIMEOUT_RANGE_SECS: (u64, u64) = (15, 30);

#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub fetch_timeout: Duration,
    pub fetch_mode: FetchMode,
    pub max_description_words: usize,
    /// Bound on each classifier/summarizer call
    pub agent_timeout: Duration,
    pub search: SearchConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            fetch_mode: FetchMode::default(),
            max_description_words: DEFAULT_MAX_DESCRIPTION_WORDS,
            agent_timeout: DEFAULT_AGENT_TIMEOUT,
            search: SearchConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load from environment variables
    ///
    /// Reads `SCOUT_FETCH_TIMEOUT_SECS`, `SCOUT_AGENT_TIMEOUT_SECS`,
    /// `SCOUT_FETCH_MODE`, `SCOUT_MAX_DESCRIPTION_WORDS` and the search
    /// credentials.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let value = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let timeout = |name: &str, default: Duration| -> Result<Duration> {
            match value(name) {
                Some(raw) => {
                    let secs: u64 = raw.trim().parse().map_err(|_| {
                        PipelineError::Config(format!("{name} must be a number, got '{raw}'"))
                    })?;
                    Ok(Duration::from_secs(clamp_timeout(name, secs)))
                }
                None => Ok(default),
            }
        };
        let fetch_timeout = timeout("SCOUT_FETCH_TIMEOUT_SECS", defaults.fetch_timeout)?;
        let agent_timeout = timeout("SCOUT_AGENT_TIMEOUT_SECS", defaults.agent_timeout)?;

        let fetch_mode = value("SCOUT_FETCH_MODE")
            .map(|raw| raw.parse::<FetchMode>())
            .transpose()?
            .unwrap_or(defaults.fetch_mode);

        let max_description_words = match value("SCOUT_MAX_DESCRIPTION_WORDS") {
            Some(raw) => raw.trim().parse().map_err(|_| {
                PipelineError::Config(format!(
                    "SCOUT_MAX_DESCRIPTION_WORDS must be a number, got '{raw}'"
                ))
            })?,
            None => defaults.max_description_words,
        };

        Ok(Self {
            fetch_timeout,
            fetch_mode,
            max_description_words,
            agent_timeout,
            search: SearchConfig::from_lookup(&lookup).with_timeout(fetch_timeout),
            ..defaults
        })
    }

    #[must_use]
    pub const fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_fetch_mode(mut self, mode: FetchMode) -> Self {
        self.fetch_mode = mode;
        self
    }

    /// Fetcher settings for a domain
    pub const fn fetch_config(&self, domain: Domain) -> FetchConfig {
        FetchConfig::new(domain.default_limit())
            .with_timeout(self.fetch_timeout)
            .with_mode(self.fetch_mode)
            .with_max_description_words(self.max_description_words)
    }
}

fn clamp_timeout(name: &str, secs: u64) -> u64 {
    let (min, max) = FETCH_TIMEOUT_RANGE_SECS;
    let clamped = secs.clamp(min, max);
    if clamped != secs {
        tracing::warn!(var = name, requested = secs, using = clamped, "Timeout clamped");
    }
    clamped
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.fetch_timeout, Duration::from_secs(20));
        assert_eq!(config.agent_timeout, Duration::from_secs(30));
        assert_eq!(config.fetch_mode, FetchMode::Concurrent);
        assert_eq!(config.max_description_words, 100);
        assert!(!config.search.mock);
    }

    #[test]
    fn test_timeout_is_clamped() {
        let low = PipelineConfig::from_lookup(lookup(&[("SCOUT_FETCH_TIMEOUT_SECS", "2")])).unwrap();
        assert_eq!(low.fetch_timeout, Duration::from_secs(15));

        let high = PipelineConfig::from_lookup(lookup(&[("SCOUT_FETCH_TIMEOUT_SECS", "300")])).unwrap();
        assert_eq!(high.fetch_timeout, Duration::from_secs(30));
        assert_eq!(high.search.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_agent_timeout_is_clamped() {
        let low = PipelineConfig::from_lookup(lookup(&[("SCOUT_AGENT_TIMEOUT_SECS", "5")])).unwrap();
        assert_eq!(low.agent_timeout, Duration::from_secs(15));

        let high = PipelineConfig::from_lookup(lookup(&[("SCOUT_AGENT_TIMEOUT_SECS", "90")])).unwrap();
        assert_eq!(high.agent_timeout, Duration::from_secs(30));
        assert_eq!(high.fetch_timeout, Duration::from_secs(20));

        assert!(matches!(
            PipelineConfig::from_lookup(lookup(&[("SCOUT_AGENT_TIMEOUT_SECS", "later")])),
            Err(PipelineError::Config(_))
        ));
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        assert!(matches!(
            PipelineConfig::from_lookup(lookup(&[("SCOUT_FETCH_TIMEOUT_SECS", "soon")])),
            Err(PipelineError::Config(_))
        ));
        assert!(matches!(
            PipelineConfig::from_lookup(lookup(&[("SCOUT_FETCH_MODE", "eventually")])),
            Err(PipelineError::Config(_))
        ));
    }

    #[test]
    fn test_fetch_config_per_domain() {
        let config = PipelineConfig::from_lookup(lookup(&[
            ("SCOUT_FETCH_MODE", "sequential"),
            ("SCOUT_MAX_DESCRIPTION_WORDS", "40"),
        ]))
        .unwrap();
        let fetch = config.fetch_config(Domain::Jobs);
        assert_eq!(fetch.limit, 10);
        assert_eq!(fetch.mode, FetchMode::Sequential);
        assert_eq!(fetch.max_description_words, 40);
    }
}
