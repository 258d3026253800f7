//! Preference Storage
//!
//! Advisory key/value memory of user preferences (travel dates, budget,
//! preferred airline). Nothing depends on it for correctness: stores are
//! last-write-wins and a request works the same with an empty store.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use crate::error::{AgentError, Result};

/// Header line of the rendered preference context
pub const PREFERENCES_HEADER: &str = "User Preferences:";

/// Rendered context when nothing has been stored
pub const NO_PREFERENCES: &str = "No previous preferences stored.";

/// Render a preference snapshot for inclusion in a prompt
///
/// Keys are listed in sorted order, one `- key: value` line each.
pub fn render_context(prefs: &BTreeMap<String, String>) -> String {
    if prefs.is_empty() {
        return NO_PREFERENCES.to_string();
    }

    let mut out = String::from(PREFERENCES_HEADER);
    for (key, value) in prefs {
        out.push_str("\n- ");
        out.push_str(key);
        out.push_str(": ");
        out.push_str(value);
    }
    out
}

/// Preference store interface
pub trait PreferenceStore: Send + Sync {
    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Snapshot of every stored preference
    fn all(&self) -> Result<BTreeMap<String, String>>;

    fn clear(&self) -> Result<()>;

    /// Store several preferences at once
    fn merge(&self, prefs: &BTreeMap<String, String>) -> Result<()> {
        for (key, value) in prefs {
            self.set(key, value)?;
        }
        Ok(())
    }

    fn to_context_string(&self) -> Result<String> {
        Ok(render_context(&self.all()?))
    }
}

/// In-memory preference store
#[derive(Default)]
pub struct MemoryPreferenceStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> AgentError {
    AgentError::Session("preference store lock poisoned".into())
}

impl PreferenceStore for MemoryPreferenceStore {
    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn all(&self) -> Result<BTreeMap<String, String>> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn clear(&self) -> Result<()> {
        self.entries.write().map_err(poisoned)?.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_overwrite() {
        let store = MemoryPreferenceStore::new();
        store.set("budget", "200").unwrap();
        store.set("budget", "250").unwrap();

        assert_eq!(store.get("budget").unwrap().as_deref(), Some("250"));
        assert_eq!(store.get("airline").unwrap(), None);
    }

    #[test]
    fn test_context_string() {
        let store = MemoryPreferenceStore::new();
        assert_eq!(store.to_context_string().unwrap(), NO_PREFERENCES);

        let mut prefs = BTreeMap::new();
        prefs.insert("travel_dates".to_string(), "2025-11-04 to 2025-11-07".to_string());
        prefs.insert("airline".to_string(), "Alaska".to_string());
        store.merge(&prefs).unwrap();

        assert_eq!(
            store.to_context_string().unwrap(),
            "User Preferences:\n- airline: Alaska\n- travel_dates: 2025-11-04 to 2025-11-07"
        );
    }

    #[test]
    fn test_clear() {
        let store = MemoryPreferenceStore::new();
        store.set("a", "1").unwrap();
        store.clear().unwrap();
        assert!(store.all().unwrap().is_empty());
    }

    #[test]
    fn test_stores_are_isolated() {
        let first = MemoryPreferenceStore::new();
        let second = MemoryPreferenceStore::new();
        first.set("k", "v").unwrap();
        assert!(second.all().unwrap().is_empty());
    }
}
