//! Application State

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use scout_core::{AgentError, LlmProvider, MemoryPreferenceStore};
use scout_pipeline::{AggregationPipeline, Domain, PipelineConfig};
use scout_runtime::RuntimeProvider;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Text-generation provider shared by every pipeline
    pub provider: Arc<dyn LlmProvider>,

    /// Provider name for `/health`
    pub provider_name: String,

    /// Model the classifier and summarizer roles use
    pub model: String,

    /// One pipeline per domain
    pub pipelines: Arc<HashMap<Domain, AggregationPipeline>>,

    /// Advisory per-user preferences
    pub preferences: Arc<UserPreferences>,
}

impl AppState {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        provider_name: impl Into<String>,
        model: impl Into<String>,
        pipelines: HashMap<Domain, AggregationPipeline>,
    ) -> Self {
        Self {
            provider,
            provider_name: provider_name.into(),
            model: model.into(),
            pipelines: Arc::new(pipelines),
            preferences: Arc::new(UserPreferences::default()),
        }
    }

    /// Build every domain's pipeline over the selected provider
    pub fn from_runtime(
        runtime: RuntimeProvider,
        config: &PipelineConfig,
    ) -> scout_pipeline::Result<Self> {
        let mut pipelines = HashMap::new();
        for domain in Domain::ALL {
            let pipeline = AggregationPipeline::from_config(
                domain,
                runtime.provider.clone(),
                &runtime.model,
                config,
            )?;
            pipelines.insert(domain, pipeline);
        }
        Ok(Self::new(
            runtime.provider,
            runtime.kind.as_str(),
            runtime.model,
            pipelines,
        ))
    }
}

/// One preference store per user id, last write wins
#[derive(Default)]
pub struct UserPreferences {
    stores: RwLock<HashMap<String, Arc<MemoryPreferenceStore>>>,
}

impl UserPreferences {
    /// The user's store, created on first use
    pub fn store_for(&self, user_id: &str) -> Result<Arc<MemoryPreferenceStore>, AgentError> {
        if let Some(store) = self.get(user_id)? {
            return Ok(store);
        }
        let mut stores = self.stores.write().map_err(poisoned)?;
        Ok(stores.entry(user_id.to_string()).or_default().clone())
    }

    pub fn get(&self, user_id: &str) -> Result<Option<Arc<MemoryPreferenceStore>>, AgentError> {
        Ok(self.stores.read().map_err(poisoned)?.get(user_id).cloned())
    }

    pub fn remove(&self, user_id: &str) -> Result<bool, AgentError> {
        Ok(self
            .stores
            .write()
            .map_err(poisoned)?
            .remove(user_id)
            .is_some())
    }
}

fn poisoned<T>(_: T) -> AgentError {
    AgentError::Session("preference registry lock poisoned".into())
}

#[cfg(test)]
mod tests {
    use scout_core::PreferenceStore;

    use super::*;

    #[test]
    fn test_store_is_shared_per_user() {
        let prefs = UserPreferences::default();
        prefs.store_for("ada").unwrap().set("budget", "$200").unwrap();

        let again = prefs.store_for("ada").unwrap();
        assert_eq!(again.get("budget").unwrap().as_deref(), Some("$200"));
        assert!(prefs.get("grace").unwrap().is_none());

        assert!(prefs.remove("ada").unwrap());
        assert!(!prefs.remove("ada").unwrap());
    }
}
