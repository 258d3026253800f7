//! HTTP Handlers

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use scout_core::{AgentError, ModelInfo, PreferenceStore};
use scout_pipeline::{Domain, PipelineError, PipelineReport, Preferences};

use crate::state::AppState;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub provider: String,
    pub provider_connected: bool,
}

#[derive(Serialize)]
pub struct ModelsResponse {
    pub models: Vec<ModelInfo>,
}

#[derive(Debug, Deserialize)]
pub struct AggregateRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub preferences: Preferences,
}

#[derive(Debug, Serialize)]
pub struct PreferencesResponse {
    pub user_id: String,
    pub preferences: Preferences,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, code: &str, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.into(),
        }),
    )
}

fn preferences_error(e: &AgentError) -> ApiError {
    tracing::error!("Preference store error: {}", e);
    api_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "PREFERENCES_ERROR",
        e.user_message(),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let provider_connected = state.provider.health_check().await.unwrap_or(false);

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        provider: state.provider_name.clone(),
        provider_connected,
    })
}

/// Models of the active provider; empty when the provider is unreachable
pub async fn list_models(State(state): State<AppState>) -> Json<ModelsResponse> {
    let models = state.provider.list_models().await.unwrap_or_else(|e| {
        tracing::warn!("Listing models failed: {}", e);
        Vec::new()
    });
    Json(ModelsResponse { models })
}

/// Run one domain's aggregation pipeline
pub async fn aggregate(
    State(state): State<AppState>,
    Path(domain): Path<String>,
    Json(payload): Json<AggregateRequest>,
) -> Result<Json<PipelineReport>, ApiError> {
    let domain: Domain = domain.parse().map_err(|e: PipelineError| {
        api_error(StatusCode::NOT_FOUND, "UNKNOWN_DOMAIN", e.to_string())
    })?;

    let query = payload.query.trim();
    if query.is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "EMPTY_QUERY",
            "Query must not be empty",
        ));
    }

    let pipeline = state.pipelines.get(&domain).ok_or_else(|| {
        api_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "DOMAIN_DISABLED",
            format!("No pipeline configured for {domain}"),
        )
    })?;

    // Merge into the user's store first so the snapshot sees this request's values
    let preferences = match payload.user_id.as_deref().filter(|u| !u.trim().is_empty()) {
        Some(user_id) => {
            let store = state
                .preferences
                .store_for(user_id)
                .map_err(|e| preferences_error(&e))?;
            store
                .merge(&payload.preferences)
                .and_then(|()| store.all())
                .map_err(|e| preferences_error(&e))?
        }
        None => payload.preferences,
    };

    let report = pipeline.run(query, &preferences).await;
    Ok(Json(report))
}

/// Stored preferences for a user; unknown users have none
pub async fn get_preferences(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<PreferencesResponse>, ApiError> {
    let preferences = match state
        .preferences
        .get(&user_id)
        .map_err(|e| preferences_error(&e))?
    {
        Some(store) => store.all().map_err(|e| preferences_error(&e))?,
        None => Preferences::new(),
    };
    Ok(Json(PreferencesResponse {
        user_id,
        preferences,
    }))
}

/// Merge preferences into a user's store
pub async fn put_preferences(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(update): Json<Preferences>,
) -> Result<Json<PreferencesResponse>, ApiError> {
    let store = state
        .preferences
        .store_for(&user_id)
        .map_err(|e| preferences_error(&e))?;
    store.merge(&update).map_err(|e| preferences_error(&e))?;
    let preferences = store.all().map_err(|e| preferences_error(&e))?;
    tracing::info!(user_id = %user_id, keys = preferences.len(), "Preferences updated");

    Ok(Json(PreferencesResponse {
        user_id,
        preferences,
    }))
}

/// Forget a user's preferences
pub async fn delete_preferences(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .preferences
        .remove(&user_id)
        .map_err(|e| preferences_error(&e))?;
    Ok(StatusCode::NO_CONTENT)
}
