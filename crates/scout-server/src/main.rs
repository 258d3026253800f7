//! scout HTTP Server
//!
//! Axum server exposing one aggregation pipeline per domain (news, jobs,
//! travel) plus advisory per-user preferences.

mod handlers;
mod state;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scout_pipeline::PipelineConfig;
use scout_runtime::provider_from_env;

use crate::handlers::{
    aggregate, delete_preferences, get_preferences, health_check, list_models, put_preferences,
};
use crate::state::AppState;

fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health & info
        .route("/health", get(health_check))
        .route("/api/models", get(list_models))
        // Pipelines
        .route("/api/{domain}", post(aggregate))
        // Preferences
        .route(
            "/api/preferences/{user_id}",
            get(get_preferences)
                .put(put_preferences)
                .delete(delete_preferences),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    // Configuration errors stop startup; nothing fails per request after this
    let runtime = provider_from_env()?;
    let config = PipelineConfig::from_env()?;

    match runtime.provider.health_check().await {
        Ok(true) => {
            tracing::info!("✓ Connected to {} (model {})", runtime.kind, runtime.model);
            if let Ok(models) = runtime.provider.list_models().await {
                for model in models {
                    tracing::info!("  Model: {}", model.id);
                }
            }
        }
        Ok(false) | Err(_) => {
            tracing::warn!("⚠ {} not reachable - summaries will report failures", runtime.kind);
        }
    }

    if config.search.mock {
        tracing::warn!("⚠ SCOUT_MOCK_SEARCH set - serving fixture search results");
    } else {
        if config.search.newsapi_key.is_none() {
            tracing::warn!("⚠ NEWSAPI_API_KEY not set - news categories will come back empty");
        }
        if config.search.serpapi_key.is_none() {
            tracing::warn!("⚠ SERPAPI_API_KEY not set - jobs come back empty, travel uses fixtures");
        }
    }

    tracing::info!(
        "Fetch: {} mode, {:?} timeout per category, {:?} per model call",
        config.fetch_mode,
        config.fetch_timeout,
        config.agent_timeout
    );

    let state = AppState::from_runtime(runtime, &config)?;

    // Start server
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 scout server running on http://{}", addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  GET    /health                     - Health check");
    tracing::info!("  GET    /api/models                 - List available models");
    tracing::info!("  POST   /api/{{news|jobs|travel}}     - Run a pipeline");
    tracing::info!("  GET    /api/preferences/{{user_id}}  - Read preferences");
    tracing::info!("  PUT    /api/preferences/{{user_id}}  - Merge preferences");
    tracing::info!("  DELETE /api/preferences/{{user_id}}  - Clear preferences");
    tracing::info!("");

    axum::serve(listener, app(state)).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use scout_core::MockProvider;
    use scout_pipeline::{AggregationPipeline, Domain, MockSearchClient};

    use super::*;

    fn state(provider: Arc<MockProvider>) -> AppState {
        let config = PipelineConfig::default();
        let pipelines: HashMap<Domain, AggregationPipeline> = Domain::ALL
            .into_iter()
            .map(|domain| {
                let pipeline = AggregationPipeline::build(
                    domain,
                    provider.clone(),
                    "mock",
                    Arc::new(MockSearchClient::with_fixtures(domain)),
                    &config,
                )
                .unwrap();
                (domain, pipeline)
            })
            .collect();
        AppState::new(provider, "mock", "mock", pipelines)
    }

    async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_health() {
        let app = app(state(Arc::new(MockProvider::new())));
        let (status, body) = send(app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["provider"], "mock");
        assert_eq!(body["provider_connected"], true);
    }

    #[tokio::test]
    async fn test_models() {
        let app = app(state(Arc::new(MockProvider::new())));
        let (status, body) = send(app, "GET", "/api/models", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["models"].is_array());
    }

    #[tokio::test]
    async fn test_news_pipeline_route() {
        let provider = Arc::new(
            MockProvider::new()
                .with_reply(r#"["technology"]"#)
                .with_reply("- Tech is busy"),
        );
        let app = app(state(provider));
        let (status, body) = send(
            app,
            "POST",
            "/api/news",
            Some(json!({ "query": "latest tech news" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["domain"], "news");
        assert_eq!(body["categories"], json!(["technology"]));
        assert_eq!(body["unique_count"], 3);
        assert!(
            body["output"]
                .as_str()
                .unwrap()
                .starts_with("**Category analyzed:** technology")
        );
    }

    #[tokio::test]
    async fn test_empty_query_is_rejected() {
        let provider = Arc::new(MockProvider::new());
        let app = app(state(provider.clone()));
        let (status, body) = send(app, "POST", "/api/jobs", Some(json!({ "query": "  " }))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "EMPTY_QUERY");
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_domain_is_not_found() {
        let app = app(state(Arc::new(MockProvider::new())));
        let (status, body) = send(app, "POST", "/api/weather", Some(json!({ "query": "rain" }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "UNKNOWN_DOMAIN");
    }

    #[tokio::test]
    async fn test_preferences_lifecycle() {
        let app = app(state(Arc::new(MockProvider::new())));

        let (status, body) = send(
            app.clone(),
            "PUT",
            "/api/preferences/ada",
            Some(json!({ "budget": "$200", "airline": "Alaska" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["preferences"]["budget"], "$200");

        send(
            app.clone(),
            "PUT",
            "/api/preferences/ada",
            Some(json!({ "budget": "$300" })),
        )
        .await;
        let (_, body) = send(app.clone(), "GET", "/api/preferences/ada", None).await;
        assert_eq!(body["preferences"], json!({ "airline": "Alaska", "budget": "$300" }));

        let (status, _) = send(app.clone(), "DELETE", "/api/preferences/ada", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (_, body) = send(app, "GET", "/api/preferences/ada", None).await;
        assert_eq!(body["preferences"], json!({}));
    }

    #[tokio::test]
    async fn test_request_preferences_are_remembered() {
        let provider = Arc::new(
            MockProvider::new()
                .with_reply(r#"["hotels"]"#)
                .with_reply("Book the Fairfield."),
        );
        let app = app(state(provider.clone()));
        let (status, _) = send(
            app.clone(),
            "POST",
            "/api/travel",
            Some(json!({
                "query": "cheap hotel",
                "user_id": "grace",
                "preferences": { "budget": "under $150" }
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = send(app, "GET", "/api/preferences/grace", None).await;
        assert_eq!(body["preferences"]["budget"], "under $150");

        let requests = provider.requests().await;
        assert!(requests[1].iter().any(|m| m.content.contains("budget: under $150")));
    }
}
