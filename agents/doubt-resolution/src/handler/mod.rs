//! HTTP handler for the Doubt Resolution Agent
//!
//! `/solve-doubt` and `/admin/settings` report failures in the body with a
//! 200 status, matching what existing frontends expect.

use axum::{
    extract::State,
    http::{header::CONTENT_TYPE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::Instrument;

use crate::client::{
    DocumentStore, EnvCredentials, FirestoreClient, FirestoreConfig, GeminiClient, GeminiConfig,
    InMemoryStore,
};
use crate::config::{AgentConfig, DEFAULT_CORS_ORIGINS};
use crate::contracts::{DoubtAnswer, IncomingQuestion, PredictRequest, Prediction};
use crate::engine::{self, CannedCatalog, DoubtResolver};
use crate::error::Result;
use crate::settings::{load_settings, SystemSettings};
use crate::telemetry::DoubtMetrics;
use crate::{AGENT_ID, AGENT_VERSION};

/// Application state
pub struct AppState {
    pub resolver: DoubtResolver,
    pub metrics: DoubtMetrics,
    pub cors_origins: Vec<String>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(resolver: DoubtResolver, metrics: DoubtMetrics) -> Self {
        Self {
            resolver,
            metrics,
            cors_origins: DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect(),
            started_at: Instant::now(),
        }
    }

    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = origins;
        self
    }

    /// Wire production collaborators from configuration
    pub fn from_config(config: &AgentConfig) -> Result<Self> {
        let metrics = DoubtMetrics::new()?;

        let store: Arc<dyn DocumentStore> = match &config.firestore_project {
            Some(project) => {
                let client = FirestoreClient::new(
                    FirestoreConfig::new(project.clone())
                        .with_base_url(config.firestore_base_url.clone())
                        .with_access_token(config.firestore_token.clone())
                        .with_timeout_ms(config.store_timeout_ms),
                )?;
                tracing::info!(project = client.project_id(), "Using Firestore document store");
                Arc::new(client)
            }
            None => {
                tracing::warn!("FIRESTORE_PROJECT_ID not set, using in-memory settings store");
                Arc::new(InMemoryStore::new())
            }
        };

        let generator = GeminiClient::new(GeminiConfig {
            base_url: config.gemini_base_url.clone(),
            timeout_ms: config.generation_timeout_ms,
        })?;
        tracing::info!(
            base_url = generator.base_url(),
            model = %config.model_id,
            "Generative client configured"
        );

        let catalog = CannedCatalog::load(config.catalog_path.as_deref())?;
        tracing::info!(entries = catalog.len(), "Canned answer catalog loaded");

        let resolver = DoubtResolver::new(
            store,
            Arc::new(generator),
            Arc::new(EnvCredentials::new(config.api_key_var.clone())),
            Arc::new(catalog),
        )
        .with_options(config.resolver_options())
        .with_metrics(metrics.clone());

        Ok(Self::new(resolver, metrics).with_cors_origins(config.cors_origins.clone()))
    }
}

/// Create the router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.cors_origins);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/solve-doubt", post(solve_doubt))
        .route("/predict", post(predict_risk))
        .route("/admin/settings", get(get_settings))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(origin = %o, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

async fn root() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "Manan API Active" }))
}

/// Health check endpoint
async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        agent_id: AGENT_ID.to_string(),
        agent_version: AGENT_VERSION.to_string(),
        catalog_entries: state.resolver.catalog().len(),
        model_id: state.resolver.options().model_id.clone(),
        match_threshold: state.resolver.options().match_threshold,
        uptime_seconds: state.started_at.elapsed().as_secs(),
        timestamp: chrono::Utc::now(),
    })
}

async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match state.metrics.gather_text() {
        Ok(body) => (
            StatusCode::OK,
            [(CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// Answer a doubt; always 200
async fn solve_doubt(
    State(state): State<Arc<AppState>>,
    Json(question): Json<IncomingQuestion>,
) -> Json<DoubtAnswer> {
    let request_id = uuid::Uuid::new_v4();
    let result = state
        .resolver
        .resolve(&question)
        .instrument(tracing::info_span!("solve_doubt", %request_id))
        .await;
    Json(result.into())
}

async fn predict_risk(Json(request): Json<PredictRequest>) -> Json<Prediction> {
    Json(engine::predict(&request))
}

async fn get_settings(State(state): State<Arc<AppState>>) -> Json<SettingsResponse> {
    match load_settings(state.resolver.store().as_ref()).await {
        Ok(settings) => Json(SettingsResponse::Success { settings }),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load system settings");
            Json(SettingsResponse::Error {
                message: e.to_string(),
            })
        }
    }
}

/// Health response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub agent_id: String,
    pub agent_version: String,
    pub catalog_entries: usize,
    pub model_id: String,
    pub match_threshold: u8,
    pub uptime_seconds: u64,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Body of `GET /admin/settings`
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SettingsResponse {
    Success { settings: SystemSettings },
    Error { message: String },
}
