//! HTTP gateway for Briefly.
//!
//! Exposes the streamed chat endpoint, the speech endpoint, a health check,
//! and the embedded web UI.
//!
//! Built on Axum for high performance async HTTP.

pub mod api;
pub mod frontend;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use axum::{
    Router,
    extract::State,
    response::Json,
    routing::{get, post},
};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

use briefly_agent::CompletionLoop;
use briefly_config::{AppConfig, GatewayConfig};
use briefly_core::error::Error;
use briefly_core::speech::SpeechSynthesizer;

/// Shared application state for the gateway.
///
/// Read-only after startup: every request gets its own conversation, so no
/// locking is needed.
pub struct GatewayState {
    pub chat: CompletionLoop,
    pub speech: Arc<dyn SpeechSynthesizer>,
}

pub type SharedState = Arc<GatewayState>;

impl GatewayState {
    pub fn new(chat: CompletionLoop, speech: Arc<dyn SpeechSynthesizer>) -> SharedState {
        Arc::new(Self { chat, speech })
    }
}

/// Build the Axum router with all gateway routes.
///
/// Layers applied:
/// - Request body size limit
/// - CORS for the configured origins (same-origin only when none are set)
/// - HTTP trace logging
pub fn build_router(state: SharedState, config: &GatewayConfig) -> Router {
    let api = Router::new()
        .route("/health", get(health_handler))
        .route("/api/chat", post(api::chat_handler))
        .route("/api/tts", post(api::tts_handler))
        .with_state(state);

    api.merge(frontend::frontend_router())
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(cors_layer(&config.allowed_origins))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600))
}

/// Build shared state from configuration.
///
/// Invalid settings surface as [`Error::Config`], a missing API key as a
/// provider error.
pub fn state_from_config(config: &AppConfig) -> Result<SharedState, Error> {
    config.validate().map_err(|e| Error::Config {
        message: e.to_string(),
    })?;
    let providers = briefly_providers::build_from_config(config)?;
    let tools = Arc::new(briefly_tools::default_registry(&config.article));
    let chat = CompletionLoop::from_config(providers.completion, tools, config);
    Ok(GatewayState::new(chat, providers.speech))
}

/// Start the gateway HTTP server.
///
/// Runs until Ctrl-C, then drains in-flight requests.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let state = state_from_config(&config)?;
    let app = build_router(state, &config.gateway);

    info!(addr = %addr, model = %config.model, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    model: String,
}

async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        model: state.chat.model().to_string(),
    })
}
