//! HTTP gateway for SmartPick.
//!
//! Serves the chat widget's backend (`POST /chatkit`), a server-sent feed of
//! UI signals for the carousel (`GET /signals`), the card catalog and a
//! carousel targeting endpoint.
//!
//! Built on Axum.

pub mod api;

use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use axum::{
    Router,
    response::Json,
    routing::{get, post},
};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{debug, info, warn};

use smartpick_agent::HttpAgent;
use smartpick_chatkit::OperationRouter;
use smartpick_config::{AppConfig, CatalogConfig};
use smartpick_core::agent::Agent;
use smartpick_core::catalog::Catalog;
use smartpick_core::error::CatalogError;
use smartpick_core::event::SignalBus;
use smartpick_core::rotation::Carousel;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub router: OperationRouter,
    pub catalog: Arc<Catalog>,
    pub signals: Arc<SignalBus>,
    pub carousel: Mutex<Carousel>,
    pub allowed_origin: String,
}

pub type SharedState = Arc<GatewayState>;

impl GatewayState {
    /// Wire the router, signal bus and carousel around one agent and catalog.
    pub fn new(config: &AppConfig, agent: Arc<dyn Agent>, catalog: Arc<Catalog>) -> SharedState {
        let signals = Arc::new(SignalBus::default());
        let router = OperationRouter::new(agent, catalog.clone())
            .with_signals(signals.clone())
            .with_replies(config.replies.clone())
            .with_stream_interval(Duration::from_millis(config.stream.interval_ms));
        let carousel =
            Carousel::from_catalog(&catalog).with_spin_period(config.carousel.spin_period_secs);

        Arc::new(Self {
            router,
            catalog,
            signals,
            carousel: Mutex::new(carousel),
            allowed_origin: config.gateway.allowed_origin.clone(),
        })
    }
}

/// The configured catalog file, or the built-in catalog.
pub fn load_catalog(config: &CatalogConfig) -> Result<Catalog, CatalogError> {
    match &config.path {
        Some(path) => Catalog::from_path(path),
        None => Ok(Catalog::builtin()),
    }
}

/// Build the Axum router with all gateway routes.
///
/// Layers applied:
/// - CORS for the configured UI origin
/// - Request body size limit (1 MB)
/// - HTTP trace logging
pub fn build_router(state: SharedState) -> Router {
    let cors = cors_layer(&state.allowed_origin);

    Router::new()
        .route("/health", get(health_handler))
        .route("/chatkit", post(api::chatkit_handler))
        .route("/signals", get(api::signals_handler))
        .route("/catalog", get(api::catalog_handler))
        .route("/carousel/target", post(api::carousel_target_handler))
        .with_state(state)
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

fn cors_layer(origin: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(Duration::from_secs(3600));

    match HeaderValue::from_str(origin) {
        Ok(value) => cors.allow_origin(AllowOrigin::exact(value)),
        Err(e) => {
            warn!(origin = %origin, error = %e, "Invalid allowed_origin, cross-origin requests will be refused");
            cors
        }
    }
}

/// Keep the shared carousel in step with the router's signals.
pub fn follow_signals(state: SharedState) -> JoinHandle<()> {
    let mut rx = state.signals.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(signal) => {
                    let command = state.carousel.lock().await.apply(&signal);
                    debug!(signal = signal.event_type(), command = ?command, "Carousel updated");
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Carousel fell behind the signal feed");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let catalog = Arc::new(load_catalog(&config.catalog)?);
    let agent: Arc<dyn Agent> = Arc::new(HttpAgent::from_config(&config.agent)?);
    let state = GatewayState::new(&config, agent, catalog.clone());
    follow_signals(state.clone());

    let app = build_router(state);

    info!(
        addr = %addr,
        agent = %config.agent.base_url,
        cards = catalog.len(),
        "Gateway starting"
    );
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
