//! ROM Engine API Server
//!
//! HTTP surface over the measurement engine: measurement configuration,
//! session lifecycle, reference lookups, pose result ingestion, posture
//! capture, and Prometheus metrics.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use frame_dispatch::{
    ExternalPoseModel, FrameHub, MeasurementDispatcher, ModelState, SharedSession,
};
use joint_resolver::JointResolver;
use measurement_session::MeasurementSession;
use metrics_exporter_prometheus::PrometheusHandle;
use posture_metrics::PostureAnalyzer;
use serde::Serialize;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

mod error;
mod routes;
mod settings;

pub use error::ApiError;
pub use settings::{LoggingSettings, ServerSettings, Settings};

/// Application state shared across handlers
pub struct AppState {
    /// Measurement session, also written by the dispatcher
    pub session: SharedSession,
    /// Pose result fan-out
    pub hub: FrameHub,
    pub posture: PostureAnalyzer,
    /// Prometheus render handle, absent when no recorder is installed
    pub prometheus: Option<PrometheusHandle>,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    /// Create new application state
    pub fn new(settings: &Settings, prometheus: Option<PrometheusHandle>) -> Self {
        Self {
            session: Arc::new(RwLock::new(MeasurementSession::new(settings.session.clone()))),
            hub: FrameHub::new(ExternalPoseModel::default(), &settings.dispatch),
            posture: PostureAnalyzer::new(settings.posture.clone()),
            prometheus,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
        }
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub model: ModelState,
    pub consumers: usize,
    pub is_measuring: bool,
    pub active_measurements: usize,
}

/// Create the application router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route(
            "/api/v1/measurements",
            get(routes::measurements::list_measurements)
                .post(routes::measurements::add_measurement),
        )
        .route(
            "/api/v1/measurements/single",
            put(routes::measurements::set_single_measurement),
        )
        .route(
            "/api/v1/measurements/:id",
            delete(routes::measurements::remove_measurement),
        )
        .route(
            "/api/v1/measurements/:id/snapshot",
            get(routes::measurements::get_snapshot),
        )
        .route("/api/v1/session", get(routes::session::get_status))
        .route("/api/v1/session/start", post(routes::session::start))
        .route("/api/v1/session/stop", post(routes::session::stop))
        .route("/api/v1/session/reset", post(routes::session::reset))
        .route("/api/v1/session/save", post(routes::session::save))
        .route("/api/v1/saved", get(routes::session::list_saved))
        .route("/api/v1/saved/:id", delete(routes::session::delete_saved))
        .route(
            "/api/v1/ranges/:joint/:direction",
            get(routes::reference::get_range),
        )
        .route(
            "/api/v1/directions/:joint",
            get(routes::reference::get_directions),
        )
        .route("/api/v1/frames", post(routes::frames::publish_frame))
        .route("/api/v1/posture/capture", post(routes::posture::capture))
        .route("/api/v1/posture/buffer", delete(routes::posture::clear_buffer))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let session = state.session.read().await;
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        model: state.hub.state(),
        consumers: state.hub.subscriber_count(),
        is_measuring: session.is_measuring(),
        active_measurements: session.measurements().len(),
    })
}

/// Prometheus exposition
async fn metrics_handler(State(state): State<SharedState>) -> impl IntoResponse {
    match &state.prometheus {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed".to_string()),
    }
}

/// Initialize logging
pub fn init_logging(settings: &LoggingSettings) -> anyhow::Result<()> {
    let level = Level::from_str(&settings.level).unwrap_or(Level::INFO);
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    if settings.json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

/// Run the server and the measurement dispatcher until Ctrl-C
pub async fn run_server(
    settings: Settings,
    prometheus: Option<PrometheusHandle>,
) -> anyhow::Result<()> {
    let state: SharedState = Arc::new(AppState::new(&settings, prometheus));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let subscription = state.hub.subscribe()?;
    let dispatcher = MeasurementDispatcher::new(
        JointResolver::new(settings.resolver.clone()),
        settings.dispatch.clone(),
    );
    let session = Arc::clone(&state.session);
    let dispatch_task = tokio::spawn(async move {
        dispatcher.run(subscription, session, shutdown_rx).await;
    });

    let app = create_router(Arc::clone(&state));
    let addr = settings.server.addr();
    info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // dispatcher may already be gone
    let _ = shutdown_tx.send(true);
    dispatch_task.await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl-C: {}", e);
    }
}
