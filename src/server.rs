//! HTTP query surface for a health session.
//!
//! This module provides a local HTTP server that:
//! - Accepts metric samples via POST /metrics
//! - Serves summaries, recommendations, alerts and reports for the session
//!
//! # Architecture
//!
//! ```text
//! client ──→ POST /metrics ──→ HealthSession ──→ journal
//!        ←── GET /summary, /recommendations, /alert(s), /report
//! ```

use crate::activity::SharedActivityLog;
use crate::core::{EmergencyAlert, MetricSample, SampleInput, Summary};
use crate::session::{HealthSession, SharedSession};
use crate::HealthError;
use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind to (0 for random)
    pub port: u16,
}

impl ServerConfig {
    pub fn new(port: u16) -> Self {
        Self { port }
    }
}

/// Shared server state
pub struct ServerState {
    session: SharedSession,
    activity: Option<SharedActivityLog>,
}

impl ServerState {
    pub fn new(session: HealthSession) -> Self {
        Self {
            session: Arc::new(RwLock::new(session)),
            activity: None,
        }
    }

    /// Count requests in an activity log.
    pub fn with_activity(mut self, activity: SharedActivityLog) -> Self {
        self.activity = Some(activity);
        self
    }

    pub fn session(&self) -> SharedSession {
        Arc::clone(&self.session)
    }

    fn track(&self, f: impl FnOnce(&crate::activity::ActivityLog)) {
        if let Some(activity) = &self.activity {
            f(activity.as_ref());
            if let Err(e) = activity.save() {
                tracing::warn!("Failed to save activity stats: {}", e);
            }
        }
    }
}

/// An alert with its user-facing message.
#[derive(Debug, Clone, Serialize)]
pub struct AlertView {
    #[serde(flatten)]
    pub alert: EmergencyAlert,
    pub message: String,
}

impl From<EmergencyAlert> for AlertView {
    fn from(alert: EmergencyAlert) -> Self {
        Self {
            message: alert.message().to_string(),
            alert,
        }
    }
}

/// Response from the record endpoint
#[derive(Debug, Clone, Serialize)]
pub struct RecordResponse {
    pub status: String,
    pub sample: MetricSample,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert: Option<AlertView>,
}

#[derive(Serialize)]
pub struct RecommendationsResponse {
    pub messages: Vec<String>,
}

#[derive(Serialize)]
pub struct AlertResponse {
    pub alert: Option<AlertView>,
}

#[derive(Serialize)]
pub struct AlertsResponse {
    pub alerts: Vec<AlertView>,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub samples: usize,
}

/// Error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn validation_error(message: String) -> ApiError {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ErrorResponse {
            error: message,
            code: "VALIDATION_ERROR".to_string(),
        }),
    )
}

impl From<HealthError> for (StatusCode, Json<ErrorResponse>) {
    fn from(err: HealthError) -> Self {
        match err {
            HealthError::Validation(e) => validation_error(e.to_string()),
            other => {
                tracing::error!("Request failed: {}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        error: other.to_string(),
                        code: "INTERNAL_ERROR".to_string(),
                    }),
                )
            }
        }
    }
}

/// GET /health
async fn health(State(state): State<Arc<ServerState>>) -> Json<HealthResponse> {
    let session = state.session.read().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        samples: session.store().len(),
    })
}

/// POST /metrics
///
/// Body is a flat JSON object of field name to value.
async fn record(
    State(state): State<Arc<ServerState>>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<RecordResponse>, ApiError> {
    let input: SampleInput = serde_json::from_value(body)
        .map_err(|e| validation_error(format!("Invalid sample: {}", e)))?;

    let (sample, alert) = {
        let mut session = state.session.write().await;
        let sample = session.record(input)?.clone();
        (sample, session.emergency_alert())
    };

    state.track(|activity| {
        activity.record_sample();
        if alert.is_some() {
            activity.record_alerts(1);
        }
    });

    Ok(Json(RecordResponse {
        status: "ok".to_string(),
        sample,
        alert: alert.map(AlertView::from),
    }))
}

/// GET /summary
async fn summary(State(state): State<Arc<ServerState>>) -> Json<Summary> {
    Json(state.session.read().await.summary())
}

/// GET /recommendations
async fn recommendations(State(state): State<Arc<ServerState>>) -> Json<RecommendationsResponse> {
    let recs = state.session.read().await.recommendations();
    Json(RecommendationsResponse {
        messages: recs.messages(),
    })
}

/// GET /alert
async fn alert(State(state): State<Arc<ServerState>>) -> Json<AlertResponse> {
    let alert = state.session.read().await.emergency_alert();
    Json(AlertResponse {
        alert: alert.map(AlertView::from),
    })
}

/// GET /alerts
async fn alerts(State(state): State<Arc<ServerState>>) -> Json<AlertsResponse> {
    let alerts = state.session.read().await.emergency_alerts();
    Json(AlertsResponse {
        alerts: alerts.into_iter().map(AlertView::from).collect(),
    })
}

/// GET /report
async fn report(State(state): State<Arc<ServerState>>) -> String {
    let report = state.session.read().await.report();
    state.track(|activity| activity.record_report());
    report
}

/// Build the router over the given state.
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", post(record))
        .route("/summary", get(summary))
        .route("/recommendations", get(recommendations))
        .route("/alert", get(alert))
        .route("/alerts", get(alerts))
        .route("/report", get(report))
        .layer(
            CorsLayer::new()
                .allow_origin([
                    HeaderValue::from_static("http://localhost"),
                    HeaderValue::from_static("http://127.0.0.1"),
                ])
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Run the HTTP server
pub async fn run(
    config: ServerConfig,
    state: ServerState,
) -> anyhow::Result<(SocketAddr, tokio::sync::oneshot::Sender<()>)> {
    let app = router(Arc::new(state));

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    tracing::info!("Health assistant server listening on http://{}", actual_addr);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                tracing::info!("Server shutdown signal received");
            })
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok((actual_addr, shutdown_tx))
}
