//! HTTP API: health probes, Prometheus metrics and the alert interface

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use monitor_lib::{
    health::{ComponentStatus, HealthRegistry},
    observability::MonitorMetrics,
    AcknowledgeOutcome, Alert, AlertStatus, MonitorHandle,
};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub monitor: MonitorHandle,
    pub health_registry: HealthRegistry,
    pub metrics: MonitorMetrics,
}

impl AppState {
    pub fn new(monitor: MonitorHandle, health_registry: HealthRegistry, metrics: MonitorMetrics) -> Self {
        Self {
            monitor,
            health_registry,
            metrics,
        }
    }
}

/// Alert filter for the list endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertFilter {
    #[default]
    All,
    Active,
    Unacknowledged,
    Resolved,
}

#[derive(Debug, Default, Deserialize)]
pub struct AlertsQuery {
    #[serde(default)]
    pub state: AlertFilter,
}

/// Alert with its derived status and live duration
#[derive(Debug, Serialize)]
pub struct AlertView {
    #[serde(flatten)]
    pub alert: Alert,
    pub status: AlertStatus,
    pub elapsed_minutes: i64,
}

impl From<Alert> for AlertView {
    fn from(alert: Alert) -> Self {
        let elapsed_minutes = alert.elapsed_minutes(Utc::now());
        Self {
            status: alert.status(),
            elapsed_minutes,
            alert,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AcknowledgeResponse {
    pub id: String,
    pub outcome: AcknowledgeOutcome,
    pub changed: bool,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

fn not_found(id: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            error: format!("alert {id} not found"),
        }),
    )
        .into_response()
}

/// 200 if healthy or degraded, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy | ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus text exposition of this instance's registry
async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    let encoder = TextEncoder::new();
    let metric_families = state.metrics.registry().gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    (
        StatusCode::OK,
        [("content-type", encoder.format_type().to_string())],
        buffer,
    )
        .into_response()
}

async fn list_alerts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AlertsQuery>,
) -> Json<Vec<AlertView>> {
    let alerts = match query.state {
        AlertFilter::All => state.monitor.all().await,
        AlertFilter::Active => state.monitor.active().await,
        AlertFilter::Unacknowledged => state.monitor.unacknowledged().await,
        AlertFilter::Resolved => state.monitor.resolved().await,
    };

    Json(alerts.into_iter().map(AlertView::from).collect())
}

async fn alert_summary(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.monitor.summary().await)
}

async fn get_alert(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    match state.monitor.get(&id).await {
        Some(alert) => Json(AlertView::from(alert)).into_response(),
        None => not_found(&id),
    }
}

async fn acknowledge_alert(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    let outcome = state.monitor.acknowledge(&id).await;

    match outcome {
        AcknowledgeOutcome::NotFound => not_found(&id),
        _ => Json(AcknowledgeResponse {
            changed: outcome == AcknowledgeOutcome::Acknowledged,
            id,
            outcome,
        })
        .into_response(),
    }
}

async fn status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.monitor.status_snapshot().await)
}

async fn thresholds(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.monitor.thresholds().await)
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/api/v1/alerts", get(list_alerts))
        .route("/api/v1/alerts/summary", get(alert_summary))
        .route("/api/v1/alerts/:id", get(get_alert))
        .route("/api/v1/alerts/:id/acknowledge", post(acknowledge_alert))
        .route("/api/v1/status", get(status))
        .route("/api/v1/thresholds", get(thresholds))
        .with_state(state)
}

/// Start the API server
pub async fn serve(
    port: u16,
    state: Arc<AppState>,
    mut shutdown: tokio::sync::broadcast::Receiver<()>,
) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await?;

    Ok(())
}
