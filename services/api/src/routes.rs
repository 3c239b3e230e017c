use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use minpaku_sim::simulation::{
    simulation_router, MessageRelay, SimulationRepository, SimulationService,
};
use serde_json::json;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::warn;

const ENDPOINTS: [&str; 11] = [
    "GET /",
    "GET /health",
    "GET /api/health",
    "GET /ready",
    "GET /metrics",
    "POST /api/simulation",
    "GET /api/simulation/latest",
    "GET /api/results/:simulation_id",
    "GET /api/rates",
    "POST /api/webhook",
    "GET /api/webhook",
];

pub(crate) fn with_operational_routes<R, M>(service: Arc<SimulationService<R, M>>) -> Router
where
    R: SimulationRepository + 'static,
    M: MessageRelay + 'static,
{
    simulation_router(service)
        .route("/", get(index))
        .route("/health", get(healthcheck))
        .route("/api/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn index(Extension(state): Extension<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "store": state.store.backend(),
        "started_at": state.started_at,
        "endpoints": ENDPOINTS,
    }))
}

pub(crate) async fn healthcheck(Extension(state): Extension<AppState>) -> impl IntoResponse {
    match state.store.count() {
        Ok(stored) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "stored_results": stored })),
        ),
        Err(err) => {
            warn!(%err, "health check could not reach the simulation store");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "degraded", "error": err.to_string() })),
            )
        }
    }
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
