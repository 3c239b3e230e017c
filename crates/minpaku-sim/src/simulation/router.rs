use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tracing::warn;

use super::domain::SimulationId;
use super::error::SimulationError;
use super::format::CALCULATION_FAILED;
use super::input::SimulationRequest;
use super::relay::MessageRelay;
use super::repository::{RepositoryError, SimulationRepository};
use super::service::SimulationService;
use super::webhook::WebhookPayload;

/// Router exposing simulation, result lookup, and chat webhook endpoints.
pub fn simulation_router<R, M>(service: Arc<SimulationService<R, M>>) -> Router
where
    R: SimulationRepository + 'static,
    M: MessageRelay + 'static,
{
    Router::new()
        .route("/api/simulation", post(submit_handler::<R, M>))
        .route("/api/simulation/latest", get(latest_handler::<R, M>))
        .route("/api/rates", get(rates_handler::<R, M>))
        .route(
            "/api/results/:simulation_id",
            get(result_handler::<R, M>),
        )
        .route(
            "/api/webhook",
            post(webhook_handler::<R, M>).get(webhook_verify_handler),
        )
        .with_state(service)
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let payload = json!({ "error": message.into() });
    (status, Json(payload)).into_response()
}

fn simulation_error_response(error: SimulationError) -> Response {
    match &error {
        SimulationError::Validation(_) => error_response(StatusCode::BAD_REQUEST, error.to_string()),
        SimulationError::Calculation(_) => {
            error_response(StatusCode::INTERNAL_SERVER_ERROR, CALCULATION_FAILED)
        }
        SimulationError::Repository(RepositoryError::NotFound) => {
            error_response(StatusCode::NOT_FOUND, error.to_string())
        }
        SimulationError::Repository(_) => {
            error_response(StatusCode::SERVICE_UNAVAILABLE, error.to_string())
        }
    }
}

pub(crate) async fn submit_handler<R, M>(
    State(service): State<Arc<SimulationService<R, M>>>,
    payload: Result<Json<SimulationRequest>, JsonRejection>,
) -> Response
where
    R: SimulationRepository + 'static,
    M: MessageRelay + 'static,
{
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return error_response(StatusCode::BAD_REQUEST, rejection.body_text()),
    };

    match service.submit(&request) {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(error) => simulation_error_response(error),
    }
}

pub(crate) async fn latest_handler<R, M>(
    State(service): State<Arc<SimulationService<R, M>>>,
) -> Response
where
    R: SimulationRepository + 'static,
    M: MessageRelay + 'static,
{
    match service.latest() {
        Ok(Some(record)) => (StatusCode::OK, Json(record)).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "no simulation results yet"),
        Err(error) => simulation_error_response(error),
    }
}

pub(crate) async fn result_handler<R, M>(
    State(service): State<Arc<SimulationService<R, M>>>,
    Path(simulation_id): Path<String>,
) -> Response
where
    R: SimulationRepository + 'static,
    M: MessageRelay + 'static,
{
    let id = SimulationId(simulation_id);
    match service.get(&id) {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(SimulationError::Repository(RepositoryError::NotFound)) => {
            error_response(StatusCode::NOT_FOUND, format!("simulation {id} not found"))
        }
        Err(error) => simulation_error_response(error),
    }
}

/// Reference rates currently in effect, including CSV overrides.
pub(crate) async fn rates_handler<R, M>(
    State(service): State<Arc<SimulationService<R, M>>>,
) -> Json<serde_json::Value>
where
    R: SimulationRepository + 'static,
    M: MessageRelay + 'static,
{
    let table = service.rates();
    let regions: Vec<_> = table
        .regions()
        .iter()
        .map(|region| {
            json!({
                "key": region.key,
                "name": region.display_name,
                "dailyRate": region.nightly_rate,
                "occupancyRate": region.occupancy_rate(),
                "expensePercent": region.expense_percent,
            })
        })
        .collect();
    let laws: Vec<_> = table
        .regimes()
        .iter()
        .map(|regime| {
            json!({
                "key": regime.key,
                "name": regime.display_name,
                "maxDays": regime.max_operating_days,
            })
        })
        .collect();
    let property_types: Vec<_> = table
        .properties()
        .iter()
        .map(|profile| {
            json!({
                "key": profile.key,
                "cleaningCost": profile.monthly_cleaning_cost,
                "maxCapacity": profile.max_capacity,
            })
        })
        .collect();

    Json(json!({
        "regions": regions,
        "minpakuLaws": laws,
        "propertyTypes": property_types,
    }))
}

/// Always answers 200 so the chat platform does not retry deliveries.
pub(crate) async fn webhook_handler<R, M>(
    State(service): State<Arc<SimulationService<R, M>>>,
    payload: Result<Json<WebhookPayload>, JsonRejection>,
) -> Response
where
    R: SimulationRepository + 'static,
    M: MessageRelay + 'static,
{
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "unreadable webhook payload");
            let body = json!({ "status": "ignored", "replies": 0 });
            return (StatusCode::OK, Json(body)).into_response();
        }
    };

    let summary = service.handle_webhook(&payload);
    let body = json!({
        "status": "success",
        "replies": summary.replies,
        "failures": summary.failures,
    });
    (StatusCode::OK, Json(body)).into_response()
}

pub(crate) async fn webhook_verify_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ready" }))
}
