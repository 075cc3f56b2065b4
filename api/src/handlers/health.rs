use axum::{extract::State, http::StatusCode, response::IntoResponse};

use crate::state::AppState;

/// Health check endpoint
#[tracing::instrument]
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Store reachability: one scoped round trip
#[tracing::instrument(skip(state))]
pub async fn store_health(State(state): State<AppState>) -> impl IntoResponse {
    match state.gateways.health_check().await {
        Ok(()) => (StatusCode::OK, "OK"),
        Err(_) => (StatusCode::SERVICE_UNAVAILABLE, "Store unavailable"),
    }
}
