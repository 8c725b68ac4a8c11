//! HTTP handlers module

use axum::{
    extract::{rejection::JsonRejection, State},
    response::IntoResponse,
    Json,
};
use serde::Serialize;

use crate::error::AppError;
use crate::models::ManageDeviceRequest;
use crate::state::GatewayState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub uptime_seconds: u64,
}

/// Health check handler
pub async fn health_check(State(state): State<GatewayState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: "zabbix-device-gateway".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
    })
}

/// POST /manage_device - create, update, or delete a monitored device
pub async fn manage_device(
    State(state): State<GatewayState>,
    payload: Result<Json<ManageDeviceRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) =
        payload.map_err(|e| AppError::BadRequest(format!("Invalid request body: {}", e)))?;
    let response = state.coordinator.manage_device(request).await?;
    Ok(Json(response))
}
