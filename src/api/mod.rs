//! API module - HTTP handlers and routes

pub mod handlers;
pub mod rate_limit;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::state::GatewayState;

pub fn routes(state: GatewayState) -> Router<GatewayState> {
    let limited = Router::new()
        .route("/manage_device", post(handlers::manage_device))
        .route_layer(middleware::from_fn_with_state(state, rate_limit::enforce));

    Router::new()
        .route("/health", get(handlers::health_check))
        .merge(limited)
}
