//! Per-IP fixed-window rate limiting for the manage_device endpoint.
//!
//! A pre-check collaborator in front of the lifecycle coordinator; requests
//! over the window budget get a 429 with the usual status/message body.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tokio::sync::Mutex;

use crate::state::GatewayState;

struct WindowState {
    started: Instant,
    hits: u32,
}

pub struct RateLimiter {
    max_per_window: u32,
    window: Duration,
    windows: Mutex<HashMap<IpAddr, WindowState>>,
}

impl RateLimiter {
    pub fn new(max_per_minute: u32) -> Self {
        Self {
            max_per_window: max_per_minute,
            window: Duration::from_secs(60),
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Counts the hit and reports whether it is still within budget.
    pub async fn check(&self, ip: IpAddr) -> bool {
        let mut windows = self.windows.lock().await;
        let now = Instant::now();
        let entry = windows.entry(ip).or_insert(WindowState {
            started: now,
            hits: 0,
        });
        if now.duration_since(entry.started) >= self.window {
            entry.started = now;
            entry.hits = 0;
        }
        entry.hits += 1;
        entry.hits <= self.max_per_window
    }
}

pub async fn enforce(
    State(state): State<GatewayState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if state.rate_limiter.check(addr.ip()).await {
        next.run(req).await
    } else {
        tracing::debug!("Rate limit exceeded for {}", addr.ip());
        (
            StatusCode::TOO_MANY_REQUESTS,
            Json(serde_json::json!({
                "status": "error",
                "message": "Rate limit exceeded, try again later",
            })),
        )
            .into_response()
    }
}
