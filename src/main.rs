//! zabbix-device-gateway
//!
//! HTTP gateway that creates, updates, or deletes monitored devices in a
//! Zabbix platform, mirrors them into a local SQLite ledger, and rebuilds
//! the group's topology map in the background.

mod api;
mod config;
mod error;
mod ledger;
mod lifecycle;
mod mapsync;
mod models;
mod state;
mod zabbix;

use std::net::SocketAddr;
use std::sync::Arc;

use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::rate_limit::RateLimiter;
use crate::ledger::DeviceLedger;
use crate::lifecycle::DeviceCoordinator;
use crate::state::GatewayState;
use crate::zabbix::ZabbixClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "zabbix_device_gateway=info,tower_http=debug".into()),
        )
        .init();

    tracing::info!("Starting zabbix-device-gateway...");

    // Load configuration
    let config = config::Config::load()?;
    tracing::info!("Configuration loaded");

    // Log in to Zabbix once; the session is reused for the process lifetime.
    // A failed login is loud but not fatal - the service still serves, and
    // requests fail against the platform until credentials are fixed.
    let zabbix = Arc::new(ZabbixClient::new(&config.zabbix.url));
    match zabbix
        .login(&config.zabbix.user, &config.zabbix.password)
        .await
    {
        Ok(()) => match zabbix.api_version().await {
            Ok(version) => tracing::info!("Connected to Zabbix API. Version: {}", version),
            Err(e) => tracing::error!("Failed to query Zabbix API version: {}", e),
        },
        Err(e) => tracing::error!("Failed to connect to Zabbix API: {}", e),
    }

    // Initialize the local device ledger
    let ledger = Arc::new(DeviceLedger::new(&config.ledger.path));
    ledger.init().await?;
    tracing::info!("Device ledger ready at {}", config.ledger.path);

    let coordinator = Arc::new(DeviceCoordinator::new(zabbix, ledger));
    let rate_limiter = Arc::new(RateLimiter::new(config.server.rate_limit_per_minute));
    let state = GatewayState::new(coordinator, rate_limiter);

    // Build application router
    let cors = CorsLayer::permissive();
    let app = api::routes(state.clone()).with_state(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors),
    );

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
