//! Mission server - status and control surface for one autopilot.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mission_link::{LinkIds, MavlinkVehicle, MissionControl, SimVehicle, Vehicle};
use mission_server::api;
use mission_server::config::Config;
use mission_server::loops;
use mission_server::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("mission_server=debug".parse()?))
        .init();

    tracing::info!("Starting mission server...");

    let config = Config::from_env();

    let vehicle: Box<dyn Vehicle> = if config.mavlink_url == "sim" {
        tracing::warn!("MAVLINK_URL=sim: serving the built-in simulator");
        Box::new(SimVehicle::new())
    } else {
        let ids = LinkIds {
            target_system: config.target_system,
            target_component: config.target_component,
            ..LinkIds::default()
        };
        let vehicle = MavlinkVehicle::connect(&config.mavlink_url, ids)?;
        tracing::info!(url = %config.mavlink_url, "waiting for heartbeat");
        vehicle.wait_heartbeat(Duration::from_secs(config.heartbeat_timeout_secs))?;
        Box::new(vehicle)
    };

    let control = MissionControl::new(vehicle)?;
    let state = Arc::new(AppState::new(control));

    // Start background loops
    let (shutdown_tx, _) = tokio::sync::broadcast::channel(1);
    tokio::spawn(loops::status_loop::run_status_loop(
        state.clone(),
        config.status_interval_secs,
        shutdown_tx.subscribe(),
    ));

    // Build the app
    let app = api::routes()
        .route("/health", get(|| async { "OK" }))
        .with_state(state)
        .layer(CorsLayer::permissive());

    // Run server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    let _ = shutdown_tx.send(());
    Ok(())
}
