//! Periodic status publication.
//!
//! Samples the mission controller and pushes a JSON snapshot to WebSocket
//! subscribers on every tick.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::interval;

use crate::state::AppState;

pub async fn run_status_loop(
    state: Arc<AppState>,
    interval_secs: u64,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = interval(Duration::from_secs(interval_secs.max(1)));

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                tracing::info!("Status loop shutting down");
                break;
            }
            _ = ticker.tick() => {
                let report = state.status_report();
                tracing::debug!(
                    progress = report.status.progress,
                    current = report.status.current_waypoint,
                    "status tick"
                );
                match serde_json::to_string(&report) {
                    Ok(json) => {
                        // No subscribers is fine
                        let _ = state.tx.send(json);
                    }
                    Err(e) => tracing::warn!(error = %e, "status serialization failed"),
                }
            }
        }
    }
}
