//! API routes for the mission server.

pub mod mission;
pub mod ws;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/v1/mission/status", get(mission::get_status))
        .route("/v1/mission/start", post(mission::start_mission))
        .route("/v1/mission/clear", post(mission::clear_mission))
        .route("/v1/mission/ws", get(ws::ws_handler))
}
