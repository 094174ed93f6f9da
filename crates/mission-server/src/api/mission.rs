//! Mission start/clear/status handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::state::{AppState, StatusReport};
use mission_core::models::{MissionItem, NavCommand};
use mission_link::MissionError;

#[derive(Debug, Deserialize)]
pub struct StartMissionRequest {
    pub waypoints: Vec<WaypointRequest>,
}

#[derive(Debug, Deserialize)]
pub struct WaypointRequest {
    pub lat: f64,
    pub lon: f64,
    #[serde(alias = "alt")]
    pub alt_m: f64,
    /// Defaults to a plain waypoint
    #[serde(default)]
    pub command: Option<NavCommand>,
    #[serde(default)]
    pub hold_s: f32,
    #[serde(default)]
    pub accept_radius_m: f32,
}

impl WaypointRequest {
    fn into_item(self, seq: u16) -> MissionItem {
        MissionItem {
            seq,
            command: self.command.unwrap_or(NavCommand::Waypoint),
            lat: self.lat,
            lon: self.lon,
            alt_m: self.alt_m,
            hold_s: self.hold_s,
            accept_radius_m: self.accept_radius_m,
            autocontinue: true,
        }
    }
}

pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusReport> {
    Json(state.status_report())
}

pub async fn start_mission(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<StartMissionRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), (StatusCode, Json<serde_json::Value>)> {
    if payload.waypoints.is_empty() {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "error": "Mission rejected",
                "violations": ["mission has no waypoints"]
            })),
        ));
    }

    let items: Vec<MissionItem> = payload
        .waypoints
        .into_iter()
        .enumerate()
        .map(|(i, wp)| wp.into_item(i as u16 + 1))
        .collect();
    let count = items.len();

    // The vehicle link is blocking; keep it off the runtime workers
    let result = tokio::task::spawn_blocking({
        let state = state.clone();
        move || state.control().start_mission(&items)
    })
    .await
    .map_err(internal_error)?;

    match result {
        Ok(()) => {
            let mission_id = state.new_mission_id();
            tracing::info!(%mission_id, waypoints = count, "mission started");
            Ok((
                StatusCode::CREATED,
                Json(json!({ "mission_id": mission_id, "waypoints": count })),
            ))
        }
        Err(MissionError::CommandNotAllowed { seq, command }) => Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "error": "Mission rejected",
                "violations": [format!("command {command:?} not allowed (item {seq})")]
            })),
        )),
        Err(MissionError::Vehicle(e)) => {
            tracing::error!(error = %e, "mission upload failed");
            Err((
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": e.to_string() })),
            ))
        }
    }
}

pub async fn clear_mission(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    let result = tokio::task::spawn_blocking({
        let state = state.clone();
        move || state.control().clear_mission()
    })
    .await
    .map_err(internal_error)?;

    match result {
        Ok(()) => {
            state.clear_mission_id();
            Ok(Json(json!({ "cleared": true })))
        }
        Err(e) => {
            tracing::error!(error = %e, "mission clear failed");
            Err((
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": e.to_string() })),
            ))
        }
    }
}

fn internal_error(e: tokio::task::JoinError) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": e.to_string() })),
    )
}
