//! Shared server state around the mission controller.

use std::sync::Mutex;

use mission_core::models::MissionStatus;
use mission_link::{MissionControl, Vehicle};
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Status snapshot as served over the API: the core status plus the id
/// assigned to the running mission.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub mission_id: Option<Uuid>,
    #[serde(flatten)]
    pub status: MissionStatus,
}

pub struct AppState {
    control: MissionControl<Box<dyn Vehicle>>,
    mission_id: Mutex<Option<Uuid>>,
    /// Status snapshots for WebSocket subscribers
    pub tx: broadcast::Sender<String>,
}

impl AppState {
    pub fn new(control: MissionControl<Box<dyn Vehicle>>) -> Self {
        let (tx, _) = broadcast::channel(16);
        Self {
            control,
            mission_id: Mutex::new(None),
            tx,
        }
    }

    pub fn control(&self) -> &MissionControl<Box<dyn Vehicle>> {
        &self.control
    }

    /// Assign a fresh id to a newly started mission.
    pub fn new_mission_id(&self) -> Uuid {
        let id = Uuid::new_v4();
        *self.mission_id.lock().unwrap_or_else(|e| e.into_inner()) = Some(id);
        id
    }

    pub fn clear_mission_id(&self) {
        *self.mission_id.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }

    pub fn status_report(&self) -> StatusReport {
        StatusReport {
            mission_id: *self.mission_id.lock().unwrap_or_else(|e| e.into_inner()),
            status: self.control.mission_status(),
        }
    }
}
