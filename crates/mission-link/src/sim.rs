//! In-memory vehicle for tests and demos.

use std::sync::{Arc, Mutex};

use crate::error::VehicleError;
use crate::vehicle::Vehicle;
use mission_core::models::{FlightMode, GlobalPosition, MissionItem};

#[derive(Default)]
struct SimState {
    items: Vec<MissionItem>,
    current_seq: u16,
    mode: Option<FlightMode>,
    armed: bool,
    position: Option<GlobalPosition>,
    home: Option<GlobalPosition>,
}

/// A scriptable [`Vehicle`] with no link behind it.
///
/// Tests drive the autopilot side through the setter methods: position the
/// vehicle, arm it, advance the active mission item. Clones share state, so
/// a test can keep a handle to a vehicle it has handed off.
#[derive(Clone, Default)]
pub struct SimVehicle {
    state: Arc<Mutex<SimState>>,
}

impl SimVehicle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place the vehicle at a position (global frame, relative altitude).
    pub fn set_position(&self, lat: f64, lon: f64, alt_m: f64) {
        self.lock().position = Some(GlobalPosition::new(lat, lon, alt_m));
    }

    pub fn set_home(&self, lat: f64, lon: f64) {
        self.lock().home = Some(GlobalPosition::new(lat, lon, 0.0));
    }

    pub fn set_armed(&self, armed: bool) {
        self.lock().armed = armed;
    }

    /// Force the active mission slot, as MISSION_CURRENT would.
    pub fn set_current_sequence(&self, seq: u16) {
        self.lock().current_seq = seq;
    }

    /// Advance to the next mission slot, clamped to the last item.
    pub fn advance(&self) {
        let mut state = self.lock();
        let last = state.items.len() as u16;
        if state.current_seq < last {
            state.current_seq += 1;
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Vehicle for SimVehicle {
    fn download_mission(&self) -> Result<Vec<MissionItem>, VehicleError> {
        Ok(self.lock().items.clone())
    }

    fn upload_mission(&self, items: &[MissionItem]) -> Result<(), VehicleError> {
        let mut state = self.lock();
        state.items = items.to_vec();
        state.current_seq = 0;
        Ok(())
    }

    fn mission_items(&self) -> Vec<MissionItem> {
        self.lock().items.clone()
    }

    fn current_sequence(&self) -> u16 {
        self.lock().current_seq
    }

    fn set_mode(&self, mode: FlightMode) -> Result<(), VehicleError> {
        let mut state = self.lock();
        state.mode = Some(mode);
        // A real autopilot starts on the first item when AUTO engages while
        // armed; mirror that so demos behave.
        if mode == FlightMode::Auto
            && state.armed
            && state.current_seq == 0
            && !state.items.is_empty()
        {
            state.current_seq = 1;
        }
        Ok(())
    }

    fn mode(&self) -> FlightMode {
        self.lock().mode.unwrap_or(FlightMode::Stabilize)
    }

    fn armed(&self) -> bool {
        self.lock().armed
    }

    fn position(&self) -> Option<GlobalPosition> {
        self.lock().position
    }

    fn home_position(&self) -> Option<GlobalPosition> {
        self.lock().home
    }
}
