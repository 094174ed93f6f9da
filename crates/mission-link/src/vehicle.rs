//! The vehicle abstraction.

use crate::error::VehicleError;
use mission_core::models::{FlightMode, GlobalPosition, MissionItem};

/// Everything the mission layer needs from a connected autopilot.
///
/// # Sequence numbering
///
/// Autopilots reserve mission slot 0 for the home location, so the items in
/// an uploaded mission occupy slots `1..=len`. [`Vehicle::current_sequence`]
/// follows that convention: 0 means no item is active, and an active item
/// `seq` corresponds to `mission_items()[seq - 1]`.
pub trait Vehicle: Send + Sync {
    /// Fetch the command list currently stored on the vehicle.
    fn download_mission(&self) -> Result<Vec<MissionItem>, VehicleError>;

    /// Replace the vehicle's command list. An empty slice clears the mission.
    fn upload_mission(&self, items: &[MissionItem]) -> Result<(), VehicleError>;

    /// Last known command list (as downloaded or uploaded).
    fn mission_items(&self) -> Vec<MissionItem>;

    /// Sequence number of the item the autopilot is flying to (0 = none).
    fn current_sequence(&self) -> u16;

    /// Switch the autopilot's flight mode.
    fn set_mode(&self, mode: FlightMode) -> Result<(), VehicleError>;

    fn mode(&self) -> FlightMode;

    fn armed(&self) -> bool;

    /// Current position in the global frame, altitude relative to home.
    fn position(&self) -> Option<GlobalPosition>;

    /// Home position as reported by the autopilot.
    fn home_position(&self) -> Option<GlobalPosition>;
}

impl<T: Vehicle + ?Sized> Vehicle for Box<T> {
    fn download_mission(&self) -> Result<Vec<MissionItem>, VehicleError> {
        (**self).download_mission()
    }

    fn upload_mission(&self, items: &[MissionItem]) -> Result<(), VehicleError> {
        (**self).upload_mission(items)
    }

    fn mission_items(&self) -> Vec<MissionItem> {
        (**self).mission_items()
    }

    fn current_sequence(&self) -> u16 {
        (**self).current_sequence()
    }

    fn set_mode(&self, mode: FlightMode) -> Result<(), VehicleError> {
        (**self).set_mode(mode)
    }

    fn mode(&self) -> FlightMode {
        (**self).mode()
    }

    fn armed(&self) -> bool {
        (**self).armed()
    }

    fn position(&self) -> Option<GlobalPosition> {
        (**self).position()
    }

    fn home_position(&self) -> Option<GlobalPosition> {
        (**self).home_position()
    }
}
