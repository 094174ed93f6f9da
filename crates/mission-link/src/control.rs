//! Waypoint mission orchestration.
//!
//! Thin coordination over a [`Vehicle`]: upload a validated command
//! sequence, kick off autonomous execution, and report progress. All
//! protocol work happens behind the trait.

use chrono::Utc;
use thiserror::Error;

use crate::error::VehicleError;
use crate::vehicle::Vehicle;
use mission_core::models::{
    FlightMode, MissionItem, MissionState, MissionStatus, NavCommand,
};
use mission_core::{rules, spatial};

#[derive(Debug, Error)]
pub enum MissionError {
    #[error("command not allowed in mission: {command:?} (item {seq})")]
    CommandNotAllowed { seq: u16, command: NavCommand },

    #[error(transparent)]
    Vehicle(#[from] VehicleError),
}

/// Coordinates waypoint missions on a single vehicle.
pub struct MissionControl<V: Vehicle> {
    vehicle: V,
}

impl<V: Vehicle> MissionControl<V> {
    /// Wrap a vehicle and sync the mission currently stored on it.
    pub fn new(vehicle: V) -> Result<Self, VehicleError> {
        vehicle.download_mission()?;
        Ok(Self { vehicle })
    }

    pub fn vehicle(&self) -> &V {
        &self.vehicle
    }

    /// Remove all mission items from the vehicle.
    pub fn clear_mission(&self) -> Result<(), VehicleError> {
        tracing::info!("clearing mission");
        self.vehicle.upload_mission(&[])
    }

    /// Validate, upload and start a mission.
    ///
    /// Items are renumbered into upload order and a ReturnToLaunch sentinel
    /// is appended so completion is observable: the mission is finished
    /// exactly when the autopilot reaches the sentinel. On success the
    /// vehicle is switched to AUTO.
    pub fn start_mission(&self, waypoints: &[MissionItem]) -> Result<(), MissionError> {
        if let Some(bad) = rules::first_disallowed(waypoints) {
            return Err(MissionError::CommandNotAllowed {
                seq: bad.seq,
                command: bad.command,
            });
        }

        let mut items: Vec<MissionItem> = waypoints
            .iter()
            .enumerate()
            .map(|(i, wp)| MissionItem {
                seq: i as u16 + 1,
                ..wp.clone()
            })
            .collect();
        items.push(MissionItem::return_to_launch(items.len() as u16 + 1));

        self.vehicle.upload_mission(&items)?;
        self.vehicle.set_mode(FlightMode::Auto)?;
        tracing::info!(waypoints = waypoints.len(), "mission started");
        Ok(())
    }

    /// The mission currently known to be on the vehicle.
    pub fn mission_items(&self) -> Vec<MissionItem> {
        self.vehicle.mission_items()
    }

    /// Fraction of the mission completed, 0.0..=1.0.
    ///
    /// An empty mission counts as complete. A vehicle that is disarmed in
    /// AUTO with the current item back at 1 has flown the mission to the end
    /// and reset, which also counts as complete.
    pub fn mission_progress(&self) -> f64 {
        let count = self.vehicle.mission_items().len();
        if count == 0 {
            return 1.0;
        }
        let current = self.vehicle.current_sequence();
        if !self.vehicle.armed() && self.vehicle.mode() == FlightMode::Auto && current == 1 {
            return 1.0;
        }
        current as f64 / count as f64
    }

    pub fn is_mission_finished(&self) -> bool {
        self.mission_progress() >= 1.0
    }

    /// Meters from the vehicle to the waypoint it is flying to.
    ///
    /// `None` when no mission item is active. A ReturnToLaunch target
    /// resolves to the home position; items that carry no coordinates
    /// report zero distance.
    pub fn distance_to_next_waypoint(&self) -> Result<Option<f64>, VehicleError> {
        let current = self.vehicle.current_sequence();
        if current == 0 {
            return Ok(None);
        }
        let items = self.vehicle.mission_items();
        let Some(item) = items.iter().find(|item| item.seq == current) else {
            return Ok(None);
        };

        let target = if item.is_return_to_launch() {
            let home = self.vehicle.home_position().ok_or(VehicleError::NoHome)?;
            (home.lat, home.lon)
        } else if !item.has_coordinates() {
            // TODO: resolve targets for coordinate-less commands like
            // NAV_LOITER_TIME at the current location instead of reporting 0
            return Ok(Some(0.0));
        } else {
            (item.lat, item.lon)
        };

        let position = self.vehicle.position().ok_or(VehicleError::NoPosition)?;
        let distance =
            spatial::haversine_distance(position.lat, position.lon, target.0, target.1);
        Ok(Some(distance))
    }

    /// Full status snapshot for reporting surfaces.
    pub fn mission_status(&self) -> MissionStatus {
        let waypoints = self.vehicle.mission_items();
        let have_mission = !waypoints.is_empty();
        let progress = self.mission_progress();
        let finished = progress >= 1.0;
        let state = if !have_mission {
            MissionState::Idle
        } else if finished {
            MissionState::Completed
        } else {
            MissionState::Running
        };

        MissionStatus {
            have_mission,
            state,
            progress,
            finished,
            distance_to_next_m: self.distance_to_next_waypoint().ok().flatten(),
            current_waypoint: self.vehicle.current_sequence(),
            waypoints,
            mode: self.vehicle.mode(),
            armed: self.vehicle.armed(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimVehicle;
    use mission_core::spatial::meters_to_lat;

    const BASE_LAT: f64 = 33.6846;
    const BASE_LON: f64 = -117.8265;

    fn waypoints(n: u16) -> Vec<MissionItem> {
        (0..n)
            .map(|i| {
                MissionItem::waypoint(
                    i,
                    BASE_LAT + meters_to_lat(100.0 * (i + 1) as f64, BASE_LAT),
                    BASE_LON,
                    50.0,
                )
            })
            .collect()
    }

    fn control_with_mission(n: u16) -> MissionControl<SimVehicle> {
        let vehicle = SimVehicle::new();
        vehicle.set_home(BASE_LAT, BASE_LON);
        vehicle.set_position(BASE_LAT, BASE_LON, 0.0);
        let control = MissionControl::new(vehicle).unwrap();
        control.start_mission(&waypoints(n)).unwrap();
        control
    }

    #[test]
    fn start_mission_appends_rtl_sentinel_and_switches_to_auto() {
        let control = control_with_mission(3);
        let items = control.mission_items();
        assert_eq!(items.len(), 4);
        assert_eq!(items.iter().map(|i| i.seq).collect::<Vec<_>>(), [1, 2, 3, 4]);
        assert!(items.last().unwrap().is_return_to_launch());
        assert_eq!(control.vehicle().mode(), FlightMode::Auto);
    }

    #[test]
    fn start_mission_rejects_disallowed_commands() {
        let vehicle = SimVehicle::new();
        let control = MissionControl::new(vehicle).unwrap();

        let mut items = waypoints(2);
        items[1].command = NavCommand::Other(178);

        let err = control.start_mission(&items).unwrap_err();
        assert!(matches!(
            err,
            MissionError::CommandNotAllowed {
                command: NavCommand::Other(178),
                ..
            }
        ));
        // Nothing must reach the vehicle on a rejected mission
        assert!(control.mission_items().is_empty());
    }

    #[test]
    fn empty_mission_is_complete() {
        let control = MissionControl::new(SimVehicle::new()).unwrap();
        assert_eq!(control.mission_progress(), 1.0);
        assert!(control.is_mission_finished());
    }

    #[test]
    fn progress_tracks_current_item() {
        let control = control_with_mission(3);
        // 3 waypoints + sentinel = 4 items
        control.vehicle().set_armed(true);
        control.vehicle().set_current_sequence(1);
        assert!((control.mission_progress() - 0.25).abs() < 1e-9);
        assert!(!control.is_mission_finished());

        control.vehicle().set_current_sequence(4);
        assert_eq!(control.mission_progress(), 1.0);
        assert!(control.is_mission_finished());
    }

    #[test]
    fn disarmed_in_auto_at_first_item_counts_as_complete() {
        let control = control_with_mission(3);
        // The autopilot resets to item 1 and disarms after landing
        control.vehicle().set_armed(false);
        control.vehicle().set_current_sequence(1);
        assert_eq!(control.mission_progress(), 1.0);
        assert!(control.is_mission_finished());
    }

    #[test]
    fn no_distance_when_no_item_active() {
        let control = control_with_mission(2);
        assert_eq!(control.distance_to_next_waypoint().unwrap(), None);
    }

    #[test]
    fn distance_to_active_waypoint() {
        let control = control_with_mission(2);
        control.vehicle().set_armed(true);
        control.vehicle().set_current_sequence(1);

        // First waypoint is 100m north of the vehicle
        let distance = control.distance_to_next_waypoint().unwrap().unwrap();
        assert!((distance - 100.0).abs() < 1.0, "got {distance}");
    }

    #[test]
    fn rtl_sentinel_distance_resolves_to_home() {
        let control = control_with_mission(2);
        control.vehicle().set_armed(true);
        control.vehicle().set_current_sequence(3); // the sentinel
        control
            .vehicle()
            .set_position(BASE_LAT + meters_to_lat(200.0, BASE_LAT), BASE_LON, 50.0);

        let distance = control.distance_to_next_waypoint().unwrap().unwrap();
        assert!((distance - 200.0).abs() < 1.0, "got {distance}");
    }

    #[test]
    fn coordinate_less_item_reports_zero_distance() {
        let vehicle = SimVehicle::new();
        vehicle.set_position(BASE_LAT, BASE_LON, 0.0);
        let control = MissionControl::new(vehicle).unwrap();

        let mut item = MissionItem::waypoint(0, 0.0, 0.0, 0.0);
        item.command = NavCommand::LoiterTime;
        item.hold_s = 10.0;
        control.start_mission(&[item]).unwrap();
        control.vehicle().set_current_sequence(1);

        assert_eq!(control.distance_to_next_waypoint().unwrap(), Some(0.0));
    }

    #[test]
    fn distance_without_position_fix_is_an_error() {
        let vehicle = SimVehicle::new();
        vehicle.set_home(BASE_LAT, BASE_LON);
        let control = MissionControl::new(vehicle).unwrap();
        control.start_mission(&waypoints(1)).unwrap();
        control.vehicle().set_current_sequence(1);

        assert!(matches!(
            control.distance_to_next_waypoint(),
            Err(VehicleError::NoPosition)
        ));
    }

    #[test]
    fn clear_mission_empties_the_vehicle() {
        let control = control_with_mission(2);
        control.clear_mission().unwrap();
        assert!(control.mission_items().is_empty());
        assert_eq!(control.mission_status().state, MissionState::Idle);
    }

    #[test]
    fn status_reflects_running_mission() {
        let control = control_with_mission(2);
        control.vehicle().set_armed(true);
        control.vehicle().set_current_sequence(2);

        let status = control.mission_status();
        assert!(status.have_mission);
        assert_eq!(status.state, MissionState::Running);
        assert_eq!(status.current_waypoint, 2);
        assert_eq!(status.waypoints.len(), 3);
        assert!((status.progress - 2.0 / 3.0).abs() < 1e-9);
        assert!(!status.finished);
        assert!(status.armed);
        assert_eq!(status.mode, FlightMode::Auto);
        assert!(status.distance_to_next_m.is_some());
    }

    #[test]
    fn status_serializes_for_the_wire() {
        let control = control_with_mission(1);
        let json = serde_json::to_value(control.mission_status()).unwrap();
        assert_eq!(json["have_mission"], true);
        assert_eq!(json["state"], "running");
        assert!(json["waypoints"].as_array().unwrap().len() == 2);
    }
}
