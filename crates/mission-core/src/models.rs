//! Core data models for waypoint missions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Navigation command types understood by the mission layer.
///
/// The numeric values are MAVLink MAV_CMD identifiers. Commands read back
/// from a vehicle that are not in this list are preserved as `Other` so a
/// downloaded mission round-trips without loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavCommand {
    Waypoint,
    Takeoff,
    Land,
    ReturnToLaunch,
    LoiterTime,
    LoiterUnlimited,
    Other(u16),
}

impl NavCommand {
    /// The MAVLink MAV_CMD id for this command.
    pub fn mav_cmd(&self) -> u16 {
        match self {
            NavCommand::Waypoint => 16,
            NavCommand::LoiterUnlimited => 17,
            NavCommand::LoiterTime => 19,
            NavCommand::ReturnToLaunch => 20,
            NavCommand::Land => 21,
            NavCommand::Takeoff => 22,
            NavCommand::Other(id) => *id,
        }
    }

    /// Map a MAVLink MAV_CMD id back to a command.
    pub fn from_mav_cmd(id: u16) -> Self {
        match id {
            16 => NavCommand::Waypoint,
            17 => NavCommand::LoiterUnlimited,
            19 => NavCommand::LoiterTime,
            20 => NavCommand::ReturnToLaunch,
            21 => NavCommand::Land,
            22 => NavCommand::Takeoff,
            other => NavCommand::Other(other),
        }
    }
}

/// A single mission item (waypoint) in an uploaded command sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionItem {
    /// Mission slot number. Autopilots reserve slot 0 for the home location,
    /// so items in an uploaded mission are numbered contiguously from 1.
    pub seq: u16,
    pub command: NavCommand,
    pub lat: f64,
    pub lon: f64,
    /// Altitude in meters, relative to home
    pub alt_m: f64,
    /// Hold time at the waypoint in seconds (param1 for NAV_WAYPOINT)
    #[serde(default)]
    pub hold_s: f32,
    /// Acceptance radius in meters (param2 for NAV_WAYPOINT)
    #[serde(default)]
    pub accept_radius_m: f32,
    /// Whether the autopilot continues to the next item automatically
    #[serde(default = "default_autocontinue")]
    pub autocontinue: bool,
}

fn default_autocontinue() -> bool {
    true
}

impl MissionItem {
    /// Create a plain waypoint item.
    pub fn waypoint(seq: u16, lat: f64, lon: f64, alt_m: f64) -> Self {
        Self {
            seq,
            command: NavCommand::Waypoint,
            lat,
            lon,
            alt_m,
            hold_s: 0.0,
            accept_radius_m: 0.0,
            autocontinue: true,
        }
    }

    /// Create a return-to-launch item (carries no coordinates).
    pub fn return_to_launch(seq: u16) -> Self {
        Self {
            seq,
            command: NavCommand::ReturnToLaunch,
            lat: 0.0,
            lon: 0.0,
            alt_m: 0.0,
            hold_s: 0.0,
            accept_radius_m: 0.0,
            autocontinue: true,
        }
    }

    pub fn is_return_to_launch(&self) -> bool {
        self.command == NavCommand::ReturnToLaunch
    }

    /// Whether the item carries a usable target coordinate. Some commands
    /// legitimately leave lat/lon/alt at zero.
    pub fn has_coordinates(&self) -> bool {
        self.lat != 0.0 || self.lon != 0.0 || self.alt_m != 0.0
    }
}

/// A position in the global frame with altitude relative to home.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlobalPosition {
    pub lat: f64,
    pub lon: f64,
    pub alt_m: f64,
}

impl GlobalPosition {
    pub fn new(lat: f64, lon: f64, alt_m: f64) -> Self {
        Self { lat, lon, alt_m }
    }
}

/// Flight modes the mission layer switches between or reports.
///
/// Values are ArduPilot copter custom mode numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlightMode {
    Stabilize,
    Auto,
    Guided,
    Loiter,
    Rtl,
    Land,
    Other(u32),
}

impl FlightMode {
    pub fn custom_mode(&self) -> u32 {
        match self {
            FlightMode::Stabilize => 0,
            FlightMode::Auto => 3,
            FlightMode::Guided => 4,
            FlightMode::Loiter => 5,
            FlightMode::Rtl => 6,
            FlightMode::Land => 9,
            FlightMode::Other(id) => *id,
        }
    }

    pub fn from_custom_mode(id: u32) -> Self {
        match id {
            0 => FlightMode::Stabilize,
            3 => FlightMode::Auto,
            4 => FlightMode::Guided,
            5 => FlightMode::Loiter,
            6 => FlightMode::Rtl,
            9 => FlightMode::Land,
            other => FlightMode::Other(other),
        }
    }
}

impl std::fmt::Display for FlightMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlightMode::Stabilize => write!(f, "STABILIZE"),
            FlightMode::Auto => write!(f, "AUTO"),
            FlightMode::Guided => write!(f, "GUIDED"),
            FlightMode::Loiter => write!(f, "LOITER"),
            FlightMode::Rtl => write!(f, "RTL"),
            FlightMode::Land => write!(f, "LAND"),
            FlightMode::Other(id) => write!(f, "MODE({})", id),
        }
    }
}

/// Mission execution state derived from progress and vehicle mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissionState {
    /// No mission loaded
    #[default]
    Idle,
    /// Mission uploaded and executing
    Running,
    /// All waypoints reached
    Completed,
}

/// Snapshot of mission execution, serialized for status consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionStatus {
    pub have_mission: bool,
    pub state: MissionState,
    /// Fraction of the mission completed, 0.0..=1.0
    pub progress: f64,
    pub finished: bool,
    /// Meters to the waypoint currently being flown to, if one is active
    /// and the vehicle has a position fix
    pub distance_to_next_m: Option<f64>,
    /// Sequence number of the item the autopilot is flying to (0 = none)
    pub current_waypoint: u16,
    pub waypoints: Vec<MissionItem>,
    pub mode: FlightMode,
    pub armed: bool,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nav_command_mav_cmd_round_trip() {
        for cmd in [
            NavCommand::Waypoint,
            NavCommand::Takeoff,
            NavCommand::Land,
            NavCommand::ReturnToLaunch,
            NavCommand::LoiterTime,
            NavCommand::LoiterUnlimited,
        ] {
            assert_eq!(NavCommand::from_mav_cmd(cmd.mav_cmd()), cmd);
        }
        assert_eq!(NavCommand::from_mav_cmd(177), NavCommand::Other(177));
    }

    #[test]
    fn flight_mode_round_trip() {
        assert_eq!(FlightMode::from_custom_mode(3), FlightMode::Auto);
        assert_eq!(FlightMode::Auto.custom_mode(), 3);
        assert_eq!(FlightMode::from_custom_mode(42), FlightMode::Other(42));
        assert_eq!(format!("{}", FlightMode::Auto), "AUTO");
    }

    #[test]
    fn rtl_item_has_no_coordinates() {
        let rtl = MissionItem::return_to_launch(3);
        assert!(rtl.is_return_to_launch());
        assert!(!rtl.has_coordinates());
        assert!(MissionItem::waypoint(0, 33.6, -117.8, 50.0).has_coordinates());
    }

    #[test]
    fn mission_item_deserializes_with_defaults() {
        let item: MissionItem =
            serde_json::from_str(r#"{"seq":0,"command":"waypoint","lat":1.0,"lon":2.0,"alt_m":30.0}"#)
                .unwrap();
        assert!(item.autocontinue);
        assert_eq!(item.hold_s, 0.0);
    }
}
