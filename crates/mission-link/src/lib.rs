//! Vehicle link and mission orchestration.
//!
//! The [`Vehicle`] trait is the seam between mission orchestration and the
//! autopilot: everything the orchestrator does goes through it. Two
//! implementations ship here: [`MavlinkVehicle`] for a real MAVLink link and
//! [`SimVehicle`] for tests and demos.

pub mod control;
pub mod error;
pub mod link;
pub mod sim;
pub mod vehicle;

pub use control::{MissionControl, MissionError};
pub use error::VehicleError;
pub use link::{LinkIds, MavlinkVehicle};
pub use sim::SimVehicle;
pub use vehicle::Vehicle;
