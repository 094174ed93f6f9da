pub mod models;
pub mod rules;
pub mod spatial;

pub use models::{
    FlightMode, GlobalPosition, MissionItem, MissionState, MissionStatus, NavCommand,
};
pub use rules::command_allowed;
pub use spatial::haversine_distance;
