//! Server configuration from environment.

use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    /// `mavlink` crate connection string, or "sim" for the built-in simulator
    pub mavlink_url: String,
    pub target_system: u8,
    pub target_component: u8,
    /// Seconds to wait for the autopilot's first heartbeat
    pub heartbeat_timeout_secs: u64,
    /// Interval between status snapshots pushed to WebSocket clients
    pub status_interval_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            server_port: env::var("MISSION_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3000),
            mavlink_url: env::var("MAVLINK_URL")
                .unwrap_or_else(|_| "udpin:0.0.0.0:14550".to_string()),
            target_system: env::var("MAVLINK_TARGET_SYSTEM")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1),
            target_component: env::var("MAVLINK_TARGET_COMPONENT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1),
            heartbeat_timeout_secs: env::var("MAVLINK_HEARTBEAT_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
            status_interval_secs: env::var("MISSION_STATUS_INTERVAL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1),
        }
    }
}
