//! Waypoint file loading.
//!
//! A mission file is a JSON array of waypoints:
//!
//! ```json
//! [
//!   { "lat": 35.3606, "lon": 138.7274, "alt_m": 60.0 },
//!   { "lat": 35.3616, "lon": 138.7284, "alt_m": 60.0, "hold_s": 5.0 }
//! ]
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use mission_core::models::{MissionItem, NavCommand};

#[derive(Debug, Deserialize)]
struct WaypointSpec {
    lat: f64,
    lon: f64,
    #[serde(alias = "alt")]
    alt_m: f64,
    #[serde(default)]
    command: Option<NavCommand>,
    #[serde(default)]
    hold_s: f32,
    #[serde(default)]
    accept_radius_m: f32,
}

/// Load a mission file into mission items numbered from 1.
pub fn load_waypoints(path: &Path) -> Result<Vec<MissionItem>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading waypoint file {}", path.display()))?;
    let specs: Vec<WaypointSpec> = serde_json::from_str(&text)
        .with_context(|| format!("parsing waypoint file {}", path.display()))?;

    Ok(specs
        .into_iter()
        .enumerate()
        .map(|(i, spec)| MissionItem {
            seq: i as u16 + 1,
            command: spec.command.unwrap_or(NavCommand::Waypoint),
            lat: spec.lat,
            lon: spec.lon,
            alt_m: spec.alt_m,
            hold_s: spec.hold_s,
            accept_radius_m: spec.accept_radius_m,
            autocontinue: true,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_waypoint_file() {
        let path = std::env::temp_dir().join("mission-cli-wp-test.json");
        std::fs::write(
            &path,
            r#"[
                { "lat": 35.3606, "lon": 138.7274, "alt": 60.0 },
                { "lat": 35.3616, "lon": 138.7284, "alt_m": 70.0, "hold_s": 5.0 }
            ]"#,
        )
        .unwrap();

        let items = load_waypoints(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].seq, 1);
        assert_eq!(items[0].command, NavCommand::Waypoint);
        assert_eq!(items[0].alt_m, 60.0);
        assert_eq!(items[1].hold_s, 5.0);
    }

    #[test]
    fn rejects_malformed_file() {
        let path = std::env::temp_dir().join("mission-cli-bad-test.json");
        std::fs::write(&path, "not json").unwrap();
        let result = load_waypoints(&path);
        std::fs::remove_file(&path).ok();
        assert!(result.is_err());
    }
}
