//! Command allow-list for uploaded missions.
//!
//! The vehicle will execute whatever it is given; this is the one validation
//! gate between an operator request and the autopilot.

use crate::models::{MissionItem, NavCommand};

/// Navigation commands that may appear in an uploaded mission.
pub const ALLOWED_COMMANDS: [NavCommand; 6] = [
    NavCommand::Waypoint,
    NavCommand::Takeoff,
    NavCommand::Land,
    NavCommand::ReturnToLaunch,
    NavCommand::LoiterTime,
    NavCommand::LoiterUnlimited,
];

/// Check whether a single command is on the allow-list.
pub fn command_allowed(command: NavCommand) -> bool {
    ALLOWED_COMMANDS.contains(&command)
}

/// Find the first item in a mission whose command is not allowed.
pub fn first_disallowed(items: &[MissionItem]) -> Option<&MissionItem> {
    items.iter().find(|item| !command_allowed(item.command))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_navigation_commands() {
        assert!(command_allowed(NavCommand::Waypoint));
        assert!(command_allowed(NavCommand::ReturnToLaunch));
        assert!(command_allowed(NavCommand::LoiterTime));
    }

    #[test]
    fn rejects_unknown_commands() {
        // MAV_CMD_DO_FLIGHTTERMINATION and friends must never pass
        assert!(!command_allowed(NavCommand::Other(185)));
        assert!(!command_allowed(NavCommand::Other(0)));
    }

    #[test]
    fn finds_first_disallowed_item() {
        let mut items = vec![
            MissionItem::waypoint(0, 33.0, -117.0, 50.0),
            MissionItem::waypoint(1, 33.1, -117.1, 50.0),
        ];
        assert!(first_disallowed(&items).is_none());

        items[1].command = NavCommand::Other(178);
        let bad = first_disallowed(&items).expect("disallowed item");
        assert_eq!(bad.seq, 1);
    }
}
