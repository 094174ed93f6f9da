//! Full mission lifecycle against the simulated vehicle.

use mission_core::models::{FlightMode, MissionItem, MissionState};
use mission_core::spatial::meters_to_lat;
use mission_link::{MissionControl, SimVehicle, Vehicle};

const HOME_LAT: f64 = 35.3606;
const HOME_LON: f64 = 138.7274;

#[test]
fn mission_runs_from_upload_to_completion() {
    let vehicle = SimVehicle::new();
    vehicle.set_home(HOME_LAT, HOME_LON);
    vehicle.set_position(HOME_LAT, HOME_LON, 0.0);
    vehicle.set_armed(true);

    let control = MissionControl::new(vehicle).unwrap();
    assert_eq!(control.mission_status().state, MissionState::Idle);

    let waypoints: Vec<MissionItem> = (0..3)
        .map(|i| {
            MissionItem::waypoint(
                i,
                HOME_LAT + meters_to_lat(150.0 * (i + 1) as f64, HOME_LAT),
                HOME_LON,
                40.0,
            )
        })
        .collect();

    control.start_mission(&waypoints).unwrap();
    assert_eq!(control.vehicle().mode(), FlightMode::Auto);

    // AUTO engaged while armed: the sim starts flying the first item
    assert_eq!(control.vehicle().current_sequence(), 1);
    let status = control.mission_status();
    assert_eq!(status.state, MissionState::Running);
    assert_eq!(status.waypoints.len(), 4);

    // Walk the vehicle through every waypoint
    let mut last_progress = status.progress;
    for expected in 2..=4u16 {
        control.vehicle().advance();
        assert_eq!(control.vehicle().current_sequence(), expected);
        let progress = control.mission_status().progress;
        assert!(progress > last_progress);
        last_progress = progress;
    }

    // At the RTL sentinel the mission reads complete
    assert!(control.is_mission_finished());
    assert_eq!(control.mission_status().state, MissionState::Completed);

    // Distance to the sentinel is the distance home
    control
        .vehicle()
        .set_position(HOME_LAT + meters_to_lat(300.0, HOME_LAT), HOME_LON, 40.0);
    let distance = control.distance_to_next_waypoint().unwrap().unwrap();
    assert!((distance - 300.0).abs() < 2.0, "got {distance}");

    // Landed and disarmed, autopilot resets the current item
    control.vehicle().set_armed(false);
    control.vehicle().set_current_sequence(1);
    assert!(control.is_mission_finished());

    control.clear_mission().unwrap();
    assert_eq!(control.mission_status().state, MissionState::Idle);
}
