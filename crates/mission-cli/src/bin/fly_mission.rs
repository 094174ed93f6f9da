//! CLI tool to upload a waypoint file and fly it.
//!
//! Connects straight to the autopilot over MAVLink, starts the mission and
//! prints progress until the vehicle reports completion.

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use clap::Parser;

use mission_cli::waypoints::load_waypoints;
use mission_link::{LinkIds, MavlinkVehicle, MissionControl, Vehicle};

/// Upload a waypoint mission and watch it fly
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// MAVLink connection string (e.g. udpin:0.0.0.0:14550, tcpout:host:5760)
    #[arg(long, default_value = "udpin:0.0.0.0:14550")]
    url: String,

    /// Waypoint file (JSON array of {lat, lon, alt_m})
    #[arg(long)]
    file: PathBuf,

    /// MAVLink system id of the autopilot
    #[arg(long, default_value_t = 1)]
    target_system: u8,

    /// Seconds to wait for the first heartbeat
    #[arg(long, default_value_t = 30)]
    heartbeat_timeout: u64,

    /// Progress poll interval in seconds
    #[arg(long, default_value_t = 2)]
    poll_interval: u64,

    /// Upload and start, then exit without watching progress
    #[arg(long, default_value_t = false)]
    no_watch: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let waypoints = load_waypoints(&args.file)?;
    println!("Loaded {} waypoints from {}", waypoints.len(), args.file.display());

    println!("Connecting to {}...", args.url);
    let ids = LinkIds {
        target_system: args.target_system,
        ..LinkIds::default()
    };
    let vehicle = MavlinkVehicle::connect(&args.url, ids)?;

    println!("Waiting for heartbeat...");
    vehicle.wait_heartbeat(Duration::from_secs(args.heartbeat_timeout))?;

    let control = MissionControl::new(vehicle)?;
    control.start_mission(&waypoints)?;
    println!("Mission started: {} waypoints + RTL", waypoints.len());

    if args.no_watch {
        return Ok(());
    }

    loop {
        thread::sleep(Duration::from_secs(args.poll_interval.max(1)));

        let status = control.mission_status();
        let distance = status
            .distance_to_next_m
            .map(|d| format!("{:.0}m", d))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "[{}] waypoint {}/{} progress {:>5.1}% distance {}",
            status.mode,
            status.current_waypoint,
            status.waypoints.len(),
            status.progress * 100.0,
            distance
        );

        if status.finished {
            println!("\nMission complete.");
            break;
        }
    }

    Ok(())
}
