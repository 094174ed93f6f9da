//! CLI tool to query a running mission server.

use clap::Parser;
use serde_json::Value;

/// Print the mission status from a mission server
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Mission server URL
    #[arg(long, default_value = "http://localhost:3000")]
    url: String,

    /// Print the raw JSON instead of a summary
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let status: Value = reqwest::blocking::get(format!("{}/v1/mission/status", args.url))?
        .error_for_status()?
        .json()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    if status["have_mission"] != Value::Bool(true) {
        println!("No mission loaded.");
        return Ok(());
    }

    let distance = status["distance_to_next_m"]
        .as_f64()
        .map(|d| format!("{:.0}m", d))
        .unwrap_or_else(|| "-".to_string());
    println!(
        "{} | waypoint {}/{} | progress {:.1}% | distance to next {} | mode {} | {}",
        status["state"].as_str().unwrap_or("?"),
        status["current_waypoint"],
        status["waypoints"].as_array().map(|w| w.len()).unwrap_or(0),
        status["progress"].as_f64().unwrap_or(0.0) * 100.0,
        distance,
        status["mode"].as_str().unwrap_or("?"),
        if status["armed"] == Value::Bool(true) { "armed" } else { "disarmed" },
    );

    Ok(())
}
