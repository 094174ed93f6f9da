//! Shared helpers for the mission CLI binaries.

pub mod waypoints;
