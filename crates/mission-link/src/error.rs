//! Error types for the vehicle link.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VehicleError {
    #[error("vehicle link I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to write to vehicle link: {0}")]
    Write(#[from] mavlink::error::MessageWriteError),

    #[error("mission transfer timed out waiting for {0}")]
    Timeout(&'static str),

    #[error("mission rejected by vehicle: {0}")]
    Rejected(String),

    #[error("command id {0} cannot be encoded for upload")]
    UnsupportedCommand(u16),

    #[error("no heartbeat received from vehicle")]
    NoHeartbeat,

    #[error("vehicle has no position fix")]
    NoPosition,

    #[error("vehicle has not reported a home position")]
    NoHome,
}
