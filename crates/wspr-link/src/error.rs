//! Error types for the serial link

use thiserror::Error;

/// Errors that can occur while talking to the beacon
#[derive(Debug, Error)]
pub enum LinkError {
    /// Port does not exist or is exclusively held by another process
    ///
    /// This is an expected outcome under contention (e.g. a manual monitor
    /// racing the scheduled rotation); callers surface it and let the next
    /// scheduled invocation retry.
    #[error("serial port unavailable: {port}: {reason}")]
    PortUnavailable { port: String, reason: String },

    /// Refused to send a GPS-grid configuration without explicit
    /// acknowledgment that a positioning antenna is attached
    ///
    /// Without the antenna the device persists the config and loops
    /// boot → fix attempt → fail → reboot until physically recovered.
    #[error(
        "grid 'GPS' requires confirming a GPS antenna is attached; \
         refusing to send a configuration that could wedge the device"
    )]
    GpsSentinelRequiresConfirmation,

    /// Port enumeration failed (diagnostics only)
    #[error("failed to enumerate serial ports: {0}")]
    Enumeration(String),

    /// I/O error on an open port
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
