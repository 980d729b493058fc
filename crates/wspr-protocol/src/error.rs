//! Error types for beacon protocol parsing and validation

use thiserror::Error;

/// Errors that can occur while parsing device output
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Line does not match any known status format
    #[error("unrecognized line: {0}")]
    UnrecognizedLine(String),

    /// Status line has the right marker but malformed fields
    #[error("malformed status line: {0}")]
    MalformedStatus(String),

    /// Invalid frequency field
    #[error("invalid frequency: {0}")]
    InvalidFrequency(String),

    /// Invalid power field
    #[error("invalid power code: {0}")]
    InvalidPower(String),
}

/// Errors raised when validating beacon configuration input
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Band name is not in the supported set
    #[error("unknown band: {0}")]
    UnknownBand(String),

    /// Frequency override falls outside the allowed tolerance for the band
    #[error("invalid frequency {requested_hz} Hz for {band}: canonical is {canonical_hz} Hz")]
    InvalidFrequency {
        band: &'static str,
        requested_hz: u64,
        canonical_hz: u64,
    },

    /// Callsign fails format constraints
    #[error("invalid callsign: {0:?}")]
    InvalidCallsign(String),

    /// Grid locator fails format constraints
    #[error("invalid grid locator: {0:?}")]
    InvalidGrid(String),

    /// Power code is not in the device's power table
    #[error("invalid power code {0} dBm (not in device power table)")]
    InvalidPower(u8),
}
