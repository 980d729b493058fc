//! Error types for band rotation

use thiserror::Error;

/// Errors that can occur while selecting a rotation target
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RotateError {
    /// No bands are configured for the given UTC hour
    ///
    /// A configuration error: selecting silently from some default could
    /// keep the beacon on an unintended band indefinitely, so it fails
    /// instead.
    #[error("rotation pool for hour {hour:02} UTC is empty")]
    EmptyRotationPool { hour: u32 },
}
