//! WSPR Beacon Protocol Library
//!
//! This crate provides the pure, I/O-free half of the beacon controller:
//!
//! - **Band plan**: the fixed mapping from band names to WSPR carrier
//!   frequencies, with tolerance-checked override validation
//! - **Parameters**: validated callsign/grid/power/frequency bundles for a
//!   single configuration command
//! - **Wire codec**: a streaming parser for the device's newline-terminated
//!   status output and the encoder for its `CONFIG:` command line
//!
//! # Example
//!
//! ```rust
//! use wspr_protocol::{Band, LineCodec, StatusLine};
//!
//! let mut codec = LineCodec::new();
//! codec.push_bytes(b"TX:AK6MJ CM98 23 7040100 DONE\r\n");
//!
//! if let Some(StatusLine::TransmitComplete(report)) = codec.next_line() {
//!     assert_eq!(Band::from_frequency_hz(report.frequency_hz), Some(Band::M40));
//! }
//! ```

pub mod band;
pub mod codec;
pub mod error;
pub mod params;

pub use band::{Band, ALL_BANDS};
pub use codec::{decode_config, encode_config, ConfigCommand, LineCodec, StatusLine, TransmitReport};
pub use error::{ParseError, ValidationError};
pub use params::{power_label, BeaconParameters, GridLocator, POWER_TABLE};
