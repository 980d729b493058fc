//! Simulation layer for testing the beacon controller without hardware
//!
//! [`VirtualBeacon`] models the device's serial behavior (accepting
//! `CONFIG:` commands, emitting `OK` and `TX:` lines); [`run_beacon_task`]
//! drives one over any async stream, typically one end of
//! `tokio::io::duplex` in an integration test.

pub mod beacon;
pub mod beacon_task;

pub use beacon::{VirtualBeacon, VirtualBeaconConfig};
pub use beacon_task::{run_beacon_task, BeaconTaskConfig};
