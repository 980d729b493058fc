//! Band rotation for the WSPR beacon
//!
//! Splits rotation into a pure policy and an orchestrating controller so
//! the selection logic is testable without any serial hardware:
//!
//! - [`RotationSchedule`]: time-of-day pools and the deterministic
//!   slot-to-band mapping (no I/O)
//! - [`RotationController`]: one sample → select → compare → configure
//!   cycle, producing a write-once [`RotationDecision`]
//! - [`DecisionJournal`]: append-only JSONL sink for those decisions

pub mod controller;
pub mod error;
pub mod journal;
pub mod policy;

pub use controller::{
    ControllerConfig, RotationAction, RotationController, RotationDecision, RotationOutcome,
};
pub use error::RotateError;
pub use journal::DecisionJournal;
pub use policy::{BandPool, RotationSchedule, Selection, SLOT_MINUTES};
