//! Band rotation policy
//!
//! Pure time-to-band mapping, no I/O. The UTC day is partitioned into
//! pools of candidate bands reflecting expected HF propagation (low bands
//! overnight, high bands around midday), and a deterministic index picks
//! one band per twenty-minute slot.
//!
//! The index is `(7*day_of_year + 3*hour + slot) mod pool_len`, which gives:
//!
//! - the same band for any two times in the same slot, so replays and
//!   overlapping scheduler invocations agree
//! - a different band on consecutive slots whenever the pool has more than
//!   one member (the slot coefficient is 1)
//! - a day-to-day shift of the rotation order: 7 is coprime to every pool
//!   size in use, so over a year each pool member appears in every
//!   time-of-day bucket

use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};
use wspr_protocol::Band;

use crate::error::RotateError;

/// Width of one rotation slot in minutes
pub const SLOT_MINUTES: u32 = 20;

/// A contiguous range of UTC hours mapped to an ordered set of candidate
/// bands
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandPool {
    /// Pool label, recorded in decision records (e.g. "night")
    pub name: String,
    /// First hour covered, inclusive, 0-23
    pub start_hour: u32,
    /// First hour no longer covered; may be numerically smaller than
    /// `start_hour`, in which case the range wraps midnight
    pub end_hour: u32,
    /// Candidate bands in rotation order
    pub bands: Vec<Band>,
}

impl BandPool {
    fn contains(&self, hour: u32) -> bool {
        if self.start_hour < self.end_hour {
            (self.start_hour..self.end_hour).contains(&hour)
        } else {
            hour >= self.start_hour || hour < self.end_hour
        }
    }
}

/// The band chosen for a slot, with the pool that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Target band
    pub band: Band,
    /// Name of the pool the band was drawn from
    pub pool: String,
}

/// A full-day rotation schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotationSchedule {
    pools: Vec<BandPool>,
}

impl RotationSchedule {
    /// Build a schedule from explicit pools
    pub fn new(pools: Vec<BandPool>) -> Self {
        Self { pools }
    }

    /// Select the band for the slot containing `at`
    pub fn select_band(&self, at: DateTime<Utc>) -> Result<Selection, RotateError> {
        let hour = at.hour();
        let pool = self
            .pools
            .iter()
            .find(|p| p.contains(hour))
            .filter(|p| !p.bands.is_empty())
            .ok_or(RotateError::EmptyRotationPool { hour })?;

        let slot = at.minute() / SLOT_MINUTES;
        let index = slot_index(at.ordinal(), hour, slot, pool.bands.len());

        Ok(Selection {
            band: pool.bands[index],
            pool: pool.name.clone(),
        })
    }

    /// The configured pools
    pub fn pools(&self) -> &[BandPool] {
        &self.pools
    }
}

/// Deterministic rotation index for a (day, hour, slot) triple
fn slot_index(day_of_year: u32, hour: u32, slot: u32, pool_len: usize) -> usize {
    (7 * day_of_year + 3 * hour + slot) as usize % pool_len
}

impl Default for RotationSchedule {
    /// Default partition, tuned for a West Coast station:
    /// low bands through the dark hours, high bands around local midday,
    /// mid bands across the grey-line transitions.
    fn default() -> Self {
        Self::new(vec![
            BandPool {
                name: "night".to_string(),
                start_hour: 5,
                end_hour: 14,
                bands: vec![Band::M160, Band::M80, Band::M40],
            },
            BandPool {
                name: "dawn".to_string(),
                start_hour: 14,
                end_hour: 17,
                bands: vec![Band::M80, Band::M40, Band::M30],
            },
            BandPool {
                name: "day".to_string(),
                start_hour: 17,
                end_hour: 1,
                bands: vec![Band::M20, Band::M17, Band::M15, Band::M12, Band::M10],
            },
            BandPool {
                name: "dusk".to_string(),
                start_hour: 1,
                end_hour: 5,
                bands: vec![Band::M40, Band::M30, Band::M20],
            },
        ])
    }
}
