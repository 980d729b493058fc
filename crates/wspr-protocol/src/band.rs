//! WSPR band plan
//!
//! Maps band names to the canonical WSPR carrier frequency for each band.
//! The table is fixed at compile time; frequencies are the dial+offset
//! carrier values the beacon firmware expects, in Hz.

use crate::error::ValidationError;

/// Allowed deviation for an externally supplied frequency override,
/// as a fraction of the canonical value. Anything further out is
/// rejected rather than transmitted out of band.
const FREQUENCY_TOLERANCE: f64 = 0.005;

/// An amateur band supported by the beacon, lowest frequency first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Band {
    /// 160 meters
    M160,
    /// 80 meters
    M80,
    /// 40 meters
    M40,
    /// 30 meters
    M30,
    /// 20 meters
    M20,
    /// 17 meters
    M17,
    /// 15 meters
    M15,
    /// 12 meters
    M12,
    /// 10 meters
    M10,
    /// 6 meters
    M6,
}

/// All supported bands in ascending frequency order
pub const ALL_BANDS: [Band; 10] = [
    Band::M160,
    Band::M80,
    Band::M40,
    Band::M30,
    Band::M20,
    Band::M17,
    Band::M15,
    Band::M12,
    Band::M10,
    Band::M6,
];

impl Band {
    /// Canonical WSPR carrier frequency for this band, in Hz
    pub fn frequency_hz(&self) -> u64 {
        match self {
            Band::M160 => 1_838_100,
            Band::M80 => 3_570_100,
            Band::M40 => 7_040_100,
            Band::M30 => 10_140_200,
            Band::M20 => 14_097_100,
            Band::M17 => 18_106_100,
            Band::M15 => 21_096_100,
            Band::M12 => 24_926_100,
            Band::M10 => 28_126_100,
            Band::M6 => 50_294_500,
        }
    }

    /// Conventional band name, e.g. "40m"
    pub fn name(&self) -> &'static str {
        match self {
            Band::M160 => "160m",
            Band::M80 => "80m",
            Band::M40 => "40m",
            Band::M30 => "30m",
            Band::M20 => "20m",
            Band::M17 => "17m",
            Band::M15 => "15m",
            Band::M12 => "12m",
            Band::M10 => "10m",
            Band::M6 => "6m",
        }
    }

    /// Look up a band by its conventional name
    pub fn from_name(name: &str) -> Result<Band, ValidationError> {
        ALL_BANDS
            .iter()
            .copied()
            .find(|b| b.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| ValidationError::UnknownBand(name.to_string()))
    }

    /// Reverse lookup: which band does an observed frequency belong to?
    ///
    /// Tolerant to the same deviation allowed for overrides, so a device
    /// reporting a slightly offset carrier still maps to its band.
    pub fn from_frequency_hz(hz: u64) -> Option<Band> {
        ALL_BANDS
            .iter()
            .copied()
            .find(|b| within_tolerance(b.frequency_hz(), hz))
    }

    /// Validate an externally supplied frequency override for this band
    ///
    /// Returns the override unchanged when it is within ±0.5% of the
    /// canonical carrier, otherwise `InvalidFrequency`.
    pub fn validate_override(&self, hz: u64) -> Result<u64, ValidationError> {
        if within_tolerance(self.frequency_hz(), hz) {
            Ok(hz)
        } else {
            Err(ValidationError::InvalidFrequency {
                band: self.name(),
                requested_hz: hz,
                canonical_hz: self.frequency_hz(),
            })
        }
    }
}

impl std::fmt::Display for Band {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

fn within_tolerance(canonical_hz: u64, hz: u64) -> bool {
    let delta = canonical_hz.abs_diff(hz) as f64;
    delta <= canonical_hz as f64 * FREQUENCY_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frequencies_strictly_increase_with_band_order() {
        for pair in ALL_BANDS.windows(2) {
            assert!(
                pair[0].frequency_hz() < pair[1].frequency_hz(),
                "{} >= {}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn lookup_by_name() {
        assert_eq!(Band::from_name("40m").unwrap(), Band::M40);
        assert_eq!(Band::from_name("20M").unwrap(), Band::M20);
        assert_eq!(Band::M40.frequency_hz(), 7_040_100);
    }

    #[test]
    fn unknown_band_rejected() {
        let err = Band::from_name("11m").unwrap_err();
        assert_eq!(err, ValidationError::UnknownBand("11m".into()));
    }

    #[test]
    fn reverse_lookup_tolerates_small_offset() {
        assert_eq!(Band::from_frequency_hz(7_040_100), Some(Band::M40));
        // 200 Hz off the canonical carrier is still 40m
        assert_eq!(Band::from_frequency_hz(7_040_300), Some(Band::M40));
        assert_eq!(Band::from_frequency_hz(123), None);
    }

    #[test]
    fn override_within_half_percent_accepted() {
        let canonical = Band::M20.frequency_hz();
        assert_eq!(
            Band::M20.validate_override(canonical + 1_000).unwrap(),
            canonical + 1_000
        );
    }

    #[test]
    fn override_out_of_band_rejected() {
        // 1% away from the 20m carrier
        let hz = 14_097_100 + 140_971;
        let err = Band::M20.validate_override(hz).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidFrequency { .. }));
    }
}
