//! Beacon configuration parameters
//!
//! One `BeaconParameters` value describes a single configuration command:
//! callsign, grid locator, power code and target carrier frequency. All
//! fields are validated at construction so a value that exists is safe to
//! encode onto the wire.

use crate::band::Band;
use crate::error::ValidationError;

/// Maximum callsign length the device accepts
const MAX_CALLSIGN_LEN: usize = 10;

/// The device's power table: dBm code to human-readable output power.
///
/// The beacon encodes power as one of these fixed dBm steps; anything
/// else is rejected by the firmware.
pub const POWER_TABLE: [(u8, &str); 19] = [
    (0, "1 mW"),
    (3, "2 mW"),
    (7, "5 mW"),
    (10, "10 mW"),
    (13, "20 mW"),
    (17, "50 mW"),
    (20, "100 mW"),
    (23, "200 mW"),
    (27, "500 mW"),
    (30, "1 W"),
    (33, "2 W"),
    (37, "5 W"),
    (40, "10 W"),
    (43, "20 W"),
    (47, "50 W"),
    (50, "100 W"),
    (53, "200 W"),
    (57, "500 W"),
    (60, "1 kW"),
];

/// Human-readable wattage for a power code, if the code is valid
pub fn power_label(code: u8) -> Option<&'static str> {
    POWER_TABLE
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, label)| *label)
}

/// The beacon's reported position
///
/// `DeviceGps` tells the device to compute its own locator from GPS.
/// That setting is only safe when a positioning antenna is attached;
/// see the session-level safety gate before sending it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GridLocator {
    /// Explicit 4- or 6-character Maidenhead locator
    Locator(String),
    /// Device computes the locator from its own GPS fix
    DeviceGps,
}

impl GridLocator {
    /// Parse a grid field as entered by an operator
    ///
    /// The literal `GPS` (any case) selects the device-computed sentinel;
    /// anything else must be a valid Maidenhead locator.
    pub fn parse(s: &str) -> Result<GridLocator, ValidationError> {
        if s.eq_ignore_ascii_case("GPS") {
            return Ok(GridLocator::DeviceGps);
        }
        validate_locator(s)?;
        Ok(GridLocator::Locator(s.to_ascii_uppercase()))
    }

    /// The grid field as it appears on the wire
    pub fn as_field(&self) -> &str {
        match self {
            GridLocator::Locator(s) => s,
            GridLocator::DeviceGps => "GPS",
        }
    }

    /// True for the device-computed sentinel
    pub fn is_device_gps(&self) -> bool {
        matches!(self, GridLocator::DeviceGps)
    }
}

impl std::fmt::Display for GridLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_field())
    }
}

fn validate_locator(s: &str) -> Result<(), ValidationError> {
    let bytes = s.as_bytes();
    if bytes.len() != 4 && bytes.len() != 6 {
        return Err(ValidationError::InvalidGrid(s.to_string()));
    }
    let field_ok = bytes[..2]
        .iter()
        .all(|b| b.to_ascii_uppercase().is_ascii_uppercase() && b.to_ascii_uppercase() <= b'R');
    let square_ok = bytes[2..4].iter().all(|b| b.is_ascii_digit());
    let subsquare_ok = bytes[4..]
        .iter()
        .all(|b| b.to_ascii_uppercase().is_ascii_uppercase() && b.to_ascii_uppercase() <= b'X');
    if field_ok && square_ok && subsquare_ok {
        Ok(())
    } else {
        Err(ValidationError::InvalidGrid(s.to_string()))
    }
}

fn validate_callsign(s: &str) -> Result<(), ValidationError> {
    if s.is_empty()
        || s.len() > MAX_CALLSIGN_LEN
        || !s.chars().all(|c| c.is_ascii_alphanumeric() || c == '/')
    {
        return Err(ValidationError::InvalidCallsign(s.to_string()));
    }
    Ok(())
}

/// Validated parameters for one configuration command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeaconParameters {
    /// Station callsign, uppercased
    pub callsign: String,
    /// Reported position, explicit or device-computed
    pub grid: GridLocator,
    /// Power code in the device's dBm encoding
    pub power_code: u8,
    /// Target carrier frequency in Hz
    pub target_frequency_hz: u64,
}

impl BeaconParameters {
    /// Build parameters targeting a band's canonical frequency
    pub fn for_band(
        callsign: &str,
        grid: GridLocator,
        power_code: u8,
        band: Band,
    ) -> Result<Self, ValidationError> {
        Self::with_frequency(callsign, grid, power_code, band, band.frequency_hz())
    }

    /// Build parameters with an explicit frequency override
    ///
    /// The override must fall within the band table's tolerance.
    pub fn with_frequency(
        callsign: &str,
        grid: GridLocator,
        power_code: u8,
        band: Band,
        frequency_hz: u64,
    ) -> Result<Self, ValidationError> {
        validate_callsign(callsign)?;
        if power_label(power_code).is_none() {
            return Err(ValidationError::InvalidPower(power_code));
        }
        let target_frequency_hz = band.validate_override(frequency_hz)?;
        Ok(Self {
            callsign: callsign.to_ascii_uppercase(),
            grid,
            power_code,
            target_frequency_hz,
        })
    }
}
