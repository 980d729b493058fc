//! Operator settings
//!
//! Station defaults merged under CLI overrides. The file lives in the XDG
//! config directory and is plain JSON so it can be edited by hand or
//! emitted with `wsprctl dump-config`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use wspr_rotate::BandPool;

/// Persisted station defaults
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Station callsign
    pub callsign: String,
    /// Grid field: a Maidenhead locator, or `GPS` for device-computed
    pub grid: String,
    /// Power code in dBm
    pub power: u8,
    /// Serial device path
    pub device: String,
    /// Baud rate
    #[serde(default = "default_baud")]
    pub baud_rate: u32,
    /// Decision journal path; defaults next to the settings file
    #[serde(default)]
    pub journal_path: Option<PathBuf>,
    /// Custom rotation pools; the built-in schedule applies when absent
    #[serde(default)]
    pub rotation_pools: Option<Vec<BandPool>>,
}

fn default_baud() -> u32 {
    9600
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            callsign: "AK6MJ".to_string(),
            grid: "CM98".to_string(),
            power: 23,
            device: "/dev/ttyUSB0".to_string(),
            baud_rate: 9600,
            journal_path: None,
            rotation_pools: None,
        }
    }
}

impl Settings {
    /// Get the XDG config directory for wsprctl
    /// Uses $XDG_CONFIG_HOME/wsprctl, falls back to ~/.config/wsprctl
    fn config_dir() -> Option<PathBuf> {
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_config);
            if path.is_absolute() {
                return Some(path.join("wsprctl"));
            }
        }

        dirs::home_dir().map(|h| h.join(".config").join("wsprctl"))
    }

    /// Get the settings file path
    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.json"))
    }

    /// Default decision journal path
    pub fn default_journal_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("decisions.jsonl"))
    }

    /// Load settings from disk, falling back to defaults
    pub fn load() -> Self {
        Self::settings_path()
            .and_then(|path| std::fs::read_to_string(path).ok())
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    }

    /// The journal path to use: configured or default
    pub fn journal_path(&self) -> Option<PathBuf> {
        self.journal_path
            .clone()
            .or_else(Self::default_journal_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_device_defaults() {
        let s = Settings::default();
        assert_eq!(s.baud_rate, 9600);
        assert_eq!(s.power, 23);
        assert!(s.rotation_pools.is_none());
    }

    #[test]
    fn partial_settings_file_fills_in_defaults() {
        let s: Settings =
            serde_json::from_str(r#"{"callsign":"TEST1","grid":"FN20","power":30,"device":"/dev/ttyUSB1"}"#)
                .unwrap();
        assert_eq!(s.callsign, "TEST1");
        assert_eq!(s.baud_rate, 9600);
        assert!(s.journal_path.is_none());
    }

    #[test]
    fn round_trips_through_json() {
        let s = Settings::default();
        let json = serde_json::to_string_pretty(&s).unwrap();
        let back: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(s, back);
    }
}
