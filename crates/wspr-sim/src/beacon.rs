//! Virtual beacon simulation
//!
//! Provides a simulated beacon that generates protocol-accurate output:
//! `OK` acknowledgments when it accepts a `CONFIG:` command and `TX:` lines
//! when asked to report a completed transmit cycle.

use std::collections::VecDeque;

use wspr_protocol::decode_config;

/// A simulated beacon that mirrors the device's serial behavior
#[derive(Debug)]
pub struct VirtualBeacon {
    callsign: String,
    grid: String,
    power_code: u8,
    frequency_hz: u64,
    /// Pending output lines, already wire-encoded
    pending_output: VecDeque<Vec<u8>>,
    /// Unparsed input bytes
    input: Vec<u8>,
    configs_received: usize,
    configs_applied: usize,
    /// When false, accepted commands are parsed but not applied,
    /// mirroring a device that is mid-cycle
    applying: bool,
}

/// Initial state for a virtual beacon
#[derive(Debug, Clone)]
pub struct VirtualBeaconConfig {
    /// Configured callsign
    pub callsign: String,
    /// Configured grid field
    pub grid: String,
    /// Configured power code (dBm)
    pub power_code: u8,
    /// Current carrier frequency in Hz
    pub frequency_hz: u64,
}

impl Default for VirtualBeaconConfig {
    fn default() -> Self {
        Self {
            callsign: "AK6MJ".to_string(),
            grid: "CM98".to_string(),
            power_code: 23,
            frequency_hz: 7_040_100, // 40m
        }
    }
}

impl VirtualBeacon {
    /// Create a beacon with default state
    pub fn new() -> Self {
        Self::from_config(VirtualBeaconConfig::default())
    }

    /// Create a beacon from explicit initial state
    pub fn from_config(config: VirtualBeaconConfig) -> Self {
        Self {
            callsign: config.callsign,
            grid: config.grid,
            power_code: config.power_code,
            frequency_hz: config.frequency_hz,
            pending_output: VecDeque::new(),
            input: Vec::new(),
            configs_received: 0,
            configs_applied: 0,
            applying: true,
        }
    }

    /// Current carrier frequency in Hz
    pub fn frequency_hz(&self) -> u64 {
        self.frequency_hz
    }

    /// Number of `CONFIG:` commands that parsed successfully
    pub fn configs_received(&self) -> usize {
        self.configs_received
    }

    /// Number of `CONFIG:` commands actually applied to state
    pub fn configs_applied(&self) -> usize {
        self.configs_applied
    }

    /// Control whether accepted commands update state
    ///
    /// With `false`, commands are counted but ignored, like a device that
    /// is still finishing a transmit cycle under its old parameters.
    pub fn set_applying(&mut self, applying: bool) {
        self.applying = applying;
    }

    /// Feed raw bytes from the host and process any complete command lines
    ///
    /// Returns true if any command was processed.
    pub fn handle_bytes(&mut self, data: &[u8]) -> bool {
        self.input.extend_from_slice(data);

        let mut processed = false;
        while let Some(nl_pos) = self.input.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.input.drain(..=nl_pos).collect();
            let text = String::from_utf8_lossy(&raw);
            let line = text.trim_end_matches(['\r', '\n']).trim();
            if line.is_empty() {
                continue;
            }
            processed |= self.handle_line(line);
        }
        processed
    }

    /// Process one complete command line
    fn handle_line(&mut self, line: &str) -> bool {
        match decode_config(line) {
            Ok(cmd) => {
                self.configs_received += 1;
                if self.applying {
                    self.callsign = cmd.callsign;
                    self.grid = cmd.grid;
                    self.power_code = cmd.power_code;
                    self.frequency_hz = cmd.frequency_hz;
                    self.configs_applied += 1;
                    self.queue_ack();
                }
                true
            }
            Err(e) => {
                tracing::debug!("Virtual beacon ignoring input: {}", e);
                false
            }
        }
    }

    /// Queue an `OK` acknowledgment for the current state
    fn queue_ack(&mut self) {
        let line = format!(
            "OK {} {} {} {}\r\n",
            self.callsign, self.grid, self.power_code, self.frequency_hz
        );
        self.pending_output.push_back(line.into_bytes());
    }

    /// Queue a `TX:` transmit-completion line for the current state
    pub fn emit_status(&mut self) {
        let line = format!(
            "TX:{} {} {} {} DONE\r\n",
            self.callsign, self.grid, self.power_code, self.frequency_hz
        );
        self.pending_output.push_back(line.into_bytes());
    }

    /// Take the next pending output bytes
    pub fn take_output(&mut self) -> Option<Vec<u8>> {
        self.pending_output.pop_front()
    }

    /// Check if there is pending output
    pub fn has_output(&self) -> bool {
        !self.pending_output.is_empty()
    }
}

impl Default for VirtualBeacon {
    fn default() -> Self {
        Self::new()
    }
}
