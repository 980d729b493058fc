//! Beacon serial line protocol
//!
//! The beacon speaks a newline-terminated ASCII protocol:
//!
//! - Status: `TX:<call> <grid> <power> <freq> DONE` emitted after each
//!   completed transmit cycle
//! - Acknowledgment: `OK <call> <grid> <power> <freq>` after a
//!   configuration command is accepted
//! - Command: `CONFIG:<call>,<grid>,<power>,<freq>\r\n` sent to the device
//!
//! # Format
//! - Command field separator: `,`
//! - Status field separator: single space
//! - Terminator: `\r\n` on commands; the device emits `\r\n` but bare `\n`
//!   is tolerated on input
//!
//! The literal framing is inferred from the device's observed output and is
//! deliberately confined to this module so it can be adjusted against the
//! physical hardware in one place.

use crate::error::ParseError;
use crate::params::BeaconParameters;

/// Maximum status line length (reasonable limit to prevent buffer overflow)
const MAX_LINE_LEN: usize = 128;

/// Marker prefix on transmit-completion lines
const TX_MARKER: &str = "TX:";

/// Marker prefix on configuration acknowledgments
const OK_MARKER: &str = "OK ";

/// Tag closing a transmit-completion line
const COMPLETION_TAG: &str = "DONE";

/// Fields reported by the device about a transmit cycle or accepted config
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransmitReport {
    /// Callsign the device transmitted
    pub callsign: String,
    /// Grid field as reported (may be a GPS-derived locator)
    pub grid: String,
    /// Power code in dBm
    pub power_code: u8,
    /// Carrier frequency in Hz
    pub frequency_hz: u64,
}

/// One parsed line of device output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusLine {
    /// `TX:` transmit-completion line
    TransmitComplete(TransmitReport),
    /// `OK` configuration acknowledgment
    ConfigAck(TransmitReport),
    /// Anything else the device printed; never an error, callers skip it
    Unrecognized(String),
}

impl StatusLine {
    /// Parse a complete line (without terminator)
    pub fn parse(line: &str) -> Result<StatusLine, ParseError> {
        if let Some(rest) = line.strip_prefix(TX_MARKER) {
            let report = parse_report(rest, true)?;
            return Ok(StatusLine::TransmitComplete(report));
        }
        if let Some(rest) = line.strip_prefix(OK_MARKER) {
            let report = parse_report(rest, false)?;
            return Ok(StatusLine::ConfigAck(report));
        }
        Err(ParseError::UnrecognizedLine(line.to_string()))
    }
}

/// Parse `<call> <grid> <power> <freq>` with an optional trailing tag
fn parse_report(fields: &str, expect_tag: bool) -> Result<TransmitReport, ParseError> {
    let mut parts = fields.split_whitespace();

    let callsign = parts
        .next()
        .ok_or_else(|| ParseError::MalformedStatus(fields.to_string()))?;
    let grid = parts
        .next()
        .ok_or_else(|| ParseError::MalformedStatus(fields.to_string()))?;
    let power = parts
        .next()
        .ok_or_else(|| ParseError::MalformedStatus(fields.to_string()))?;
    let freq = parts
        .next()
        .ok_or_else(|| ParseError::MalformedStatus(fields.to_string()))?;

    if expect_tag && parts.next() != Some(COMPLETION_TAG) {
        return Err(ParseError::MalformedStatus(fields.to_string()));
    }

    let power_code = power
        .parse::<u8>()
        .map_err(|_| ParseError::InvalidPower(power.to_string()))?;
    let frequency_hz = freq
        .parse::<u64>()
        .map_err(|_| ParseError::InvalidFrequency(freq.to_string()))?;

    Ok(TransmitReport {
        callsign: callsign.to_string(),
        grid: grid.to_string(),
        power_code,
        frequency_hz,
    })
}

/// Encode one configuration command, terminator included
pub fn encode_config(params: &BeaconParameters) -> Vec<u8> {
    format!(
        "CONFIG:{},{},{},{}\r\n",
        params.callsign,
        params.grid.as_field(),
        params.power_code,
        params.target_frequency_hz
    )
    .into_bytes()
}

/// Fields of a decoded `CONFIG:` command line
///
/// The grid is kept as the raw wire field since it may be the `GPS`
/// sentinel rather than a locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigCommand {
    /// Callsign field
    pub callsign: String,
    /// Grid field, verbatim
    pub grid: String,
    /// Power code in dBm
    pub power_code: u8,
    /// Carrier frequency in Hz
    pub frequency_hz: u64,
}

/// Decode a `CONFIG:` command line (without terminator)
///
/// This is the device's view of the exchange; the host only encodes. It
/// exists so a simulated beacon can interpret commands with the same
/// framing rules the encoder uses.
pub fn decode_config(line: &str) -> Result<ConfigCommand, ParseError> {
    let rest = line
        .strip_prefix("CONFIG:")
        .ok_or_else(|| ParseError::UnrecognizedLine(line.to_string()))?;

    let fields: Vec<&str> = rest.split(',').collect();
    if fields.len() != 4 {
        return Err(ParseError::MalformedStatus(line.to_string()));
    }

    let power_code = fields[2]
        .parse::<u8>()
        .map_err(|_| ParseError::InvalidPower(fields[2].to_string()))?;
    let frequency_hz = fields[3]
        .parse::<u64>()
        .map_err(|_| ParseError::InvalidFrequency(fields[3].to_string()))?;

    Ok(ConfigCommand {
        callsign: fields[0].to_string(),
        grid: fields[1].to_string(),
        power_code,
        frequency_hz,
    })
}

/// Streaming line codec for device output
///
/// Accumulates raw serial bytes and yields parsed [`StatusLine`]s. Partial
/// reads, interleaved garbage and non-UTF-8 bytes are all tolerated; a line
/// that fails to parse comes out as `StatusLine::Unrecognized`.
pub struct LineCodec {
    buffer: Vec<u8>,
}

impl LineCodec {
    /// Create an empty codec
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(MAX_LINE_LEN),
        }
    }

    /// Push raw bytes into the codec's buffer
    pub fn push_bytes(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);

        // Prevent buffer overflow from a device stuck without newlines
        if self.buffer.len() > MAX_LINE_LEN * 4 {
            let start = self.buffer.len() - MAX_LINE_LEN;
            self.buffer = self.buffer[start..].to_vec();
        }
    }

    /// Try to extract the next complete line from the buffer
    pub fn next_line(&mut self) -> Option<StatusLine> {
        self.next_line_with_text().map(|(line, _)| line)
    }

    /// Try to extract the next complete line along with its raw text
    ///
    /// The raw text is useful for monitoring where the exact device output
    /// should be shown.
    pub fn next_line_with_text(&mut self) -> Option<(StatusLine, String)> {
        loop {
            let nl_pos = self.buffer.iter().position(|&b| b == b'\n')?;
            let raw: Vec<u8> = self.buffer.drain(..=nl_pos).collect();

            let text = String::from_utf8_lossy(&raw);
            let trimmed = text.trim_end_matches(['\r', '\n']).trim();
            if trimmed.is_empty() {
                continue;
            }

            let line = match StatusLine::parse(trimmed) {
                Ok(line) => line,
                Err(e) => {
                    tracing::trace!("Skipping unparseable line: {}", e);
                    StatusLine::Unrecognized(trimmed.to_string())
                }
            };

            return Some((line, trimmed.to_string()));
        }
    }

    /// Clear the internal buffer
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::band::Band;
    use crate::params::GridLocator;

    fn feed(codec: &mut LineCodec, s: &str) {
        codec.push_bytes(s.as_bytes());
    }

    #[test]
    fn parse_transmit_complete() {
        let line = StatusLine::parse("TX:AK6MJ CM98 23 7040100 DONE").unwrap();
        assert_eq!(
            line,
            StatusLine::TransmitComplete(TransmitReport {
                callsign: "AK6MJ".into(),
                grid: "CM98".into(),
                power_code: 23,
                frequency_hz: 7_040_100,
            })
        );
    }

    #[test]
    fn parse_config_ack() {
        let line = StatusLine::parse("OK AK6MJ CM98 23 21096100").unwrap();
        assert_eq!(
            line,
            StatusLine::ConfigAck(TransmitReport {
                callsign: "AK6MJ".into(),
                grid: "CM98".into(),
                power_code: 23,
                frequency_hz: 21_096_100,
            })
        );
    }

    #[test]
    fn tx_line_without_completion_tag_rejected() {
        assert!(StatusLine::parse("TX:AK6MJ CM98 23 7040100").is_err());
    }

    #[test]
    fn malformed_fields_rejected() {
        assert!(StatusLine::parse("TX:AK6MJ CM98 DONE").is_err());
        assert!(StatusLine::parse("TX:AK6MJ CM98 xx 7040100 DONE").is_err());
        assert!(StatusLine::parse("TX:AK6MJ CM98 23 notafreq DONE").is_err());
        assert!(StatusLine::parse("boot v1.06").is_err());
    }

    #[test]
    fn codec_handles_partial_reads() {
        let mut codec = LineCodec::new();
        feed(&mut codec, "TX:AK6MJ CM9");
        assert!(codec.next_line().is_none());
        feed(&mut codec, "8 23 7040100 DONE\r\n");

        match codec.next_line() {
            Some(StatusLine::TransmitComplete(r)) => assert_eq!(r.frequency_hz, 7_040_100),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(codec.next_line().is_none());
    }

    #[test]
    fn codec_yields_unrecognized_for_garbage_lines() {
        let mut codec = LineCodec::new();
        feed(&mut codec, "GPS lock acquired\r\nTX:AK6MJ CM98 23 7040100 DONE\n");

        assert!(matches!(
            codec.next_line(),
            Some(StatusLine::Unrecognized(_))
        ));
        assert!(matches!(
            codec.next_line(),
            Some(StatusLine::TransmitComplete(_))
        ));
    }

    #[test]
    fn codec_skips_blank_lines_and_tolerates_bare_lf() {
        let mut codec = LineCodec::new();
        feed(&mut codec, "\r\n\nOK AK6MJ CM98 23 14097100\n");
        assert!(matches!(codec.next_line(), Some(StatusLine::ConfigAck(_))));
    }

    #[test]
    fn codec_survives_invalid_utf8() {
        let mut codec = LineCodec::new();
        codec.push_bytes(b"\xff\xfe garbage\r\n");
        codec.push_bytes(b"TX:AK6MJ CM98 23 7040100 DONE\r\n");

        assert!(matches!(
            codec.next_line(),
            Some(StatusLine::Unrecognized(_))
        ));
        assert!(matches!(
            codec.next_line(),
            Some(StatusLine::TransmitComplete(_))
        ));
    }

    #[test]
    fn codec_bounds_buffer_without_newlines() {
        let mut codec = LineCodec::new();
        codec.push_bytes(&[b'x'; MAX_LINE_LEN * 8]);
        assert!(codec.buffer.len() <= MAX_LINE_LEN * 4);
        assert!(codec.next_line().is_none());
    }

    #[test]
    fn encode_config_wire_format() {
        let params = BeaconParameters::for_band(
            "AK6MJ",
            GridLocator::parse("CM98").unwrap(),
            23,
            Band::M15,
        )
        .unwrap();
        assert_eq!(
            encode_config(&params),
            b"CONFIG:AK6MJ,CM98,23,21096100\r\n".to_vec()
        );
    }

    #[test]
    fn encode_config_gps_sentinel() {
        let params =
            BeaconParameters::for_band("AK6MJ", GridLocator::DeviceGps, 23, Band::M20).unwrap();
        assert_eq!(
            encode_config(&params),
            b"CONFIG:AK6MJ,GPS,23,14097100\r\n".to_vec()
        );
    }

    #[test]
    fn decode_config_round_trip() {
        let params = BeaconParameters::for_band(
            "AK6MJ",
            GridLocator::parse("CM98").unwrap(),
            23,
            Band::M15,
        )
        .unwrap();
        let wire = encode_config(&params);
        let line = String::from_utf8(wire).unwrap();
        let cmd = decode_config(line.trim_end()).unwrap();
        assert_eq!(cmd.callsign, "AK6MJ");
        assert_eq!(cmd.grid, "CM98");
        assert_eq!(cmd.power_code, 23);
        assert_eq!(cmd.frequency_hz, 21_096_100);
    }

    #[test]
    fn decode_config_rejects_malformed() {
        assert!(decode_config("CONFIG:AK6MJ,CM98,23").is_err());
        assert!(decode_config("CONFIG:AK6MJ,CM98,xx,7040100").is_err());
        assert!(decode_config("TX:AK6MJ CM98 23 7040100 DONE").is_err());
    }

    #[test]
    fn raw_text_preserved_for_monitoring() {
        let mut codec = LineCodec::new();
        feed(&mut codec, "TX:AK6MJ CM98 23 7040100 DONE\r\n");
        let (_, raw) = codec.next_line_with_text().unwrap();
        assert_eq!(raw, "TX:AK6MJ CM98 23 7040100 DONE");
    }
}
