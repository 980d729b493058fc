//! Serial port enumeration
//!
//! Used for diagnostics when the configured port cannot be opened: rather
//! than a bare failure, the CLI can show the operator which ports exist.

use serialport::{available_ports, SerialPortType};
use tracing::info;

use crate::error::LinkError;

/// Port name substrings that are never beacon devices
const SKIP_PATTERNS: [&str; 2] = ["Bluetooth", "debug"];

/// Information about a candidate serial port
#[derive(Debug, Clone)]
pub struct PortInfo {
    /// Port name (e.g. /dev/ttyUSB0, COM3)
    pub port: String,
    /// USB product string, if available
    pub product: Option<String>,
    /// USB manufacturer string, if available
    pub manufacturer: Option<String>,
}

/// Enumerate serial ports that could plausibly be the beacon
pub fn candidate_ports() -> Result<Vec<PortInfo>, LinkError> {
    let ports = available_ports().map_err(|e| LinkError::Enumeration(e.to_string()))?;

    let result: Vec<_> = ports
        .into_iter()
        .filter(|p| !SKIP_PATTERNS.iter().any(|s| p.port_name.contains(s)))
        .map(|p| {
            let (product, manufacturer) = match &p.port_type {
                SerialPortType::UsbPort(usb) => {
                    (usb.product.clone(), usb.manufacturer.clone())
                }
                _ => (None, None),
            };
            PortInfo {
                port: p.port_name,
                product,
                manufacturer,
            }
        })
        .collect();

    if result.is_empty() {
        info!("No serial ports found");
    } else {
        info!("Found {} serial port(s)", result.len());
        for port in &result {
            info!("  {} - {}", port.port, port.product.as_deref().unwrap_or("Unknown"));
        }
    }

    Ok(result)
}
