//! Device configuration session
//!
//! A [`DeviceSession`] owns the serial connection for the duration of one
//! configuration exchange: it writes a single `CONFIG:` line and then reads
//! status output until the device confirms the change, reports a still-active
//! prior cycle, or the deadline passes. The port handle is released when the
//! session is dropped, on every exit path, so an interrupted exchange never
//! leaves the port locked.
//!
//! Timeouts here are routine, not failures: a transmit cycle runs ~110
//! seconds every even minute, and the device says nothing while it is busy.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::{timeout, Instant};
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{debug, info, trace, warn};
use wspr_protocol::{encode_config, BeaconParameters, LineCodec, StatusLine};

use crate::error::LinkError;

/// Read chunk size for the response loop
const READ_BUF_LEN: usize = 256;

/// Outcome of one configuration exchange
///
/// Only `Confirmed` means the device reported a completed transmit cycle on
/// the target frequency. The other two are expected when the device is in
/// the middle of its multi-minute duty cycle and are not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationResult {
    /// A transmit-status line reported the target frequency
    Confirmed,
    /// The device accepted the command but its last completed cycle (or its
    /// acknowledgment) still reflects earlier parameters
    Applied,
    /// No recognizable status line arrived before the deadline
    Unconfirmed,
}

/// Session tuning knobs
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Overall deadline for one configuration exchange
    pub configure_timeout: Duration,
    /// Operator has confirmed a GPS antenna is physically attached,
    /// unlocking the `GPS` grid sentinel
    pub gps_antenna_present: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            configure_timeout: Duration::from_secs(5),
            gps_antenna_present: false,
        }
    }
}

/// Open a raw serial stream to the beacon
///
/// Used by callers that sample before deciding whether to start a
/// configuration exchange; [`DeviceSession`] can then wrap the same stream.
pub fn open_stream(path: &str, baud_rate: u32) -> Result<SerialStream, LinkError> {
    debug!("Opening {} at {} baud", path, baud_rate);
    tokio_serial::new(path, baud_rate)
        .timeout(Duration::from_millis(100))
        .open_native_async()
        .map_err(|e| LinkError::PortUnavailable {
            port: path.to_string(),
            reason: e.to_string(),
        })
}

/// One exclusive serial session with the beacon
///
/// Generic over the I/O type so tests can substitute an in-memory stream;
/// real callers use [`DeviceSession::open`].
pub struct DeviceSession<T> {
    port_name: String,
    io: T,
    codec: LineCodec,
    config: SessionConfig,
}

impl DeviceSession<SerialStream> {
    /// Open the serial port for one exchange
    ///
    /// Fails with [`LinkError::PortUnavailable`] when the path does not
    /// exist or the port is already exclusively held.
    pub fn open(path: &str, baud_rate: u32) -> Result<Self, LinkError> {
        Self::open_with_config(path, baud_rate, SessionConfig::default())
    }

    /// Open with custom session configuration
    pub fn open_with_config(
        path: &str,
        baud_rate: u32,
        config: SessionConfig,
    ) -> Result<Self, LinkError> {
        let stream = open_stream(path, baud_rate)?;
        Ok(Self::with_config(path.to_string(), stream, config))
    }
}

impl<T> DeviceSession<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    /// Create a session over an already-open stream
    pub fn new(port_name: String, io: T) -> Self {
        Self::with_config(port_name, io, SessionConfig::default())
    }

    /// Create a session over an already-open stream with custom configuration
    pub fn with_config(port_name: String, io: T, config: SessionConfig) -> Self {
        Self {
            port_name,
            io,
            codec: LineCodec::new(),
            config,
        }
    }

    /// Perform one configuration exchange and verify it took effect
    ///
    /// Writes the encoded `CONFIG:` line and reads status output until the
    /// configured deadline. Returns an error only for the safety gate and
    /// for I/O failures; a silent device yields [`ConfirmationResult::Unconfirmed`].
    pub async fn configure(
        &mut self,
        params: &BeaconParameters,
    ) -> Result<ConfirmationResult, LinkError> {
        // Safety gate: never send the GPS grid sentinel unless the caller
        // has confirmed a positioning antenna is attached. Checked before
        // any byte is written.
        if params.grid.is_device_gps() && !self.config.gps_antenna_present {
            warn!(
                "Refusing GPS-grid configuration on {} without antenna confirmation",
                self.port_name
            );
            return Err(LinkError::GpsSentinelRequiresConfirmation);
        }

        let command = encode_config(params);
        debug!(
            "> {}",
            String::from_utf8_lossy(&command).trim_end_matches("\r\n")
        );
        self.io.write_all(&command).await?;
        self.io.flush().await?;

        self.await_confirmation(params).await
    }

    /// Read status lines until the target frequency is confirmed or the
    /// deadline passes
    async fn await_confirmation(
        &mut self,
        params: &BeaconParameters,
    ) -> Result<ConfirmationResult, LinkError> {
        let deadline = Instant::now() + self.config.configure_timeout;
        let mut acknowledged = false;
        let mut buf = [0u8; READ_BUF_LEN];

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }

            match timeout(remaining, self.io.read(&mut buf)).await {
                Ok(Ok(0)) => {
                    debug!("Stream closed by {}", self.port_name);
                    break;
                }
                Ok(Ok(n)) => {
                    self.codec.push_bytes(&buf[..n]);
                    while let Some((line, raw)) = self.codec.next_line_with_text() {
                        trace!("< {}", raw);
                        match line {
                            StatusLine::TransmitComplete(report) => {
                                return Ok(if report.frequency_hz == params.target_frequency_hz {
                                    info!(
                                        "Confirmed: beacon completed a cycle on {} Hz",
                                        report.frequency_hz
                                    );
                                    ConfirmationResult::Confirmed
                                } else {
                                    // The device may still be finishing a cycle
                                    // started under the previous parameters.
                                    info!(
                                        "Device reported {} Hz, target {} Hz; \
                                         new config not yet reflected",
                                        report.frequency_hz, params.target_frequency_hz
                                    );
                                    ConfirmationResult::Applied
                                });
                            }
                            StatusLine::ConfigAck(report) => {
                                debug!("Device acknowledged config for {} Hz", report.frequency_hz);
                                acknowledged = true;
                            }
                            StatusLine::Unrecognized(_) => {}
                        }
                    }
                }
                Ok(Err(e)) => return Err(e.into()),
                Err(_) => break, // overall deadline
            }
        }

        Ok(if acknowledged {
            info!("Config acknowledged; no transmit cycle completed within deadline");
            ConfirmationResult::Applied
        } else {
            info!(
                "No status line within {:?}; device likely mid-transmission",
                self.config.configure_timeout
            );
            ConfirmationResult::Unconfirmed
        })
    }

    /// Port name this session was opened on
    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Release the session, returning the underlying stream
    pub fn into_inner(self) -> T {
        self.io
    }
}
