//! Read-only status observation
//!
//! The monitor never writes to the device, so it is safe to run purely to
//! inspect current state, e.g. before deciding whether a rotation is needed.
//! All reads are bounded by the caller's window; a silent or garbled device
//! produces an "unknown" snapshot, never an error.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::{timeout, Instant};
use tracing::{debug, trace, warn};
use wspr_protocol::{LineCodec, StatusLine};

/// Read chunk size for the sampling loop
const READ_BUF_LEN: usize = 256;

/// Point-in-time observation of the device's reported state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceStatusSnapshot {
    /// Frequency from the last transmit-completion line, or `None` if no
    /// parseable line arrived within the sampling window
    pub observed_frequency_hz: Option<u64>,
    /// When the sample was captured
    pub captured_at: DateTime<Utc>,
}

impl DeviceStatusSnapshot {
    fn unknown() -> Self {
        Self {
            observed_frequency_hz: None,
            captured_at: Utc::now(),
        }
    }
}

/// Passive observer of the device's periodic status output
pub struct StatusMonitor {
    codec: LineCodec,
}

impl StatusMonitor {
    /// Create a new monitor
    pub fn new() -> Self {
        Self {
            codec: LineCodec::new(),
        }
    }

    /// Read for up to `window`, returning the first transmit-status line's
    /// frequency
    ///
    /// Malformed lines are skipped. Never blocks longer than `window`; I/O
    /// errors are logged and produce an unknown snapshot rather than a
    /// failure, since an unreadable device and a silent device call for the
    /// same downstream decision.
    pub async fn sample<S>(&mut self, io: &mut S, window: Duration) -> DeviceStatusSnapshot
    where
        S: AsyncRead + Unpin,
    {
        let deadline = Instant::now() + window;
        let mut buf = [0u8; READ_BUF_LEN];

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }

            match timeout(remaining, io.read(&mut buf)).await {
                Ok(Ok(0)) => break,
                Ok(Ok(n)) => {
                    self.codec.push_bytes(&buf[..n]);
                    while let Some((line, raw)) = self.codec.next_line_with_text() {
                        trace!("< {}", raw);
                        if let StatusLine::TransmitComplete(report) = line {
                            debug!("Observed beacon on {} Hz", report.frequency_hz);
                            return DeviceStatusSnapshot {
                                observed_frequency_hz: Some(report.frequency_hz),
                                captured_at: Utc::now(),
                            };
                        }
                    }
                }
                Ok(Err(e)) => {
                    warn!("Read error while sampling: {}", e);
                    break;
                }
                Err(_) => break,
            }
        }

        debug!("No transmit-status line within {:?}", window);
        DeviceStatusSnapshot::unknown()
    }

    /// Stream raw device output lines to a callback
    ///
    /// Runs until `window` elapses (or indefinitely when `window` is `None`)
    /// or the stream closes. Every complete line is passed to the callback
    /// verbatim, parsed or not.
    pub async fn stream<S, F>(
        &mut self,
        io: &mut S,
        window: Option<Duration>,
        mut on_line: F,
    ) -> std::io::Result<()>
    where
        S: AsyncRead + Unpin,
        F: FnMut(&str),
    {
        let deadline = window.map(|w| Instant::now() + w);
        let mut buf = [0u8; READ_BUF_LEN];

        loop {
            let read = match deadline {
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return Ok(());
                    }
                    match timeout(remaining, io.read(&mut buf)).await {
                        Ok(r) => r,
                        Err(_) => return Ok(()),
                    }
                }
                None => io.read(&mut buf).await,
            };

            match read {
                Ok(0) => return Ok(()),
                Ok(n) => {
                    self.codec.push_bytes(&buf[..n]);
                    while let Some((_, raw)) = self.codec.next_line_with_text() {
                        on_line(&raw);
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Default for StatusMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn sample_returns_first_transmit_frequency() {
        let (mut client, mut server) = tokio::io::duplex(256);
        server
            .write_all(b"noise\r\nTX:AK6MJ CM98 23 7040100 DONE\r\n")
            .await
            .unwrap();

        let mut monitor = StatusMonitor::new();
        let snapshot = monitor
            .sample(&mut client, Duration::from_millis(100))
            .await;
        assert_eq!(snapshot.observed_frequency_hz, Some(7_040_100));
    }

    #[tokio::test]
    async fn sample_times_out_to_unknown() {
        let (mut client, _server) = tokio::io::duplex(256);

        let mut monitor = StatusMonitor::new();
        let start = Instant::now();
        let snapshot = monitor.sample(&mut client, Duration::from_millis(50)).await;
        assert!(snapshot.observed_frequency_hz.is_none());
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn sample_skips_malformed_lines() {
        let (mut client, mut server) = tokio::io::duplex(256);
        server
            .write_all(b"TX:bad line\r\nOK AK6MJ CM98 23 7040100\r\n")
            .await
            .unwrap();

        let mut monitor = StatusMonitor::new();
        let snapshot = monitor.sample(&mut client, Duration::from_millis(50)).await;
        // OK acks do not report a completed cycle; only TX lines count
        assert_eq!(snapshot.observed_frequency_hz, None);
    }

    #[tokio::test]
    async fn stream_passes_raw_lines_through() {
        let (mut client, mut server) = tokio::io::duplex(256);
        server
            .write_all(b"boot v1.06\r\nTX:AK6MJ CM98 23 7040100 DONE\r\n")
            .await
            .unwrap();
        drop(server);

        let mut monitor = StatusMonitor::new();
        let mut lines = Vec::new();
        monitor
            .stream(&mut client, Some(Duration::from_millis(100)), |l| {
                lines.push(l.to_string())
            })
            .await
            .unwrap();

        assert_eq!(
            lines,
            vec![
                "boot v1.06".to_string(),
                "TX:AK6MJ CM98 23 7040100 DONE".to_string()
            ]
        );
    }
}
