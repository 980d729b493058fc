//! Virtual beacon actor task
//!
//! Bridges a [`VirtualBeacon`] over an async stream so the real session and
//! monitor code can be exercised end to end. Tests typically connect the
//! task to the code under test with `tokio::io::duplex`.
//!
//! The task runs until the peer closes the stream, then returns the beacon
//! so tests can inspect how many commands reached it.

use std::io;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::interval;
use tracing::debug;

use crate::VirtualBeacon;

/// Behavior knobs for a running virtual beacon
#[derive(Debug, Clone)]
pub struct BeaconTaskConfig {
    /// Emit a `TX:` status line at this cadence; `None` keeps the beacon
    /// silent, like a device mid-transmission
    pub status_interval: Option<Duration>,
}

impl Default for BeaconTaskConfig {
    fn default() -> Self {
        Self {
            status_interval: Some(Duration::from_millis(50)),
        }
    }
}

/// Run a virtual beacon over a stream until the peer hangs up
pub async fn run_beacon_task<S>(
    mut stream: S,
    mut beacon: VirtualBeacon,
    config: BeaconTaskConfig,
) -> io::Result<VirtualBeacon>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut buf = [0u8; 256];
    // A silent beacon still needs a timer arm for select!; make it one the
    // test will never hit.
    let period = config
        .status_interval
        .unwrap_or(Duration::from_secs(3600));
    let mut ticker = interval(period);
    // interval() fires immediately; skip that first tick so the cadence
    // starts one period in
    ticker.tick().await;

    loop {
        tokio::select! {
            result = stream.read(&mut buf) => {
                match result {
                    Ok(0) => {
                        debug!("Virtual beacon: peer closed stream");
                        break;
                    }
                    Ok(n) => {
                        beacon.handle_bytes(&buf[..n]);
                        flush_output(&mut stream, &mut beacon).await?;
                    }
                    Err(e) if e.kind() == io::ErrorKind::WouldBlock => continue,
                    Err(e) => return Err(e),
                }
            }
            _ = ticker.tick() => {
                if config.status_interval.is_some() {
                    beacon.emit_status();
                    flush_output(&mut stream, &mut beacon).await?;
                }
            }
        }
    }

    Ok(beacon)
}

async fn flush_output<S>(stream: &mut S, beacon: &mut VirtualBeacon) -> io::Result<()>
where
    S: AsyncWrite + Unpin,
{
    while let Some(data) = beacon.take_output() {
        stream.write_all(&data).await?;
    }
    stream.flush().await
}
