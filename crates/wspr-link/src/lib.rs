//! Serial link to the WSPR beacon
//!
//! Two I/O roles, deliberately separated:
//!
//! - [`DeviceSession`]: write one configuration command and verify it took
//!   effect (exclusive access for the duration of the exchange)
//! - [`StatusMonitor`]: read-only observation of the device's periodic
//!   status output, safe to run without disturbing a transmission
//!
//! Both are generic over `AsyncRead`/`AsyncWrite` streams; hardware callers
//! open a [`tokio_serial`] port, tests use `tokio::io::duplex` with a
//! simulated beacon.

pub mod error;
pub mod monitor;
pub mod ports;
pub mod session;

pub use error::LinkError;
pub use monitor::{DeviceStatusSnapshot, StatusMonitor};
pub use ports::{candidate_ports, PortInfo};
pub use session::{open_stream, ConfirmationResult, DeviceSession, SessionConfig};
