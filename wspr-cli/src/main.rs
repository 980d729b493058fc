//! WSPR Beacon Controller CLI
//!
//! `wsprctl` drives a serial-attached WSPR beacon: set a band directly,
//! run one scheduled rotation cycle, or watch the device's status output.
//! Designed to be called from cron; the exit status tells the scheduler
//! whether the invocation succeeded.

mod settings;

use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use settings::Settings;
use wspr_link::{
    candidate_ports, open_stream, ConfirmationResult, DeviceSession, LinkError, SessionConfig,
    StatusMonitor,
};
use wspr_protocol::{power_label, Band, BeaconParameters, GridLocator};
use wspr_rotate::{
    ControllerConfig, DecisionJournal, RotationController, RotationSchedule,
};

/// WSPR beacon band controller
#[derive(Parser, Debug)]
#[command(name = "wsprctl", about = "Control a serial-attached WSPR beacon")]
struct Cli {
    /// Serial device path (overrides settings)
    #[arg(short = 'd', long, global = true)]
    device: Option<String>,

    /// Baud rate (overrides settings)
    #[arg(short = 'b', long, global = true)]
    baud: Option<u32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Configure the beacon for a band
    Set {
        /// Band to set, e.g. 40m
        band: String,

        /// Callsign override
        #[arg(short = 'c', long)]
        call: Option<String>,

        /// Grid locator override (or GPS for device-computed)
        #[arg(short = 'g', long)]
        grid: Option<String>,

        /// Power override in dBm
        #[arg(short = 'p', long)]
        power: Option<u8>,

        /// Carrier frequency override in Hz (must stay near the band's
        /// canonical value)
        #[arg(long)]
        frequency_hz: Option<u64>,

        /// Confirm a GPS antenna is attached, unlocking grid GPS
        #[arg(long)]
        ack_gps_antenna: bool,

        /// Seconds to wait for device confirmation
        #[arg(long, default_value_t = 5)]
        timeout: u64,
    },

    /// Run one band-rotation cycle (intended for cron)
    Rotate {
        /// Confirm a GPS antenna is attached, unlocking grid GPS
        #[arg(long)]
        ack_gps_antenna: bool,

        /// Seconds to listen for the current band before acting
        #[arg(long, default_value_t = 3)]
        sample: u64,

        /// Seconds to wait for device confirmation after a switch
        #[arg(long, default_value_t = 5)]
        timeout: u64,
    },

    /// Print the beacon's status output as it arrives
    Monitor {
        /// Stop after this many seconds (default: run until interrupted)
        #[arg(long)]
        duration: Option<u64>,
    },

    /// Print the default configuration as JSON
    DumpConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "wsprctl=info,wspr_protocol=info,wspr_link=info,wspr_rotate=info".into()
        }))
        .init();

    let cli = Cli::parse();
    let settings = Settings::load();
    let device = cli.device.clone().unwrap_or_else(|| settings.device.clone());
    let baud = cli.baud.unwrap_or(settings.baud_rate);

    match cli.command {
        Command::Set {
            band,
            call,
            grid,
            power,
            frequency_hz,
            ack_gps_antenna,
            timeout,
        } => {
            set_band(
                &settings,
                &device,
                baud,
                &band,
                call.as_deref(),
                grid.as_deref(),
                power,
                frequency_hz,
                ack_gps_antenna,
                Duration::from_secs(timeout),
            )
            .await
        }
        Command::Rotate {
            ack_gps_antenna,
            sample,
            timeout,
        } => {
            rotate(
                &settings,
                &device,
                baud,
                ack_gps_antenna,
                Duration::from_secs(sample),
                Duration::from_secs(timeout),
            )
            .await
        }
        Command::Monitor { duration } => {
            monitor(&device, baud, duration.map(Duration::from_secs)).await
        }
        Command::DumpConfig => {
            println!("{}", serde_json::to_string_pretty(&Settings::default())?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// One manual configuration exchange
#[allow(clippy::too_many_arguments)]
async fn set_band(
    settings: &Settings,
    device: &str,
    baud: u32,
    band: &str,
    call: Option<&str>,
    grid: Option<&str>,
    power: Option<u8>,
    frequency_hz: Option<u64>,
    ack_gps_antenna: bool,
    timeout: Duration,
) -> anyhow::Result<ExitCode> {
    let band = Band::from_name(band)?;
    let callsign = call.unwrap_or(&settings.callsign);
    let grid = GridLocator::parse(grid.unwrap_or(&settings.grid))?;
    let power = power.unwrap_or(settings.power);

    let params = match frequency_hz {
        Some(hz) => BeaconParameters::with_frequency(callsign, grid, power, band, hz)?,
        None => BeaconParameters::for_band(callsign, grid, power, band)?,
    };

    info!(
        "Setting {} ({} Hz) as {} from {} at {} dBm ({})",
        band,
        params.target_frequency_hz,
        params.callsign,
        params.grid,
        params.power_code,
        power_label(params.power_code).unwrap_or("?"),
    );

    let config = SessionConfig {
        configure_timeout: timeout,
        gps_antenna_present: ack_gps_antenna,
    };
    let mut session = match DeviceSession::open_with_config(device, baud, config) {
        Ok(session) => session,
        Err(e) => return Err(port_failure(device, e)),
    };

    match session.configure(&params).await? {
        ConfirmationResult::Confirmed => {
            info!("Beacon confirmed on {} ({} Hz)", band, params.target_frequency_hz);
        }
        ConfirmationResult::Applied => {
            info!(
                "Command accepted; the device will report {} after its current \
                 transmit cycle finishes",
                band
            );
        }
        ConfirmationResult::Unconfirmed => {
            warn!(
                "No response within {:?}; the device is likely mid-transmission. \
                 Re-run `wsprctl monitor` later to verify.",
                timeout
            );
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// One scheduled rotation cycle; exit status reflects the decision outcome
async fn rotate(
    settings: &Settings,
    device: &str,
    baud: u32,
    ack_gps_antenna: bool,
    sample_window: Duration,
    timeout: Duration,
) -> anyhow::Result<ExitCode> {
    let grid = GridLocator::parse(&settings.grid)?;
    let schedule = match &settings.rotation_pools {
        Some(pools) => RotationSchedule::new(pools.clone()),
        None => RotationSchedule::default(),
    };

    let controller = RotationController::new(ControllerConfig {
        callsign: settings.callsign.clone(),
        grid,
        power_code: settings.power,
        sample_window,
        session: SessionConfig {
            configure_timeout: timeout,
            gps_antenna_present: ack_gps_antenna,
        },
        schedule,
    });

    let decision = controller.run_cycle_on_port(device, baud, Utc::now()).await;

    if let Some(path) = settings.journal_path() {
        let journal = DecisionJournal::new(path);
        if let Err(e) = journal.append(&decision) {
            warn!("Could not journal decision: {}", e);
        }
    }

    if decision.succeeded() {
        Ok(ExitCode::SUCCESS)
    } else {
        error!("Rotation failed: {}", decision.detail);
        list_ports_if_helpful(&decision.detail);
        Ok(ExitCode::FAILURE)
    }
}

/// Read-only status streaming
async fn monitor(
    device: &str,
    baud: u32,
    duration: Option<Duration>,
) -> anyhow::Result<ExitCode> {
    let mut stream = match open_stream(device, baud) {
        Ok(stream) => stream,
        Err(e) => return Err(port_failure(device, e)),
    };

    info!("Monitoring {} at {} baud (Ctrl-C to exit)", device, baud);
    StatusMonitor::new()
        .stream(&mut stream, duration, |line| println!("{line}"))
        .await
        .context("monitor stream failed")?;

    Ok(ExitCode::SUCCESS)
}

/// Wrap a port-open failure with enumeration diagnostics
fn port_failure(device: &str, e: LinkError) -> anyhow::Error {
    if matches!(e, LinkError::PortUnavailable { .. }) {
        match candidate_ports() {
            Ok(ports) if !ports.is_empty() => {
                error!("Could not open {}. Available ports:", device);
                for p in ports {
                    error!("  {} - {}", p.port, p.product.as_deref().unwrap_or("Unknown"));
                }
            }
            _ => error!("Could not open {} and no serial ports were found", device),
        }
    }
    e.into()
}

/// After a failed rotation, enumerate ports when the failure was port-related
fn list_ports_if_helpful(detail: &str) {
    if detail.contains("port unavailable") {
        if let Ok(ports) = candidate_ports() {
            for p in ports {
                info!("  candidate port: {}", p.port);
            }
        }
    }
}
