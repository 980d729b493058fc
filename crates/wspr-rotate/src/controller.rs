//! Rotation controller
//!
//! Orchestrates one rotation cycle: observe what the device is doing,
//! compute the slot's target band, and reconfigure only when they differ.
//! The no-op path performs no write at all; a redundant configuration has
//! no benefit and risks interrupting an active transmission cycle.
//!
//! Nothing here retries. The scheduler's periodic re-invocation is the
//! retry mechanism, and the idempotent comparison makes repeated
//! invocations converge instead of oscillate.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{error, info, warn};
use wspr_link::{ConfirmationResult, DeviceSession, SessionConfig, StatusMonitor};
use wspr_protocol::{Band, BeaconParameters, GridLocator};

use crate::policy::RotationSchedule;

/// What the controller did with the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RotationAction {
    /// Device already on the target band; nothing written
    NoOp,
    /// A configuration command was (or needed to be) sent
    Switch,
}

/// How the cycle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RotationOutcome {
    /// Target state verified against device output
    Confirmed,
    /// Command sent; device has not yet reported the new state (expected
    /// while a multi-minute transmit cycle finishes)
    Unconfirmed,
    /// Environment or configuration problem; next scheduled invocation
    /// will naturally retry
    Failed,
}

/// Write-once record of one rotation cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotationDecision {
    /// Invocation time (start of cycle)
    pub slot_time: DateTime<Utc>,
    /// Band the policy selected; absent only when selection itself failed
    pub selected_band: Option<Band>,
    /// Pool the band was drawn from
    pub pool: Option<String>,
    /// Frequency observed on the device before acting, if any
    pub previous_observed_hz: Option<u64>,
    /// What was done
    pub action: RotationAction,
    /// How it ended
    pub outcome: RotationOutcome,
    /// Human-readable context (confirmation kind or error text)
    pub detail: String,
}

impl RotationDecision {
    /// True unless the cycle failed; maps to the process exit status
    pub fn succeeded(&self) -> bool {
        self.outcome != RotationOutcome::Failed
    }
}

/// Controller configuration: station identity plus tuning
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Station callsign
    pub callsign: String,
    /// Reported position (explicit locator or device GPS)
    pub grid: GridLocator,
    /// Power code in dBm
    pub power_code: u8,
    /// How long to listen before deciding the current band is unknown
    pub sample_window: Duration,
    /// Session settings for the configure exchange
    pub session: SessionConfig,
    /// Day partition and band pools
    pub schedule: RotationSchedule,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            callsign: String::new(),
            grid: GridLocator::DeviceGps,
            power_code: 23,
            sample_window: Duration::from_secs(3),
            session: SessionConfig::default(),
            schedule: RotationSchedule::default(),
        }
    }
}

/// One-shot rotation orchestrator
pub struct RotationController {
    config: ControllerConfig,
}

impl RotationController {
    /// Create a controller
    pub fn new(config: ControllerConfig) -> Self {
        Self { config }
    }

    /// Run one rotation cycle against an open device stream
    ///
    /// Always produces a decision record; failures are encoded in the
    /// record rather than returned, so the caller can journal every cycle
    /// uniformly.
    pub async fn run_cycle<S>(&self, io: &mut S, now: DateTime<Utc>) -> RotationDecision
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        // Policy first: pure, and a broken schedule should fail before any
        // serial traffic
        let selection = match self.config.schedule.select_band(now) {
            Ok(selection) => selection,
            Err(e) => {
                error!("Band selection failed: {}", e);
                return RotationDecision {
                    slot_time: now,
                    selected_band: None,
                    pool: None,
                    previous_observed_hz: None,
                    action: RotationAction::Switch,
                    outcome: RotationOutcome::Failed,
                    detail: e.to_string(),
                };
            }
        };

        let target_hz = selection.band.frequency_hz();
        info!(
            "Slot target: {} ({} Hz) from pool '{}'",
            selection.band, target_hz, selection.pool
        );

        let snapshot = StatusMonitor::new()
            .sample(io, self.config.sample_window)
            .await;

        match snapshot.observed_frequency_hz {
            Some(observed) if observed == target_hz => {
                info!("Already on {} ({} Hz); nothing to do", selection.band, target_hz);
                return RotationDecision {
                    slot_time: now,
                    selected_band: Some(selection.band),
                    pool: Some(selection.pool),
                    previous_observed_hz: Some(observed),
                    action: RotationAction::NoOp,
                    outcome: RotationOutcome::Confirmed,
                    detail: "already on target band".to_string(),
                };
            }
            Some(observed) => {
                let from = Band::from_frequency_hz(observed)
                    .map(|b| b.name().to_string())
                    .unwrap_or_else(|| format!("{observed} Hz"));
                info!("Switching {} -> {}", from, selection.band);
            }
            None => {
                // Cannot determine the current band; switching anyway beats
                // drifting indefinitely on a stale band
                info!(
                    "Current band unknown after {:?}; attempting switch to {}",
                    self.config.sample_window, selection.band
                );
            }
        }

        self.switch(io, now, selection, snapshot.observed_frequency_hz)
            .await
    }

    /// Issue the configuration command and fold the result into a decision
    async fn switch<S>(
        &self,
        io: &mut S,
        now: DateTime<Utc>,
        selection: crate::policy::Selection,
        previous_observed_hz: Option<u64>,
    ) -> RotationDecision
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let decision = |outcome, detail: String| RotationDecision {
            slot_time: now,
            selected_band: Some(selection.band),
            pool: Some(selection.pool.clone()),
            previous_observed_hz,
            action: RotationAction::Switch,
            outcome,
            detail,
        };

        let params = match BeaconParameters::for_band(
            &self.config.callsign,
            self.config.grid.clone(),
            self.config.power_code,
            selection.band,
        ) {
            Ok(params) => params,
            Err(e) => {
                error!("Invalid beacon parameters: {}", e);
                return decision(RotationOutcome::Failed, e.to_string());
            }
        };

        let mut session =
            DeviceSession::with_config("beacon".to_string(), io, self.config.session.clone());

        match session.configure(&params).await {
            Ok(ConfirmationResult::Confirmed) => {
                info!("Switch to {} confirmed", selection.band);
                decision(RotationOutcome::Confirmed, "confirmed".to_string())
            }
            Ok(ConfirmationResult::Applied) => {
                info!(
                    "Switch to {} sent; device still reporting previous cycle",
                    selection.band
                );
                decision(RotationOutcome::Unconfirmed, "applied".to_string())
            }
            Ok(ConfirmationResult::Unconfirmed) => {
                info!(
                    "Switch to {} sent; no confirmation within deadline (device \
                     likely mid-transmission)",
                    selection.band
                );
                decision(RotationOutcome::Unconfirmed, "unconfirmed".to_string())
            }
            Err(e) => {
                error!("Configure failed: {}", e);
                decision(RotationOutcome::Failed, e.to_string())
            }
        }
    }

    /// Run one rotation cycle against a serial port path
    ///
    /// Opens the port for the duration of the cycle; an unopenable port
    /// becomes a failed decision, since contention is an expected outcome
    /// that the next scheduled invocation retries.
    pub async fn run_cycle_on_port(
        &self,
        path: &str,
        baud_rate: u32,
        now: DateTime<Utc>,
    ) -> RotationDecision {
        match wspr_link::open_stream(path, baud_rate) {
            Ok(mut stream) => self.run_cycle(&mut stream, now).await,
            Err(e) => {
                warn!("{}", e);
                RotationDecision {
                    slot_time: now,
                    selected_band: None,
                    pool: None,
                    previous_observed_hz: None,
                    action: RotationAction::Switch,
                    outcome: RotationOutcome::Failed,
                    detail: e.to_string(),
                }
            }
        }
    }
}
