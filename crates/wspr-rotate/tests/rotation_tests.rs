//! Integration tests for the rotation controller
//!
//! These drive full rotation cycles against a simulated beacon connected
//! over an in-memory duplex stream, verifying:
//! - idempotence: no write when the device is already on the target band
//! - the switch path, including confirmation against device output
//! - timeout and GPS-gate handling
//! - failure encoding for broken schedules

use std::time::Duration;

use chrono::{TimeZone, Utc};
use tokio::io::AsyncReadExt;
use wspr_link::SessionConfig;
use wspr_protocol::{Band, GridLocator};
use wspr_rotate::{
    BandPool, ControllerConfig, RotationAction, RotationController, RotationOutcome,
    RotationSchedule,
};
use wspr_sim::{BeaconTaskConfig, VirtualBeacon, VirtualBeaconConfig};

/// A schedule whose single pool covers the whole day, pinning the target
/// band regardless of the test's wall-clock inputs
fn pinned_schedule(band: Band) -> RotationSchedule {
    RotationSchedule::new(vec![BandPool {
        name: "fixed".to_string(),
        start_hour: 0,
        end_hour: 0,
        bands: vec![band],
    }])
}

fn controller(band: Band, gps_antenna_present: bool) -> RotationController {
    RotationController::new(ControllerConfig {
        callsign: "AK6MJ".to_string(),
        grid: GridLocator::parse("CM98").unwrap(),
        power_code: 23,
        sample_window: Duration::from_millis(200),
        session: SessionConfig {
            configure_timeout: Duration::from_millis(500),
            gps_antenna_present,
        },
        schedule: pinned_schedule(band),
    })
}

fn beacon_on(frequency_hz: u64) -> VirtualBeacon {
    VirtualBeacon::from_config(VirtualBeaconConfig {
        frequency_hz,
        ..VirtualBeaconConfig::default()
    })
}

fn slot_time() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 4, 10, 5, 20, 0).unwrap()
}

#[tokio::test]
async fn already_on_target_band_is_a_no_op() {
    let (mut host, device) = tokio::io::duplex(1024);
    let task = tokio::spawn(wspr_sim::run_beacon_task(
        device,
        beacon_on(Band::M40.frequency_hz()),
        BeaconTaskConfig::default(),
    ));

    let decision = controller(Band::M40, false)
        .run_cycle(&mut host, slot_time())
        .await;

    assert_eq!(decision.action, RotationAction::NoOp);
    assert_eq!(decision.outcome, RotationOutcome::Confirmed);
    assert_eq!(decision.previous_observed_hz, Some(7_040_100));
    assert_eq!(decision.selected_band, Some(Band::M40));
    assert!(decision.succeeded());

    drop(host);
    let beacon = task.await.unwrap().unwrap();
    // No-op means no configuration command ever reached the device
    assert_eq!(beacon.configs_received(), 0);
}

#[tokio::test]
async fn different_band_triggers_a_confirmed_switch() {
    let (mut host, device) = tokio::io::duplex(1024);
    // Beacon on 80m, slot wants 20m
    let task = tokio::spawn(wspr_sim::run_beacon_task(
        device,
        beacon_on(Band::M80.frequency_hz()),
        BeaconTaskConfig::default(),
    ));

    let decision = controller(Band::M20, false)
        .run_cycle(&mut host, slot_time())
        .await;

    assert_eq!(decision.action, RotationAction::Switch);
    assert_eq!(decision.outcome, RotationOutcome::Confirmed);
    assert_eq!(decision.previous_observed_hz, Some(3_570_100));

    drop(host);
    let beacon = task.await.unwrap().unwrap();
    assert_eq!(beacon.configs_applied(), 1);
    assert_eq!(beacon.frequency_hz(), 14_097_100);
}

#[tokio::test]
async fn unknown_current_band_still_attempts_the_switch() {
    let (mut host, device) = tokio::io::duplex(1024);
    // Beacon never volunteers status, but does process commands
    let task = tokio::spawn(wspr_sim::run_beacon_task(
        device,
        beacon_on(Band::M80.frequency_hz()),
        BeaconTaskConfig {
            status_interval: None,
        },
    ));

    let decision = controller(Band::M20, false)
        .run_cycle(&mut host, slot_time())
        .await;

    assert_eq!(decision.previous_observed_hz, None);
    assert_eq!(decision.action, RotationAction::Switch);
    // Only the OK acknowledgment arrives before the deadline
    assert_eq!(decision.outcome, RotationOutcome::Unconfirmed);
    assert!(decision.succeeded());

    drop(host);
    let beacon = task.await.unwrap().unwrap();
    assert_eq!(beacon.configs_applied(), 1);
}

#[tokio::test]
async fn totally_unresponsive_device_is_unconfirmed_not_failed() {
    let (mut host, device) = tokio::io::duplex(1024);
    let mut beacon = beacon_on(Band::M80.frequency_hz());
    // Mid-transmission: commands land in the UART but nothing happens
    beacon.set_applying(false);
    let task = tokio::spawn(wspr_sim::run_beacon_task(
        device,
        beacon,
        BeaconTaskConfig {
            status_interval: None,
        },
    ));

    let decision = controller(Band::M20, false)
        .run_cycle(&mut host, slot_time())
        .await;

    assert_eq!(decision.action, RotationAction::Switch);
    assert_eq!(decision.outcome, RotationOutcome::Unconfirmed);
    assert!(decision.succeeded(), "a busy device must not fail the cycle");

    drop(host);
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn gps_grid_without_acknowledgment_fails_without_writing() {
    let (mut host, device) = tokio::io::duplex(1024);
    let task = tokio::spawn(wspr_sim::run_beacon_task(
        device,
        beacon_on(Band::M80.frequency_hz()),
        BeaconTaskConfig::default(),
    ));

    let controller = RotationController::new(ControllerConfig {
        callsign: "AK6MJ".to_string(),
        grid: GridLocator::DeviceGps,
        power_code: 23,
        sample_window: Duration::from_millis(200),
        session: SessionConfig {
            configure_timeout: Duration::from_millis(500),
            gps_antenna_present: false,
        },
        schedule: pinned_schedule(Band::M20),
    });

    let decision = controller.run_cycle(&mut host, slot_time()).await;

    assert_eq!(decision.outcome, RotationOutcome::Failed);
    assert!(!decision.succeeded());

    drop(host);
    let beacon = task.await.unwrap().unwrap();
    assert_eq!(beacon.configs_received(), 0);
}

#[tokio::test]
async fn empty_schedule_fails_before_touching_the_device() {
    let (mut host, mut device) = tokio::io::duplex(1024);

    let controller = RotationController::new(ControllerConfig {
        callsign: "AK6MJ".to_string(),
        grid: GridLocator::parse("CM98").unwrap(),
        power_code: 23,
        sample_window: Duration::from_millis(100),
        session: SessionConfig::default(),
        schedule: RotationSchedule::new(vec![]),
    });

    let decision = controller.run_cycle(&mut host, slot_time()).await;

    assert_eq!(decision.outcome, RotationOutcome::Failed);
    assert_eq!(decision.selected_band, None);

    // Nothing was written to the device
    drop(host);
    let mut written = Vec::new();
    let n = device.read_to_end(&mut written).await.unwrap();
    assert_eq!(n, 0, "unexpected bytes on the wire: {written:?}");
}

#[tokio::test]
async fn invalid_station_parameters_fail_the_cycle() {
    let (mut host, device) = tokio::io::duplex(1024);
    let task = tokio::spawn(wspr_sim::run_beacon_task(
        device,
        beacon_on(Band::M80.frequency_hz()),
        BeaconTaskConfig::default(),
    ));

    let controller = RotationController::new(ControllerConfig {
        callsign: "NOT A CALLSIGN".to_string(),
        grid: GridLocator::parse("CM98").unwrap(),
        power_code: 23,
        sample_window: Duration::from_millis(200),
        session: SessionConfig::default(),
        schedule: pinned_schedule(Band::M20),
    });

    let decision = controller.run_cycle(&mut host, slot_time()).await;
    assert_eq!(decision.outcome, RotationOutcome::Failed);

    drop(host);
    let beacon = task.await.unwrap().unwrap();
    assert_eq!(beacon.configs_received(), 0);
}
