//! Hardware integration test for the Spectryx Blue
//!
//! Requires the analyzer on a serial port.
//! Run with: BLUESPX_TEST_TTY=Spectryx cargo test --test spectryx_hardware_test -- --ignored --nocapture
//!
//! `BLUESPX_TEST_TTY` takes the same selector as `--tty`: a device filename or a
//! substring of a /dev/serial/by-id entry.

use std::sync::Arc;
use std::time::Duration;

use bluespx::adapters::SerialConnector;
use bluespx::config::{DeviceConfig, SamplingConfig};
use bluespx::data::SnapshotStore;
use bluespx::measurement::SAMPLE_LEN;
use bluespx::session::DeviceSession;

#[tokio::test]
#[ignore] // Hardware-only test
async fn test_scale_and_sample_from_device() {
    let selector = std::env::var("BLUESPX_TEST_TTY").unwrap_or_else(|_| "/dev/ttyUSB0".into());
    let device = DeviceConfig {
        selector,
        ..DeviceConfig::default()
    };
    let sampling = SamplingConfig::default();

    let store = SnapshotStore::new();
    let session = DeviceSession::open(
        Arc::new(SerialConnector::new(device)),
        sampling,
        store.clone(),
    )
    .await
    .expect("device should open");
    let task = tokio::spawn(session.run());

    let deadline = tokio::time::Instant::now() + Duration::from_secs(30);
    while store.intensities().is_none() && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(250)).await;
    }
    task.abort();

    let scale = store.wavelengths().expect("no wavelength scale within 30s");
    let sample = store.intensities().expect("no sample within 30s");
    assert_eq!(scale.len(), SAMPLE_LEN);
    assert_eq!(sample.len(), SAMPLE_LEN);
    assert!(scale.is_strictly_ascending());
    println!("scale {}..{} nm", scale[0], scale[SAMPLE_LEN - 1]);
}
