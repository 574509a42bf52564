/*!
 * Integration tests for application lifecycle
 */

use anyhow::Result;
use std::time::Duration;
use platekeeper::app_config::{Config, JobOptions};
use platekeeper::app_controller::Controller;
use crate::common;

/// Test the controller initialization with default config
#[test]
fn test_controller_initialization_withDefaultConfig_shouldSucceed() -> Result<()> {
    let controller = Controller::new_for_test()?;
    assert_eq!(controller.config().tools.transcoder, "ffmpeg");
    Ok(())
}

/// An invalid configuration is rejected up front
#[test]
fn test_controller_withInvalidConfig_shouldFail() {
    let mut config = Config::default();
    config.tools.resize = "  ".to_string();
    assert!(Controller::with_config(config).is_err());
}

/// Without an explicit input the vendor delivery folder is used
#[test]
fn test_resolveInput_withoutInput_shouldUseDeliveryFolder() -> Result<()> {
    let output = common::create_temp_dir()?;
    let delivery = output.path().join("gen63/incoming/from_da/20250715");
    std::fs::create_dir_all(&delivery)?;

    let controller = Controller::new_for_test()?;
    let job = JobOptions::new("gen63", output.path(), "shots.csv")
        .with_vendor("from_da")
        .with_input_date("2025-07-15");

    assert_eq!(controller.resolve_input(&job)?, delivery);
    Ok(())
}

/// A delivery folder that does not exist is an error, as is a malformed date
#[test]
fn test_resolveInput_withMissingDelivery_shouldFail() -> Result<()> {
    let output = common::create_temp_dir()?;
    let controller = Controller::new_for_test()?;

    let job = JobOptions::new("gen63", output.path(), "shots.csv")
        .with_vendor("from_da")
        .with_input_date("2025-07-15");
    assert!(controller.resolve_input(&job).is_err());

    let job = job.with_input_date("15/07/2025");
    assert!(controller.resolve_input(&job).is_err());
    Ok(())
}

/// The scan listing shows sequences with their range and gaps
#[test]
fn test_scanListing_shouldDescribeSequencesAndFiles() -> Result<()> {
    let input = common::create_temp_dir()?;
    common::create_frames(input.path(), "shotA", "exr", [1001, 1002, 1004])?;
    common::create_test_file(input.path(), "ref.txt", "notes")?;

    let controller = Controller::new_for_test()?;
    let job = JobOptions::new("gen63", "/out", "shots.csv");
    let listing = controller.scan_listing(&job, input.path())?;

    assert!(listing.contains("1001-1004"));
    assert!(listing.contains("missing: [1003]"));
    assert!(listing.contains("ref.txt"));
    assert!(listing.ends_with("1 sequences, 1 files\n"));
    Ok(())
}

/// Durations are rendered compactly
#[test]
fn test_formatDuration_shouldPickLargestUnit() {
    assert_eq!(Controller::format_duration(Duration::from_millis(3141)), "3.141s");
    assert_eq!(Controller::format_duration(Duration::from_secs(125)), "2m 5s");
    assert_eq!(Controller::format_duration(Duration::from_secs(3725)), "1h 2m 5s");
}

/// An empty delivery folder is not an error
#[tokio::test]
async fn test_run_withEmptyInput_shouldReturnEmptyReport() -> Result<()> {
    let input = common::create_temp_dir()?;
    let output = common::create_temp_dir()?;

    let controller = Controller::new_for_test()?;
    let job = common::test_job(input.path(), output.path(), &output.path().join("shots.csv"));
    let report = controller.run(job).await?;

    assert!(report.items.is_empty());
    assert!(report.is_success());
    Ok(())
}
