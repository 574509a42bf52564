/*!
 * Failure isolation tests: fatal mapping errors, partial items and tool fallback
 */

use anyhow::Result;
use std::sync::Arc;
use platekeeper::app_controller::Controller;
use platekeeper::errors::{IngestError, MappingError};
use platekeeper::pipeline::{IngestPipeline, ItemStatus, Stage};
use platekeeper::sequence::SequenceScanner;
use platekeeper::tools::MockToolRunner;
use crate::common;

/// A sequence without a mapping entry stops the run before anything is copied
#[tokio::test]
async fn test_run_withUnmappedShot_shouldAbortBeforeCopy() -> Result<()> {
    common::init_test_logging();
    let input = common::create_temp_dir()?;
    let output = common::create_temp_dir()?;
    common::create_frames(input.path(), "shotA", "exr", 1001..=1003)?;
    common::create_test_file(input.path(), "ref.txt", "notes")?;
    let csv = common::create_mapping(output.path(), &["050/0200,sc50_sh0200,plate_bg_v001"])?;

    let job = common::test_job(input.path(), output.path(), &csv);
    let scan = SequenceScanner::new()
        .with_hints(job.scene.clone(), job.shot.clone())
        .scan(&[input.path()]);
    let pipeline = IngestPipeline::new(common::test_config(), job, Arc::new(MockToolRunner::working()));

    let err = pipeline.run(scan).await.unwrap_err();

    assert!(matches!(err, IngestError::Mapping(MappingError::NoMatch { .. })));
    assert!(!output.path().join("gen63").exists());
    Ok(())
}

/// A missing mapping table is fatal too
#[tokio::test]
async fn test_run_withMissingMappingTable_shouldFail() -> Result<()> {
    common::init_test_logging();
    let input = common::create_temp_dir()?;
    let output = common::create_temp_dir()?;
    common::create_frames(input.path(), "shotA", "exr", 1001..=1002)?;

    let controller = Controller::new_for_test()?;
    let job = common::test_job(input.path(), output.path(), &output.path().join("absent.csv"));

    assert!(controller.run(job).await.is_err());
    Ok(())
}

/// Failing proxies leave the plates and the movie in place and mark the item partial
#[tokio::test]
async fn test_run_withFailingResizeTool_shouldReportPartial() -> Result<()> {
    common::init_test_logging();
    let input = common::create_temp_dir()?;
    let output = common::create_temp_dir()?;
    common::create_frames(input.path(), "shotA", "exr", 1001..=1003)?;
    let csv = common::create_mapping(output.path(), &[common::MAPPING_ROW])?;

    let runner = Arc::new(MockToolRunner::failing_tools(&["oiiotool"]));
    let controller = Controller::with_runner(common::test_config(), runner.clone())?;
    let job = common::test_job(input.path(), output.path(), &csv)
        .with_proxy("jpeg", "2K_DCP")
        .with_movie(true);

    let report = controller.run(job).await?;
    let item = &report.items[0];

    match &item.status {
        ItemStatus::Partial { failures } => {
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].stage, Stage::Proxy);
            assert!(failures[0].reason.starts_with("3 of 3 proxies failed"));
        }
        other => panic!("unexpected status {:?}", other),
    }
    assert_eq!(item.files_copied, 3);
    assert!(item.movie.is_some());
    assert_eq!(runner.calls_to("oiiotool").len(), 3);
    assert_eq!(report.failed(), 0);
    Ok(())
}

/// A failing composer falls back to the transcoder and the item still succeeds
#[tokio::test]
async fn test_run_withFailingComposer_shouldFallBack() -> Result<()> {
    common::init_test_logging();
    let input = common::create_temp_dir()?;
    let output = common::create_temp_dir()?;
    common::create_frames(input.path(), "shotA", "exr", 1001..=1003)?;
    let csv = common::create_mapping(output.path(), &[common::MAPPING_ROW])?;

    let mut config = common::test_config();
    config.tools.composer = Some("dailies".to_string());
    let runner = Arc::new(MockToolRunner::failing_tools(&["dailies"]));
    let controller = Controller::with_runner(config, runner.clone())?;
    let job = common::test_job(input.path(), output.path(), &csv).with_movie(true);

    let report = controller.run(job).await?;

    assert!(report.is_success());
    let composer_call = &runner.calls_to("dailies")[0];
    assert_eq!(composer_call.args[0], "--data");
    let record: serde_json::Value = serde_json::from_str(&composer_call.args[1])?;
    assert_eq!(record["topleft"], "from_da");
    assert_eq!(record["topcenter"], "sc48");
    assert_eq!(record["bottomleft"], "v001");
    assert!(record["input"].as_str().is_some_and(|i| i.ends_with("sc48_sh0140_plate_bg_v001_%04d.exr")));

    let fallback = &runner.calls_to("ffmpeg")[0];
    let start = fallback.args.iter().position(|a| a == "-start_number").expect("start number flag");
    assert_eq!(fallback.args[start + 1], "1001");
    Ok(())
}

/// When every movie tool fails only the movie stage is marked
#[tokio::test]
async fn test_run_withAllMovieToolsFailing_shouldKeepPlates() -> Result<()> {
    common::init_test_logging();
    let input = common::create_temp_dir()?;
    let output = common::create_temp_dir()?;
    common::create_frames(input.path(), "shotA", "exr", 1001..=1002)?;
    common::create_test_file(input.path(), "ref.txt", "notes")?;
    let csv = common::create_mapping(output.path(), &[common::MAPPING_ROW])?;

    let runner = Arc::new(MockToolRunner::failing_tools(&["ffmpeg"]));
    let controller = Controller::with_runner(common::test_config(), runner)?;
    let job = common::test_job(input.path(), output.path(), &csv).with_movie(true);

    let report = controller.run(job).await?;

    assert_eq!(report.partial(), 1);
    assert_eq!(report.succeeded(), 1);
    let sequence = &report.items[0];
    match &sequence.status {
        ItemStatus::Partial { failures } => assert_eq!(failures[0].stage, Stage::Movie),
        other => panic!("unexpected status {:?}", other),
    }
    assert_eq!(sequence.files_copied, 2);
    assert!(sequence.movie.is_none());
    Ok(())
}

/// A sequence without a resolvable shot is a fatal mapping error
#[tokio::test]
async fn test_run_withoutSceneShot_shouldFail() -> Result<()> {
    common::init_test_logging();
    let input = common::create_temp_dir()?;
    let output = common::create_temp_dir()?;
    common::create_frames(input.path(), "shotA", "exr", 1001..=1002)?;
    let csv = common::create_mapping(output.path(), &[common::MAPPING_ROW])?;

    let job = platekeeper::JobOptions::new("gen63", output.path(), &csv).with_input(input.path());
    let scan = SequenceScanner::new().scan(&[input.path()]);
    let pipeline = IngestPipeline::new(common::test_config(), job, Arc::new(MockToolRunner::working()));

    let err = pipeline.run(scan).await.unwrap_err();
    assert!(matches!(err, IngestError::Mapping(MappingError::MissingSceneShot(_))));
    Ok(())
}

/// A malformed delivery date is rejected before any version folder is reserved
#[tokio::test]
async fn test_run_withMalformedDate_shouldLeaveNoVersionFolder() -> Result<()> {
    common::init_test_logging();
    let input = common::create_temp_dir()?;
    let output = common::create_temp_dir()?;
    common::create_frames(input.path(), "shotA", "exr", 1001..=1002)?;
    common::create_test_file(input.path(), "ref.txt", "notes")?;
    let csv = common::create_mapping(output.path(), &[common::MAPPING_ROW])?;
    let plate_dir = output.path().join("gen63/repo/sequences/SC_048/SH_sh0140/plate/bg");

    let job = common::test_job(input.path(), output.path(), &csv).with_input_date("2025/07/15");
    let controller = Controller::new_for_test()?;
    assert!(controller.run(job.clone()).await.is_err());
    assert!(!plate_dir.join("v001").exists());

    let scan = SequenceScanner::new()
        .with_hints(job.scene.clone(), job.shot.clone())
        .scan(&[input.path()]);
    let pipeline = IngestPipeline::new(common::test_config(), job, Arc::new(MockToolRunner::working()));

    let err = pipeline.run(scan).await.unwrap_err();
    assert!(matches!(err, IngestError::Config(_)));
    assert!(!plate_dir.join("v001").exists());
    Ok(())
}
