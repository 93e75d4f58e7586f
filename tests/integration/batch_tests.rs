/*!
 * Batch controller tests: tallying, skipping and output placement
 */

use anyhow::Result;
use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use toass::app_config::Config;
use toass::app_controller::{BatchOptions, Controller, JobStatus};
use toass::errors::ConversionError;
use toass::providers::MockConverter;

use crate::common;

fn controller(jobs: usize) -> Result<Controller> {
    let mut config = Config::default();
    config.settings.concurrent_jobs = jobs;
    Controller::with_config(config, Arc::new(MockConverter::identity()))
}

fn quiet() -> BatchOptions {
    BatchOptions {
        quiet: true,
        ..BatchOptions::default()
    }
}

#[tokio::test]
async fn test_convert_paths_withMixedInputs_shouldTallyEachOutcome() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path();
    common::create_test_file(root, "good.srt", common::SAMPLE_SRT)?;
    common::create_test_file(root, "nested/good.vtt", common::SAMPLE_VTT)?;
    common::create_test_file(root, "broken.srt", "1\nnot a timing line\nHello\n")?;
    common::create_test_file(root, "done.srt", common::SAMPLE_SRT)?;
    common::create_test_file(root, "done.ass", "existing output")?;
    let explicit_txt = common::create_test_file(root, "notes.txt", "ignored in dirs")?;

    let report = controller(3)?
        .convert_paths(&[root.to_path_buf(), explicit_txt], &quiet())
        .await?;

    // done.ass is itself a source converted in place, so done.srt cannot claim it
    assert_eq!(report.total, 6);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.failed, 4);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.results.len(), 6);
    assert!(report.has_failures());

    let mut failures: Vec<String> = report
        .failures()
        .map(|(path, e)| {
            let kind = match e {
                ConversionError::Parse { .. } => "parse",
                ConversionError::UnsupportedFormat { .. } => "unsupported",
                ConversionError::DestinationConflict { .. } => "conflict",
                _ => "other",
            };
            format!("{}:{}", path.file_name().unwrap().to_string_lossy(), kind)
        })
        .collect();
    failures.sort();
    assert_eq!(failures, vec!["broken.srt:parse", "done.ass:parse", "done.srt:conflict", "notes.txt:unsupported"]);

    assert!(root.join("good.ass").exists());
    assert!(root.join("nested/good.ass").exists());
    assert!(!root.join("broken.ass").exists());
    assert_eq!(fs::read_to_string(root.join("done.ass"))?, "existing output");
    assert!(root.join("done.srt").exists());
    Ok(())
}

#[tokio::test]
async fn test_convert_paths_withSharedStem_shouldConvertOnlyFirstSource() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let srt = common::create_test_file(temp_dir.path(), "ep.srt", common::SAMPLE_SRT)?;
    let vtt = common::create_test_file(temp_dir.path(), "ep.vtt", common::SAMPLE_VTT)?;
    let calls = AtomicUsize::new(0);

    let report = controller(2)?
        .convert_paths_with_callback(&[temp_dir.path().to_path_buf()], &quiet(), |_, _| {
            calls.fetch_add(1, Ordering::SeqCst);
        })
        .await?;

    assert_eq!((report.total, report.succeeded, report.failed, report.skipped), (2, 1, 1, 0));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    for result in &report.results {
        match &result.status {
            JobStatus::Succeeded(_) => assert_eq!(result.source, srt),
            JobStatus::Failed(ConversionError::DestinationConflict { path, owner }) => {
                assert_eq!(result.source, vtt);
                assert_eq!(path, &temp_dir.path().join("ep.ass"));
                assert_eq!(owner, &srt);
            }
            other => panic!("unexpected status {:?}", other),
        }
    }
    let content = fs::read_to_string(temp_dir.path().join("ep.ass"))?;
    assert!(content.contains(",,Hello"));
    assert!(!content.contains("First cue"));
    Ok(())
}

#[tokio::test]
async fn test_convert_paths_withSharedStemForcedAndDeleting_shouldKeepLosingSource() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let srt = common::create_test_file(temp_dir.path(), "ep.srt", common::SAMPLE_SRT)?;
    let vtt = common::create_test_file(temp_dir.path(), "ep.vtt", common::SAMPLE_VTT)?;
    let options = BatchOptions {
        force: true,
        delete_original: true,
        ..quiet()
    };

    let report = controller(2)?.convert_paths(&[temp_dir.path().to_path_buf()], &options).await?;

    assert_eq!((report.succeeded, report.failed), (1, 1));
    assert!(!srt.exists());
    assert_eq!(fs::read_to_string(&vtt)?, common::SAMPLE_VTT);
    let content = fs::read_to_string(temp_dir.path().join("ep.ass"))?;
    assert!(content.contains(",,Hello"));
    assert!(!content.contains("First cue"));
    Ok(())
}

#[tokio::test]
async fn test_convert_paths_withExistingOutput_shouldSkipUnlessForced() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let source = common::create_test_file(temp_dir.path(), "a.srt", common::SAMPLE_SRT)?;
    let output = common::create_test_file(temp_dir.path(), "out/a.ass", "old")?;
    let options = BatchOptions {
        output_dir: Some(temp_dir.path().join("out")),
        ..quiet()
    };

    let report = controller(1)?.convert_paths(&[source.clone()], &options).await?;
    assert_eq!(report.skipped, 1);
    assert!(matches!(report.results[0].status, JobStatus::Skipped));
    assert_eq!(fs::read_to_string(&output)?, "old");

    let forced = BatchOptions { force: true, ..options };
    let report = controller(1)?.convert_paths(&[source], &forced).await?;
    assert_eq!(report.succeeded, 1);
    assert!(fs::read_to_string(&output)?.contains("[Events]"));
    Ok(())
}

#[tokio::test]
async fn test_convert_paths_withConfiguredOutputDirectory_shouldWriteThere() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let source = common::create_test_file(temp_dir.path(), "in/ep1.srt", common::SAMPLE_SRT)?;
    let mut config = Config::default();
    config.settings.output_directory = temp_dir.path().join("converted").to_string_lossy().to_string();
    let controller = Controller::with_config(config, Arc::new(MockConverter::identity()))?;

    let report = controller.convert_paths(&[source], &quiet()).await?;

    assert_eq!(report.succeeded, 1);
    assert_eq!(report.results[0].destination, temp_dir.path().join("converted/ep1.ass"));
    assert!(report.results[0].destination.exists());
    Ok(())
}

#[tokio::test]
async fn test_convert_paths_withCallback_shouldReportEveryCompletion() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    for i in 0..5 {
        common::create_test_file(temp_dir.path(), &format!("{}.srt", i), common::SAMPLE_SRT)?;
    }
    let calls = AtomicUsize::new(0);
    let last = AtomicUsize::new(0);

    let report = controller(2)?
        .convert_paths_with_callback(&[temp_dir.path().to_path_buf()], &quiet(), |done, total| {
            calls.fetch_add(1, Ordering::SeqCst);
            last.store(done, Ordering::SeqCst);
            assert_eq!(total, 5);
        })
        .await?;

    assert_eq!(report.succeeded, 5);
    assert_eq!(calls.load(Ordering::SeqCst), 5);
    assert_eq!(last.load(Ordering::SeqCst), 5);
    Ok(())
}

#[tokio::test]
async fn test_convert_paths_withEmptyDirectory_shouldReturnEmptyReport() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(temp_dir.path(), "readme.txt", "")?;

    let report = controller(4)?.convert_paths(&[temp_dir.path().to_path_buf()], &quiet()).await?;

    assert_eq!(report.total, 0);
    assert!(!report.has_failures());
    Ok(())
}

#[test]
fn test_with_config_withInvalidConfig_shouldFail() {
    let mut config = Config::default();
    config.settings.concurrent_jobs = 0;
    assert!(Controller::with_config(config, Arc::new(MockConverter::identity())).is_err());
}
