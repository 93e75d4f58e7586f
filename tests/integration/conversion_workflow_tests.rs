/*!
 * End-to-end conversion tests through the controller
 */

use anyhow::Result;
use std::fs;
use std::sync::Arc;
use toass::app_config::{Config, InsertConfig};
use toass::app_controller::{BatchOptions, Controller, JobStatus};
use toass::providers::MockConverter;

use crate::common;

fn controller_with(config: Config, mock: MockConverter) -> Result<Controller> {
    Controller::with_config(config, Arc::new(mock))
}

fn arial_40() -> Config {
    let mut config = Config::default();
    config.settings.font_family = "Arial".to_string();
    config.settings.font_size = 40;
    config
}

fn quiet() -> BatchOptions {
    BatchOptions {
        quiet: true,
        ..BatchOptions::default()
    }
}

#[tokio::test]
async fn test_convert_withSampleSrt_shouldWriteStyledAss() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let source = common::create_test_file(temp_dir.path(), "sample.srt", common::SAMPLE_SRT)?;
    let controller = controller_with(arial_40(), MockConverter::identity())?;

    let report = controller.convert_paths(&[source.clone()], &quiet()).await?;

    assert_eq!((report.total, report.succeeded), (1, 1));
    let output = temp_dir.path().join("sample.ass");
    let content = fs::read_to_string(&output)?;

    assert!(content.starts_with("[Script Info]\n"));
    assert!(content.contains("Title: Default Aegisub file\n"));
    assert!(content.contains("ScriptType: v4.00+\n"));
    assert!(content.contains("ScaledBorderAndShadow: yes\n"));
    assert!(content.contains("PlayResX: 1920\nPlayResY: 1080\n"));

    assert_eq!(
        common::style_lines(&content),
        vec!["Style: Default,Arial,40,&H00FFFFFF,&H000000FF,&H00000000,&H00000000,0,0,0,0,100,100,0,0,1,2,1,2,10,10,10,1"]
    );
    assert_eq!(
        common::dialogue_lines(&content),
        vec![
            "Dialogue: 0,0:00:00.00,0:00:02.00,Default,,0,0,0,,Hello",
            "Dialogue: 0,0:00:02.00,0:00:04.00,Default,,0,0,0,,World",
        ]
    );
    assert!(source.exists());
    Ok(())
}

#[tokio::test]
async fn test_convert_withConfiguredColors_shouldUseThemInFreshStyle() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let source = common::create_test_file(temp_dir.path(), "a.vtt", common::SAMPLE_VTT)?;
    let mut config = arial_40();
    config.subtitles.subtitle_color = "H0000FFFF".parse().unwrap();
    config.subtitles.outline_color = "H00404040".parse().unwrap();
    let controller = controller_with(config, MockConverter::identity())?;

    controller.convert_paths(&[source], &quiet()).await?;

    let content = fs::read_to_string(temp_dir.path().join("a.ass"))?;
    assert!(content.contains("Style: Default,Arial,40,&H0000FFFF,&H000000FF,&H00404040,"));
    Ok(())
}

#[tokio::test]
async fn test_convert_withSimplifiedAndInserts_shouldApplyBothInOrder() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let source = common::create_test_file(temp_dir.path(), "show.srt", common::SAMPLE_SRT)?;
    let mut config = arial_40();
    config
        .subtitles
        .add(InsertConfig::new("logo", "00:00:00.000", "00:00:03.000", "{\\an7}LOGO"))?;
    let controller = controller_with(config, MockConverter::mapping(|line| line.to_lowercase()))?;

    let options = BatchOptions {
        convert_text: true,
        selected_inserts: vec!["logo".to_string(), "unknown".to_string()],
        ..quiet()
    };
    controller.convert_paths(&[source], &options).await?;

    let content = fs::read_to_string(temp_dir.path().join("show.ass"))?;
    assert_eq!(
        common::dialogue_lines(&content),
        vec![
            "Dialogue: 0,0:00:00.00,0:00:02.00,Default,,0,0,0,,hello",
            "Dialogue: 0,0:00:02.00,0:00:04.00,Default,,0,0,0,,world",
            "Dialogue: 0,0:00:00.00,0:00:03.00,Default,,0,0,0,,{\\an7}LOGO",
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_convert_withExistingAssInPlace_shouldRestyleWithoutForce() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let source = common::create_test_file(temp_dir.path(), "styled.ass", common::SAMPLE_ASS)?;
    let mut config = arial_40();
    config.subtitles.subtitle_color = "H000000FF".parse().unwrap();
    let controller = controller_with(config, MockConverter::identity())?;

    let report = controller.convert_paths(&[source.clone()], &quiet()).await?;

    assert_eq!(report.succeeded, 1);
    let content = fs::read_to_string(&source)?;
    assert!(content.contains("Style: Default,Verdana,36,&H000000FF,"));
    assert!(content.contains("Style: Top,Arial,24,&H00FFFFFF,"));
    assert!(content.contains("Dialogue: 0,0:00:01.00,0:00:02.00,Default,,0,0,0,,繁體中文"));
    Ok(())
}

#[tokio::test]
async fn test_convert_withDeleteOriginal_shouldRemoveSources() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let source = common::create_test_file(temp_dir.path(), "a.srt", common::SAMPLE_SRT)?;
    let controller = controller_with(arial_40(), MockConverter::identity())?;

    let options = BatchOptions {
        delete_original: true,
        ..quiet()
    };
    let report = controller.convert_paths(&[source.clone()], &options).await?;

    match &report.results[0].status {
        JobStatus::Succeeded(outcome) => assert!(outcome.source_deleted),
        other => panic!("expected success, got {:?}", other),
    }
    assert!(!source.exists());
    assert!(temp_dir.path().join("a.ass").exists());
    assert_eq!(report.delete_failures().count(), 0);
    Ok(())
}
