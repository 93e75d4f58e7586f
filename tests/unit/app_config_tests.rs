/*!
 * Tests for configuration loading, defaults and validation
 */

use anyhow::Result;
use std::fs;
use toass::app_config::{
    self, Config, InsertConfig, LogLevel, NO_INSERTION, Settings, ShortReplyPolicy, SubtitleConfigs,
};
use toass::subtitle::Color;

use crate::common;

#[test]
fn test_default_settings_shouldMatchDocumentedValues() {
    let settings = Settings::default();

    assert_eq!(settings.output_directory, "");
    assert_eq!(settings.font_family, "方正粗圆_GBK");
    assert_eq!(settings.font_size, 70);
    assert_eq!(settings.log_level, LogLevel::Info);
    assert_eq!(settings.concurrent_jobs, 4);
    assert_eq!(settings.short_reply_policy, ShortReplyPolicy::KeepOriginal);
    assert_eq!(settings.text_conversion.endpoint, "https://api.zhconvert.org/convert");
    assert_eq!(settings.text_conversion.converter, "China");
    assert_eq!(settings.text_conversion.retry_count, 2);
    assert!(settings.validate().is_ok());
}

#[test]
fn test_load_or_create_withMissingFiles_shouldWriteDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let sub_path = temp_dir.path().join("sub.json");
    let settings_path = temp_dir.path().join("conf/settings.json");

    let config = Config::load_or_create(&sub_path, &settings_path)?;

    assert_eq!(config, Config::default());
    assert!(sub_path.exists());
    assert!(settings_path.exists());

    let written: serde_json::Value = serde_json::from_str(&fs::read_to_string(&sub_path)?)?;
    assert_eq!(written["subtitle_color"], "H00FFFFFF");
    assert_eq!(written["outline_color"], "H00000000");
    assert_eq!(written["subtitle_configs"], serde_json::json!([]));
    Ok(())
}

#[test]
fn test_load_or_create_withPartialFile_shouldFillDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "sub.json",
        r#"{"subtitle_configs": [{"name": "logo", "ass_statement": "{\\an7}LOGO"}], "subtitle_color": "&H0000FFFF&"}"#,
    )?;

    let configs: SubtitleConfigs = app_config::load_or_create(&path)?;

    assert_eq!(configs.subtitle_color, Color::rgba(255, 255, 0, 0));
    assert_eq!(configs.outline_color, Color::BLACK);
    let logo = configs.find("logo").unwrap();
    assert_eq!(logo.start_time, "00:00:00.000");
    assert_eq!(logo.end_time, "00:00:05.000");
    assert_eq!(logo.ass_statement, "{\\an7}LOGO");
    Ok(())
}

#[test]
fn test_load_or_create_withMalformedJson_shouldFailWithPath() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "settings.json", "{ not json")?;

    let err = app_config::load_or_create::<Settings>(&path).unwrap_err();

    assert!(err.to_string().contains("settings.json"));
    Ok(())
}

#[test]
fn test_load_or_create_withBadColor_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "sub.json", r#"{"subtitle_color": "white"}"#)?;

    assert!(app_config::load_or_create::<SubtitleConfigs>(&path).is_err());
    Ok(())
}

#[test]
fn test_save_thenLoad_shouldPreserveInsertConfigs() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("sub.json");
    let mut configs = SubtitleConfigs::default();
    configs.add(InsertConfig::new("logo", "00:00:00.000", "00:00:05.000", "{\\an7}LOGO"))?;
    configs.outline_color = "H00FF0000".parse().unwrap();

    app_config::save(&path, &configs)?;
    let loaded: SubtitleConfigs = app_config::load_or_create(&path)?;

    assert_eq!(loaded, configs);
    Ok(())
}

#[test]
fn test_add_withDuplicateName_shouldFail() -> Result<()> {
    let mut configs = SubtitleConfigs::default();
    configs.add(InsertConfig::new("logo", "00:00:00.000", "00:00:05.000", "a"))?;

    assert!(configs.add(InsertConfig::new("logo", "00:00:01.000", "00:00:02.000", "b")).is_err());

    configs.upsert(InsertConfig::new("logo", "00:00:01.000", "00:00:02.000", "b"))?;
    assert_eq!(configs.subtitle_configs.len(), 1);
    assert_eq!(configs.find("logo").unwrap().ass_statement, "b");
    Ok(())
}

#[test]
fn test_add_withReservedOrInvalid_shouldFail() {
    let mut configs = SubtitleConfigs::default();

    assert!(configs.add(InsertConfig::new(NO_INSERTION, "00:00:00.000", "00:00:01.000", "x")).is_err());
    assert!(configs.add(InsertConfig::new("  ", "00:00:00.000", "00:00:01.000", "x")).is_err());
    assert!(configs.add(InsertConfig::new("t", "0:00:00", "00:00:01.000", "x")).is_err());
    assert!(configs.subtitle_configs.is_empty());
}

#[test]
fn test_remove_shouldReturnRemovedConfig() -> Result<()> {
    let mut configs = SubtitleConfigs::default();
    configs.add(InsertConfig::new("a", "00:00:00.000", "00:00:01.000", "x"))?;
    configs.add(InsertConfig::new("b", "00:00:00.000", "00:00:01.000", "y"))?;

    assert_eq!(configs.remove("a").map(|c| c.ass_statement), Some("x".to_string()));
    assert!(configs.remove("a").is_none());
    assert_eq!(configs.subtitle_configs.len(), 1);
    Ok(())
}

#[test]
fn test_validate_withDuplicateNamesInFile_shouldFail() {
    let configs = SubtitleConfigs {
        subtitle_configs: vec![
            InsertConfig::new("a", "00:00:00.000", "00:00:01.000", "x"),
            InsertConfig::new("a", "00:00:02.000", "00:00:03.000", "y"),
        ],
        ..SubtitleConfigs::default()
    };
    assert!(configs.validate().is_err());
}

#[test]
fn test_settings_validate_withBadValues_shouldFail() {
    let mut settings = Settings::default();
    settings.concurrent_jobs = 0;
    assert!(settings.validate().is_err());

    let mut settings = Settings::default();
    settings.font_size = 0;
    assert!(settings.validate().is_err());

    let mut settings = Settings::default();
    settings.text_conversion.endpoint = "not a url".to_string();
    assert!(settings.validate().is_err());
}

#[test]
fn test_settings_deserialize_withSnakeCasePolicy_shouldParse() -> Result<()> {
    let settings: Settings = serde_json::from_str(r#"{"short_reply_policy": "fail", "log_level": "debug"}"#)?;
    assert_eq!(settings.short_reply_policy, ShortReplyPolicy::Fail);
    assert_eq!(settings.log_level, LogLevel::Debug);
    assert_eq!(settings.font_size, 70);
    Ok(())
}
