use anyhow::{anyhow, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs;
use std::path::Path;

use crate::subtitle::Color;
use crate::subtitle::timestamp;

// @module: Application configuration
// Two persisted JSON documents: `sub.json` holds the insert configs and
// colors, `settings.json` the output directory, font and text-conversion
// settings.

/// Sentinel insert name meaning "insert nothing"; never resolved as a config
pub const NO_INSERTION: &str = "不插入字幕";

/// A named literal event that can be injected into any converted file
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct InsertConfig {
    // @field: Unique selection key
    pub name: String,

    // @field: Start time, `HH:MM:SS.mmm`
    #[serde(default = "default_insert_start")]
    pub start_time: String,

    // @field: End time, `HH:MM:SS.mmm`
    #[serde(default = "default_insert_end")]
    pub end_time: String,

    // @field: Event text, written verbatim
    #[serde(default)]
    pub ass_statement: String,
}

impl InsertConfig {
    pub fn new(
        name: impl Into<String>,
        start_time: impl Into<String>,
        end_time: impl Into<String>,
        ass_statement: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            start_time: start_time.into(),
            end_time: end_time.into(),
            ass_statement: ass_statement.into(),
        }
    }

    /// Start and end offsets in ms
    pub fn span_ms(&self) -> Result<(u64, u64)> {
        let start = timestamp::parse_insert_time(&self.start_time)
            .map_err(|e| anyhow!("start time: {}", e))?;
        let end = timestamp::parse_insert_time(&self.end_time)
            .map_err(|e| anyhow!("end time: {}", e))?;
        if end < start {
            return Err(anyhow!(
                "end time {} precedes start time {}",
                self.end_time,
                self.start_time
            ));
        }
        Ok((start, end))
    }
}

/// Contents of `sub.json`
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SubtitleConfigs {
    /// User-defined insert configs
    #[serde(default)]
    pub subtitle_configs: Vec<InsertConfig>,

    /// Primary (fill) color of the Default style
    #[serde(default = "default_subtitle_color")]
    pub subtitle_color: Color,

    /// Outline color of the Default style
    #[serde(default = "default_outline_color")]
    pub outline_color: Color,
}

impl Default for SubtitleConfigs {
    fn default() -> Self {
        Self {
            subtitle_configs: Vec::new(),
            subtitle_color: default_subtitle_color(),
            outline_color: default_outline_color(),
        }
    }
}

impl SubtitleConfigs {
    /// Look up an insert config by name
    pub fn find(&self, name: &str) -> Option<&InsertConfig> {
        self.subtitle_configs.iter().find(|c| c.name == name)
    }

    /// Add a new insert config; names must be unique
    pub fn add(&mut self, config: InsertConfig) -> Result<()> {
        Self::validate_insert(&config)?;
        if self.find(&config.name).is_some() {
            return Err(anyhow!("Insert config '{}' already exists", config.name));
        }
        self.subtitle_configs.push(config);
        Ok(())
    }

    /// Replace the config with the same name, or append it
    pub fn upsert(&mut self, config: InsertConfig) -> Result<()> {
        Self::validate_insert(&config)?;
        match self.subtitle_configs.iter_mut().find(|c| c.name == config.name) {
            Some(existing) => *existing = config,
            None => self.subtitle_configs.push(config),
        }
        Ok(())
    }

    /// Remove a config by name, returning it when it existed
    pub fn remove(&mut self, name: &str) -> Option<InsertConfig> {
        let index = self.subtitle_configs.iter().position(|c| c.name == name)?;
        Some(self.subtitle_configs.remove(index))
    }

    fn validate_insert(config: &InsertConfig) -> Result<()> {
        if config.name.trim().is_empty() {
            return Err(anyhow!("Insert config name must not be empty"));
        }
        if config.name == NO_INSERTION {
            return Err(anyhow!("'{}' is reserved", NO_INSERTION));
        }
        config
            .span_ms()
            .with_context(|| format!("Insert config '{}' has invalid times", config.name))?;
        Ok(())
    }

    /// Validate every insert config and name uniqueness
    pub fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for config in &self.subtitle_configs {
            Self::validate_insert(config)?;
            if !seen.insert(config.name.as_str()) {
                return Err(anyhow!("Duplicate insert config name '{}'", config.name));
            }
        }
        Ok(())
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

/// What to do when the text-conversion service returns fewer lines than sent
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ShortReplyPolicy {
    /// Events without a returned line keep their original text
    #[default]
    KeepOriginal,
    /// Fail the job
    Fail,
}

/// Text-conversion service configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TextConversionConfig {
    /// Convert endpoint URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Converter name sent to the service
    #[serde(default = "default_converter")]
    pub converter: String,

    /// Optional HTTP(S) proxy, e.g. `http://127.0.0.1:7890`
    #[serde(default)]
    pub proxy: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries after a transient failure
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Backoff before the first retry (in milliseconds), doubled on each retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for TextConversionConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            converter: default_converter(),
            proxy: None,
            timeout_secs: default_timeout_secs(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

/// Contents of `settings.json`
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Settings {
    /// Where converted files go; empty means next to each source
    #[serde(default)]
    pub output_directory: String,

    /// Font of a freshly created Default style
    #[serde(default = "default_font_family")]
    pub font_family: String,

    /// Font size of a freshly created Default style
    #[serde(default = "default_font_size")]
    pub font_size: u32,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Maximum number of files converted at once
    #[serde(default = "default_concurrent_jobs")]
    pub concurrent_jobs: usize,

    /// Handling of short text-conversion replies
    #[serde(default)]
    pub short_reply_policy: ShortReplyPolicy,

    /// Text-conversion service settings
    #[serde(default)]
    pub text_conversion: TextConversionConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_directory: String::new(),
            font_family: default_font_family(),
            font_size: default_font_size(),
            log_level: LogLevel::default(),
            concurrent_jobs: default_concurrent_jobs(),
            short_reply_policy: ShortReplyPolicy::default(),
            text_conversion: TextConversionConfig::default(),
        }
    }
}

impl Settings {
    /// Validate the settings for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.font_family.trim().is_empty() {
            return Err(anyhow!("font_family must not be empty"));
        }
        if self.font_size == 0 {
            return Err(anyhow!("font_size must be positive"));
        }
        if self.concurrent_jobs == 0 {
            return Err(anyhow!("concurrent_jobs must be at least 1"));
        }
        url::Url::parse(&self.text_conversion.endpoint)
            .with_context(|| format!("Invalid text conversion endpoint: {}", self.text_conversion.endpoint))?;
        if let Some(proxy) = self.text_conversion.proxy.as_deref().filter(|p| !p.trim().is_empty()) {
            url::Url::parse(proxy).with_context(|| format!("Invalid proxy: {}", proxy))?;
        }
        Ok(())
    }

    /// Configured output directory, `None` when unset
    pub fn output_directory(&self) -> Option<&str> {
        let dir = self.output_directory.trim();
        if dir.is_empty() { None } else { Some(dir) }
    }
}

/// Both persisted documents
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub subtitles: SubtitleConfigs,
    pub settings: Settings,
}

impl Config {
    /// Load both documents, creating default files for missing ones
    pub fn load_or_create(subtitles_path: &Path, settings_path: &Path) -> Result<Self> {
        Ok(Self {
            subtitles: load_or_create(subtitles_path)?,
            settings: load_or_create(settings_path)?,
        })
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        self.subtitles.validate()?;
        self.settings.validate()
    }
}

/// Read a JSON document, or write and return the default when the file is missing
pub fn load_or_create<T>(path: &Path) -> Result<T>
where
    T: Default + Serialize + for<'de> Deserialize<'de>,
{
    if path.exists() {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    } else {
        warn!("Config file not found at '{}', creating default config.", path.display());
        let value = T::default();
        save(path, &value)?;
        Ok(value)
    }
}

/// Write a JSON document with pretty formatting
pub fn save<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize config to JSON")?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
    }
    fs::write(path, json).with_context(|| format!("Failed to write config file: {}", path.display()))
}

fn default_insert_start() -> String {
    "00:00:00.000".to_string()
}

fn default_insert_end() -> String {
    "00:00:05.000".to_string()
}

fn default_subtitle_color() -> Color {
    Color::WHITE
}

fn default_outline_color() -> Color {
    Color::BLACK
}

fn default_font_family() -> String {
    "方正粗圆_GBK".to_string()
}

fn default_font_size() -> u32 {
    70
}

fn default_concurrent_jobs() -> usize {
    4
}

fn default_endpoint() -> String {
    "https://api.zhconvert.org/convert".to_string()
}

fn default_converter() -> String {
    "China".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_retry_count() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    1000 // 1 second base backoff time, doubled on each retry
}
