/*!
 * Core document model for subtitle conversion.
 *
 * A `SubtitleDocument` is the format-independent representation every parser
 * produces and the ASS writer consumes: script info, named styles and timed
 * events.
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Name of the style the conversion pipeline creates or patches
pub const DEFAULT_STYLE_NAME: &str = "Default";

/// Complete subtitle document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubtitleDocument {
    /// `[Script Info]` metadata
    pub info: ScriptInfo,

    /// Named style definitions
    pub styles: StyleSheet,

    /// Timed events in document order
    pub events: Vec<SubtitleEvent>,

    /// ASS sections this crate does not interpret, kept verbatim
    pub extra_sections: Vec<RawSection>,
}

impl SubtitleDocument {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a document holding the given events and nothing else
    pub fn from_events(events: Vec<SubtitleEvent>) -> Self {
        Self {
            events,
            ..Self::default()
        }
    }
}

/// Ordered key/value metadata with unique keys
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptInfo {
    entries: Vec<(String, String)>,
}

impl ScriptInfo {
    /// Build from pairs; a repeated key keeps its first position and last value
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut info = Self::default();
        for (key, value) in pairs {
            info.set(key, value);
        }
        info
    }

    /// Value for a key, if present
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Insert or overwrite a key in place
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Set the key only when it is missing or blank
    pub fn set_if_blank(&mut self, key: &str, value: &str) {
        if self.get(key).is_none_or(|v| v.trim().is_empty()) {
            self.set(key, value);
        }
    }

    /// Overwrite a key in place, or insert it at the front when missing
    pub fn set_or_prepend(&mut self, key: &str, value: &str) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.entries.insert(0, (key.to_string(), value.to_string())),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Ordered style definitions with unique names
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleSheet {
    styles: Vec<Style>,
}

impl StyleSheet {
    /// Insert a style, replacing any existing style with the same name in place
    pub fn insert(&mut self, style: Style) {
        match self.styles.iter_mut().find(|s| s.name == style.name) {
            Some(existing) => *existing = style,
            None => self.styles.push(style),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Style> {
        self.styles.iter().find(|s| s.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Style> {
        self.styles.iter_mut().find(|s| s.name == name)
    }

    /// Drop every style
    pub fn clear(&mut self) {
        self.styles.clear();
    }

    /// Number of styles carrying the given name (0 or 1 by construction)
    pub fn count_named(&self, name: &str) -> usize {
        self.styles.iter().filter(|s| s.name == name).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Style> {
        self.styles.iter()
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}

/// ASS V4+ style record
#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    pub name: String,
    pub font_name: String,
    pub font_size: f64,
    pub primary_color: Color,
    pub secondary_color: Color,
    pub outline_color: Color,
    pub back_color: Color,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strike_out: bool,
    pub scale_x: f64,
    pub scale_y: f64,
    pub spacing: f64,
    pub angle: f64,
    pub border_style: i32,
    pub outline: f64,
    pub shadow: f64,
    pub alignment: i32,
    pub margin_l: i32,
    pub margin_r: i32,
    pub margin_v: i32,
    pub encoding: i32,
}

impl Style {
    /// Style with the usual ASS defaults under the given name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl Default for Style {
    fn default() -> Self {
        Self {
            name: DEFAULT_STYLE_NAME.to_string(),
            font_name: "Arial".to_string(),
            font_size: 20.0,
            primary_color: Color::WHITE,
            secondary_color: Color::rgba(255, 0, 0, 0),
            outline_color: Color::BLACK,
            back_color: Color::BLACK,
            bold: false,
            italic: false,
            underline: false,
            strike_out: false,
            scale_x: 100.0,
            scale_y: 100.0,
            spacing: 0.0,
            angle: 0.0,
            border_style: 1,
            outline: 2.0,
            shadow: 2.0,
            alignment: 2,
            margin_l: 10,
            margin_r: 10,
            margin_v: 10,
            encoding: 1,
        }
    }
}

/// Dialogue lines are shown; comment lines are kept but not rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventKind {
    #[default]
    Dialogue,
    Comment,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dialogue => "Dialogue",
            Self::Comment => "Comment",
        }
    }
}

/// One timed subtitle line
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SubtitleEvent {
    // @field: Start offset in ms
    pub start_ms: u64,

    // @field: End offset in ms, never before start
    pub end_ms: u64,

    // @field: Text in ASS markup
    pub text: String,

    // @field: Style reference, `Default` when absent
    pub style: Option<String>,

    pub kind: EventKind,
    pub layer: i32,
    pub name: String,
    pub margin_l: i32,
    pub margin_r: i32,
    pub margin_v: i32,
    pub effect: String,
}

impl SubtitleEvent {
    /// Create a dialogue event; `end_ms` is raised to `start_ms` if it is earlier
    pub fn new(start_ms: u64, end_ms: u64, text: impl Into<String>) -> Self {
        Self {
            start_ms,
            end_ms: end_ms.max(start_ms),
            text: text.into(),
            ..Self::default()
        }
    }

    /// Style name used when writing the event
    pub fn style_name(&self) -> &str {
        self.style.as_deref().unwrap_or(DEFAULT_STYLE_NAME)
    }

    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }
}

/// Section of an ASS file kept as raw lines
#[derive(Debug, Clone, PartialEq)]
pub struct RawSection {
    /// Header without brackets, e.g. `Fonts`
    pub name: String,
    pub lines: Vec<String>,
}

/// ASS color, stored as RGBA where alpha 0 is opaque
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgba(255, 255, 255, 0);
    pub const BLACK: Color = Color::rgba(0, 0, 0, 0);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Packed `0xAABBGGRR` value as used by ASS
    pub fn to_abgr(self) -> u32 {
        (u32::from(self.a) << 24) | (u32::from(self.b) << 16) | (u32::from(self.g) << 8) | u32::from(self.r)
    }

    pub fn from_abgr(value: u32) -> Self {
        Self {
            r: (value & 0xFF) as u8,
            g: ((value >> 8) & 0xFF) as u8,
            b: ((value >> 16) & 0xFF) as u8,
            a: ((value >> 24) & 0xFF) as u8,
        }
    }

    /// Form stored in `sub.json`: `H00BBGGRR`
    pub fn to_config_string(self) -> String {
        format!("H{:08X}", self.to_abgr())
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "&H{:08X}", self.to_abgr())
    }
}

impl FromStr for Color {
    type Err = String;

    /// Accepts `H00FFFFFF`, `&H00FFFFFF`, `&H00FFFFFF&`, `&HFFFFFF` and decimal integers
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let hex = trimmed
            .strip_prefix('&')
            .unwrap_or(trimmed)
            .trim_end_matches('&');
        if let Some(digits) = hex.strip_prefix('H').or_else(|| hex.strip_prefix('h')) {
            if digits.is_empty() || digits.len() > 8 {
                return Err(format!("Invalid color '{}'", s));
            }
            return u32::from_str_radix(digits, 16)
                .map(Self::from_abgr)
                .map_err(|_| format!("Invalid color '{}'", s));
        }
        trimmed
            .parse::<i64>()
            .ok()
            .and_then(|v| u32::try_from(v).ok().or_else(|| i32::try_from(v).ok().map(|v| v as u32)))
            .map(Self::from_abgr)
            .ok_or_else(|| format!("Invalid color '{}'", s))
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_config_string()
    }
}
