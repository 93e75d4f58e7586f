use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::SubtitleError;

// @module: Timestamp parsing and formatting for every supported syntax

// @const: SRT/VTT-style clock, hours optional, 1-3 fraction digits, `,` or `.`
static CLOCK_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(\d+):)?(\d{1,2}):(\d{2})[,.](\d{1,3})$").unwrap()
});

// @const: ASS clock `H:MM:SS.cc`
static ASS_CLOCK_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+):(\d{1,2}):(\d{1,2})(?:\.(\d{1,3}))?$").unwrap()
});

// @const: Insert-config clock `HH:MM:SS.mmm`
static INSERT_CLOCK_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{2}):(\d{2}):(\d{2})\.(\d{3})$").unwrap()
});

/// Scale a fraction string to milliseconds: "5" -> 500, "05" -> 50, "005" -> 5
fn fraction_to_ms(fraction: &str) -> u64 {
    let value: u64 = fraction.parse().unwrap_or(0);
    match fraction.len() {
        1 => value * 100,
        2 => value * 10,
        _ => value,
    }
}

fn invalid(timestamp: &str) -> SubtitleError {
    SubtitleError::InvalidTimestamp(timestamp.to_string())
}

fn component(caps: &regex::Captures, index: usize, timestamp: &str) -> Result<u64, SubtitleError> {
    match caps.get(index) {
        Some(m) => m.as_str().parse().map_err(|_| invalid(timestamp)),
        None => Ok(0),
    }
}

/// Combine clock fields into ms; a value past `u64::MAX` is rejected
fn to_ms(hours: u64, minutes: u64, seconds: u64, millis: u64, timestamp: &str) -> Result<u64, SubtitleError> {
    hours
        .checked_mul(3_600_000)
        .and_then(|ms| ms.checked_add(minutes * 60_000))
        .and_then(|ms| ms.checked_add(seconds * 1_000))
        .and_then(|ms| ms.checked_add(millis))
        .ok_or_else(|| invalid(timestamp))
}

/// Parse an SRT or WebVTT timestamp (`HH:MM:SS,mmm`, `MM:SS.mmm`, ...) into ms
pub fn parse_clock(timestamp: &str) -> Result<u64, SubtitleError> {
    let trimmed = timestamp.trim();
    let caps = CLOCK_REGEX.captures(trimmed).ok_or_else(|| invalid(trimmed))?;

    let minutes = component(&caps, 2, trimmed)?;
    let seconds = component(&caps, 3, trimmed)?;
    if minutes >= 60 || seconds >= 60 {
        return Err(invalid(trimmed));
    }
    let millis = caps.get(4).map(|m| fraction_to_ms(m.as_str())).unwrap_or(0);

    to_ms(component(&caps, 1, trimmed)?, minutes, seconds, millis, trimmed)
}

/// Parse an ASS timestamp (`H:MM:SS.cc`) into ms
pub fn parse_ass_time(timestamp: &str) -> Result<u64, SubtitleError> {
    let trimmed = timestamp.trim();
    let caps = ASS_CLOCK_REGEX.captures(trimmed).ok_or_else(|| invalid(trimmed))?;
    let millis = caps.get(4).map(|m| fraction_to_ms(m.as_str())).unwrap_or(0);

    to_ms(
        component(&caps, 1, trimmed)?,
        component(&caps, 2, trimmed)?,
        component(&caps, 3, trimmed)?,
        millis,
        trimmed,
    )
}

/// Parse an insert-config timestamp (`HH:MM:SS.mmm`) into ms
pub fn parse_insert_time(timestamp: &str) -> Result<u64, SubtitleError> {
    let trimmed = timestamp.trim();
    let caps = INSERT_CLOCK_REGEX.captures(trimmed).ok_or_else(|| invalid(trimmed))?;

    let minutes = component(&caps, 2, trimmed)?;
    let seconds = component(&caps, 3, trimmed)?;
    if minutes >= 60 || seconds >= 60 {
        return Err(invalid(trimmed));
    }

    to_ms(component(&caps, 1, trimmed)?, minutes, seconds, component(&caps, 4, trimmed)?, trimmed)
}

/// Format ms as an ASS timestamp, truncating to centiseconds
pub fn format_ass_time(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1_000;
    let centis = (ms % 1_000) / 10;

    format!("{}:{:02}:{:02}.{:02}", hours, minutes, seconds, centis)
}

/// Format ms as an SRT timestamp (`HH:MM:SS,mmm`)
pub fn format_srt_time(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1_000;
    let millis = ms % 1_000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
}

/// Format ms as an insert-config timestamp (`HH:MM:SS.mmm`)
pub fn format_insert_time(ms: u64) -> String {
    format_srt_time(ms).replace(',', ".")
}
