use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;

use super::markup;
use super::model::{SubtitleDocument, SubtitleEvent};
use super::timestamp;
use crate::errors::SubtitleError;

// @module: SubRip parser

// @const: SRT timing line, `.` tolerated in place of `,`
static TIMING_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d+:\d{1,2}:\d{2}[,.]\d{1,3})\s*-->\s*(\d+:\d{1,2}:\d{2}[,.]\d{1,3})").unwrap()
});

/// A run of non-blank lines with the 1-based number of its first line
pub(crate) struct Block<'a> {
    pub first_line: usize,
    pub lines: Vec<&'a str>,
}

/// Split content into blocks separated by blank lines
pub(crate) fn blocks(content: &str) -> Vec<Block<'_>> {
    let mut result = Vec::new();
    let mut current: Option<Block> = None;

    for (index, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            if let Some(block) = current.take() {
                result.push(block);
            }
            continue;
        }
        current
            .get_or_insert_with(|| Block { first_line: index + 1, lines: Vec::new() })
            .lines
            .push(line);
    }
    if let Some(block) = current {
        result.push(block);
    }

    result
}

/// Parse SRT content into a document holding only events
pub fn parse(content: &str) -> Result<SubtitleDocument, SubtitleError> {
    let mut events = Vec::new();

    for block in blocks(content) {
        let timing_index = block
            .lines
            .iter()
            .position(|line| line.contains("-->"))
            .ok_or_else(|| SubtitleError::parse(block.first_line, "subtitle block has no timing line"))?;

        // Anything before the timing line other than a single index is noise
        if timing_index > 1 {
            return Err(SubtitleError::parse(
                block.first_line,
                "unexpected text before timing line",
            ));
        }

        let line_number = block.first_line + timing_index;
        let timing_line = block.lines[timing_index];
        let caps = TIMING_REGEX
            .captures(timing_line)
            .ok_or_else(|| SubtitleError::parse(line_number, format!("malformed timing line '{}'", timing_line.trim())))?;

        let start_ms = timestamp::parse_clock(&caps[1])
            .map_err(|e| SubtitleError::parse(line_number, e.to_string()))?;
        let end_ms = timestamp::parse_clock(&caps[2])
            .map_err(|e| SubtitleError::parse(line_number, e.to_string()))?;
        if end_ms < start_ms {
            warn!("Line {}: end time precedes start time, clamping", line_number);
        }

        let text = markup::to_ass_text(&block.lines[timing_index + 1..]);
        events.push(SubtitleEvent::new(start_ms, end_ms, text));
    }

    Ok(SubtitleDocument::from_events(events))
}
