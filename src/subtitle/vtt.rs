use log::{debug, warn};

use super::markup;
use super::model::{SubtitleDocument, SubtitleEvent};
use super::srt::blocks;
use super::timestamp;
use crate::errors::SubtitleError;

// @module: WebVTT cue parser

/// Parse WebVTT content into a document holding only events
pub fn parse(content: &str) -> Result<SubtitleDocument, SubtitleError> {
    let mut all_blocks = blocks(content).into_iter();

    let header = all_blocks
        .next()
        .ok_or_else(|| SubtitleError::parse(1, "missing WEBVTT header"))?;
    let signature = header.lines[0].trim_start_matches('\u{feff}');
    if !signature.starts_with("WEBVTT") {
        return Err(SubtitleError::parse(header.first_line, "missing WEBVTT header"));
    }
    if header.lines.iter().any(|line| line.contains("-->")) {
        return Err(SubtitleError::parse(
            header.first_line,
            "cue must be separated from the WEBVTT header by a blank line",
        ));
    }

    let mut events = Vec::new();
    for block in all_blocks {
        let first = block.lines[0].trim_start();
        if ["NOTE", "STYLE", "REGION"].iter().any(|kw| first.starts_with(kw)) {
            debug!("Skipping WebVTT {} block at line {}", first.split_whitespace().next().unwrap_or(""), block.first_line);
            continue;
        }

        // An optional cue identifier may precede the timing line
        let timing_index = match block.lines.iter().take(2).position(|line| line.contains("-->")) {
            Some(index) => index,
            None => {
                return Err(SubtitleError::parse(block.first_line, "cue has no timing line"));
            }
        };
        let line_number = block.first_line + timing_index;
        let (start_ms, end_ms) = parse_timing(block.lines[timing_index])
            .map_err(|message| SubtitleError::parse(line_number, message))?;
        if end_ms < start_ms {
            warn!("Line {}: end time precedes start time, clamping", line_number);
        }

        let text = markup::decode_entities(&markup::to_ass_text(&block.lines[timing_index + 1..]));
        events.push(SubtitleEvent::new(start_ms, end_ms, text));
    }

    Ok(SubtitleDocument::from_events(events))
}

/// `start --> end [settings]`
fn parse_timing(line: &str) -> Result<(u64, u64), String> {
    let (start, rest) = line
        .split_once("-->")
        .ok_or_else(|| format!("malformed timing line '{}'", line.trim()))?;
    let end = rest.split_whitespace().next().unwrap_or("");

    let start_ms = timestamp::parse_clock(start).map_err(|e| e.to_string())?;
    let end_ms = timestamp::parse_clock(end).map_err(|e| e.to_string())?;

    Ok((start_ms, end_ms))
}
