/*!
 * Advanced SubStation Alpha reader and writer.
 *
 * The reader follows the `Format:` lines of the styles and events sections,
 * so both V4+ (ASS) and V4 (SSA) field orders are understood. Sections it
 * does not interpret (`[Fonts]`, `[Graphics]`, `[Aegisub Project Garbage]`,
 * ...) are carried through verbatim.
 */

use log::{debug, warn};
use std::fmt::Write;

use super::model::{Color, EventKind, RawSection, ScriptInfo, Style, SubtitleDocument, SubtitleEvent};
use super::timestamp;
use crate::errors::SubtitleError;

const STYLE_FORMAT: &str = "Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding";
const EVENT_FORMAT: &str = "Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text";

/// Whether content looks like an ASS/SSA script rather than SubRip
pub fn looks_like_ass(content: &str) -> bool {
    content.lines().any(|line| {
        let header = line.trim().to_ascii_lowercase();
        header == "[script info]" || header == "[v4+ styles]" || header == "[v4 styles]" || header == "[events]"
    })
}

enum Section {
    None,
    ScriptInfo,
    Styles,
    Events,
    Raw(usize),
}

fn format_fields(line: &str) -> Vec<String> {
    line.split(',').map(|f| f.trim().to_ascii_lowercase()).collect()
}

fn default_fields(format: &str) -> Vec<String> {
    format_fields(format)
}

/// Parse ASS content into a document
pub fn parse(content: &str) -> Result<SubtitleDocument, SubtitleError> {
    let mut document = SubtitleDocument::new();
    let mut info_pairs: Vec<(String, String)> = Vec::new();
    let mut section = Section::None;
    let mut style_fields = default_fields(STYLE_FORMAT);
    let mut event_fields = default_fields(EVENT_FORMAT);

    for (index, raw_line) in content.lines().enumerate() {
        let line_number = index + 1;
        let line = raw_line.trim_start_matches('\u{feff}');
        let trimmed = line.trim();

        if trimmed.starts_with('[') && trimmed.ends_with(']') {
            let name = &trimmed[1..trimmed.len() - 1];
            section = match name.to_ascii_lowercase().as_str() {
                "script info" => Section::ScriptInfo,
                "v4+ styles" | "v4 styles" => Section::Styles,
                "events" => Section::Events,
                _ => {
                    document.extra_sections.push(RawSection { name: name.to_string(), lines: Vec::new() });
                    Section::Raw(document.extra_sections.len() - 1)
                }
            };
            continue;
        }

        if let Section::Raw(idx) = section {
            if !trimmed.is_empty() {
                document.extra_sections[idx].lines.push(line.to_string());
            }
            continue;
        }

        if trimmed.is_empty() || trimmed.starts_with(';') {
            continue;
        }

        let Some((key, value)) = trimmed.split_once(':') else {
            debug!("Line {}: ignoring '{}'", line_number, trimmed);
            continue;
        };
        let key = key.trim();
        let value = value.trim_start();

        match section {
            Section::None => {
                return Err(SubtitleError::parse(line_number, "content before the first section header"));
            }
            Section::ScriptInfo => info_pairs.push((key.to_string(), value.trim_end().to_string())),
            Section::Styles => match key.to_ascii_lowercase().as_str() {
                "format" => style_fields = format_fields(value),
                "style" => {
                    let style = parse_style(value, &style_fields, line_number)?;
                    document.styles.insert(style);
                }
                _ => debug!("Line {}: ignoring '{}' in styles", line_number, key),
            },
            Section::Events => match key.to_ascii_lowercase().as_str() {
                "format" => event_fields = format_fields(value),
                "dialogue" => document.events.push(parse_event(value, &event_fields, EventKind::Dialogue, line_number)?),
                "comment" => document.events.push(parse_event(value, &event_fields, EventKind::Comment, line_number)?),
                _ => debug!("Line {}: ignoring '{}' event", line_number, key),
            },
            Section::Raw(_) => {}
        }
    }

    document.info = ScriptInfo::from_pairs(info_pairs);
    Ok(document)
}

fn parse_number<T: std::str::FromStr>(value: &str, field: &str, line: usize) -> Result<T, SubtitleError> {
    value
        .trim()
        .parse()
        .map_err(|_| SubtitleError::parse(line, format!("invalid {} '{}'", field, value.trim())))
}

fn parse_flag(value: &str, field: &str, line: usize) -> Result<bool, SubtitleError> {
    parse_number::<i32>(value, field, line).map(|v| v != 0)
}

fn parse_color(value: &str, field: &str, line: usize) -> Result<Color, SubtitleError> {
    value
        .parse()
        .map_err(|_| SubtitleError::parse(line, format!("invalid {} '{}'", field, value.trim())))
}

fn parse_style(value: &str, fields: &[String], line: usize) -> Result<Style, SubtitleError> {
    let values: Vec<&str> = value.split(',').collect();
    if values.len() < fields.len() {
        return Err(SubtitleError::parse(
            line,
            format!("style has {} fields, format declares {}", values.len(), fields.len()),
        ));
    }

    let mut style = Style::default();
    for (field, raw) in fields.iter().zip(values.iter()) {
        let raw = raw.trim();
        match field.as_str() {
            "name" => style.name = raw.to_string(),
            "fontname" => style.font_name = raw.to_string(),
            "fontsize" => style.font_size = parse_number(raw, field, line)?,
            "primarycolour" => style.primary_color = parse_color(raw, field, line)?,
            "secondarycolour" => style.secondary_color = parse_color(raw, field, line)?,
            "outlinecolour" | "tertiarycolour" => style.outline_color = parse_color(raw, field, line)?,
            "backcolour" => style.back_color = parse_color(raw, field, line)?,
            "bold" => style.bold = parse_flag(raw, field, line)?,
            "italic" => style.italic = parse_flag(raw, field, line)?,
            "underline" => style.underline = parse_flag(raw, field, line)?,
            "strikeout" => style.strike_out = parse_flag(raw, field, line)?,
            "scalex" => style.scale_x = parse_number(raw, field, line)?,
            "scaley" => style.scale_y = parse_number(raw, field, line)?,
            "spacing" => style.spacing = parse_number(raw, field, line)?,
            "angle" => style.angle = parse_number(raw, field, line)?,
            "borderstyle" => style.border_style = parse_number(raw, field, line)?,
            "outline" => style.outline = parse_number(raw, field, line)?,
            "shadow" => style.shadow = parse_number(raw, field, line)?,
            "alignment" => style.alignment = parse_number(raw, field, line)?,
            "marginl" => style.margin_l = parse_number(raw, field, line)?,
            "marginr" => style.margin_r = parse_number(raw, field, line)?,
            "marginv" => style.margin_v = parse_number(raw, field, line)?,
            "encoding" => style.encoding = parse_number(raw, field, line)?,
            other => debug!("Line {}: ignoring style field '{}'", line, other),
        }
    }

    Ok(style)
}

fn parse_event(value: &str, fields: &[String], kind: EventKind, line: usize) -> Result<SubtitleEvent, SubtitleError> {
    // Text is last and may itself contain commas
    let values: Vec<&str> = value.splitn(fields.len(), ',').collect();
    if values.len() < fields.len() {
        return Err(SubtitleError::parse(
            line,
            format!("event has {} fields, format declares {}", values.len(), fields.len()),
        ));
    }

    let mut event = SubtitleEvent { kind, ..SubtitleEvent::default() };
    for (field, raw) in fields.iter().zip(values.iter()) {
        match field.as_str() {
            "text" => event.text = raw.to_string(),
            "layer" => event.layer = parse_number(raw, field, line)?,
            "marked" => {
                event.layer = raw.trim().trim_start_matches("Marked=").parse().unwrap_or(0);
            }
            "start" => {
                event.start_ms = timestamp::parse_ass_time(raw).map_err(|e| SubtitleError::parse(line, e.to_string()))?;
            }
            "end" => {
                event.end_ms = timestamp::parse_ass_time(raw).map_err(|e| SubtitleError::parse(line, e.to_string()))?;
            }
            "style" => event.style = Some(raw.trim().trim_start_matches('*').to_string()),
            "name" | "actor" => event.name = raw.trim().to_string(),
            "marginl" => event.margin_l = parse_number(raw, field, line)?,
            "marginr" => event.margin_r = parse_number(raw, field, line)?,
            "marginv" => event.margin_v = parse_number(raw, field, line)?,
            "effect" => event.effect = raw.trim().to_string(),
            other => debug!("Line {}: ignoring event field '{}'", line, other),
        }
    }

    if event.end_ms < event.start_ms {
        warn!("Line {}: end time precedes start time, clamping", line);
        event.end_ms = event.start_ms;
    }

    Ok(event)
}

/// Render a number the way ASS tools do: no trailing `.0` on whole values
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

fn format_flag(value: bool) -> &'static str {
    if value { "-1" } else { "0" }
}

fn format_style(style: &Style) -> String {
    format!(
        "Style: {},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
        style.name,
        style.font_name,
        format_number(style.font_size),
        style.primary_color,
        style.secondary_color,
        style.outline_color,
        style.back_color,
        format_flag(style.bold),
        format_flag(style.italic),
        format_flag(style.underline),
        format_flag(style.strike_out),
        format_number(style.scale_x),
        format_number(style.scale_y),
        format_number(style.spacing),
        format_number(style.angle),
        style.border_style,
        format_number(style.outline),
        format_number(style.shadow),
        style.alignment,
        style.margin_l,
        style.margin_r,
        style.margin_v,
        style.encoding,
    )
}

fn format_event(event: &SubtitleEvent) -> String {
    format!(
        "{}: {},{},{},{},{},{},{},{},{},{}",
        event.kind.as_str(),
        event.layer,
        timestamp::format_ass_time(event.start_ms),
        timestamp::format_ass_time(event.end_ms),
        event.style_name(),
        event.name,
        event.margin_l,
        event.margin_r,
        event.margin_v,
        event.effect,
        event.text,
    )
}

/// Serialize a document as an ASS script
pub fn to_ass_string(document: &SubtitleDocument) -> String {
    // Styles are always written in V4+ layout
    let mut info = document.info.clone();
    info.set_or_prepend("ScriptType", "v4.00+");

    let mut out = String::new();
    out.push_str("[Script Info]\n");
    out.push_str("; Script generated by toass\n");
    for (key, value) in info.iter() {
        let _ = writeln!(out, "{}: {}", key, value);
    }

    out.push_str("\n[V4+ Styles]\n");
    let _ = writeln!(out, "Format: {}", STYLE_FORMAT);
    for style in document.styles.iter() {
        let _ = writeln!(out, "{}", format_style(style));
    }

    out.push_str("\n[Events]\n");
    let _ = writeln!(out, "Format: {}", EVENT_FORMAT);
    for event in &document.events {
        let _ = writeln!(out, "{}", format_event(event));
    }

    for section in &document.extra_sections {
        let _ = writeln!(out, "\n[{}]", section.name);
        for line in &section.lines {
            let _ = writeln!(out, "{}", line);
        }
    }

    out
}
