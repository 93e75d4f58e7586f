//! Conversion of SRT/WebVTT inline markup into ASS text.

use once_cell::sync::Lazy;
use regex::Regex;

static STYLE_TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<\s*(/?)\s*([ibus])\s*>").unwrap()
});

static ANY_TAG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Turn the text lines of one SRT/WebVTT cue into a single ASS text field
pub fn to_ass_text(lines: &[&str]) -> String {
    let joined = lines
        .iter()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\\N");

    let styled = STYLE_TAG_REGEX.replace_all(&joined, |caps: &regex::Captures| {
        let state = if caps[1].is_empty() { 1 } else { 0 };
        format!("{{\\{}{}}}", caps[2].to_ascii_lowercase(), state)
    });

    ANY_TAG_REGEX.replace_all(&styled, "").into_owned()
}

/// Decode the HTML entities WebVTT requires in cue text
pub fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", "\\h")
        .replace("&lrm;", "")
        .replace("&rlm;", "")
        .replace("&amp;", "&")
}
