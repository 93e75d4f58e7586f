/*!
 * Subtitle file handling.
 *
 * - `model`: format-independent document types
 * - `srt`, `vtt`, `ass`: per-format readers, plus the ASS writer
 * - `timestamp`: clock parsing/formatting for every syntax
 * - `markup`: SRT/WebVTT inline tags to ASS override tags
 */

pub mod ass;
pub mod markup;
pub mod model;
pub mod srt;
pub mod timestamp;
pub mod vtt;

use std::fmt;
use std::path::Path;

pub use model::{
    Color, EventKind, RawSection, ScriptInfo, Style, StyleSheet, SubtitleDocument, SubtitleEvent,
    DEFAULT_STYLE_NAME,
};

use crate::errors::{ConversionError, SubtitleError};

/// Source formats accepted by the converter, keyed by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtitleFormat {
    Srt,
    WebVtt,
    Ass,
}

impl SubtitleFormat {
    /// Extensions accepted as input, lowercase and without the dot
    pub const EXTENSIONS: [&'static str; 3] = ["srt", "vtt", "ass"];

    /// Format indicated by a file extension (case-insensitive)
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "srt" => Some(Self::Srt),
            "vtt" => Some(Self::WebVtt),
            "ass" => Some(Self::Ass),
            _ => None,
        }
    }

    /// Format indicated by a path's extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Whether the converter should preserve the source's own styling
    pub fn origin(self) -> DocumentOrigin {
        match self {
            Self::Ass => DocumentOrigin::PreExistingAss,
            Self::Srt | Self::WebVtt => DocumentOrigin::Fresh,
        }
    }
}

impl fmt::Display for SubtitleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Srt => "SRT",
            Self::WebVtt => "WebVTT",
            Self::Ass => "ASS",
        };
        write!(f, "{}", name)
    }
}

/// Where a parsed document came from, which decides how styles are resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentOrigin {
    /// Source carried no styling worth keeping (SRT, WebVTT)
    Fresh,
    /// Source was already an ASS script
    PreExistingAss,
}

/// A document together with the origin tag produced while parsing it
#[derive(Debug, Clone)]
pub struct ParsedSubtitle {
    pub document: SubtitleDocument,
    pub origin: DocumentOrigin,
}

/// Parse content according to its extension-indicated format.
///
/// `.srt` and `.ass` share one grammar: the content decides whether ASS or
/// SubRip rules apply. `.vtt` always uses the WebVTT cue grammar.
pub fn parse(content: &str, format: SubtitleFormat) -> Result<ParsedSubtitle, SubtitleError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let document = match format {
        SubtitleFormat::WebVtt => vtt::parse(content)?,
        SubtitleFormat::Srt | SubtitleFormat::Ass => {
            if ass::looks_like_ass(content) {
                ass::parse(content)?
            } else {
                srt::parse(content)?
            }
        }
    };

    Ok(ParsedSubtitle {
        document,
        origin: format.origin(),
    })
}

/// Read and parse a subtitle file
pub fn load(path: &Path) -> Result<ParsedSubtitle, ConversionError> {
    let format = SubtitleFormat::from_path(path).ok_or_else(|| ConversionError::UnsupportedFormat {
        path: path.to_path_buf(),
    })?;

    let content = std::fs::read_to_string(path).map_err(|source| ConversionError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    parse(&content, format).map_err(|source| ConversionError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
