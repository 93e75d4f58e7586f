/*!
 * Subtitle normalization pipeline.
 *
 * One `ConversionJob` in, one styled ASS file out:
 * parse, resolve styles, optionally convert text, inject insert configs,
 * write, optionally delete the source. Every step fails fast; nothing is
 * retried here (retries live in the converter wrapper).
 */

use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::app_config::{InsertConfig, NO_INSERTION, ShortReplyPolicy};
use crate::errors::ConversionError;
use crate::file_utils::FileManager;
use crate::providers::TextConverter;
use crate::subtitle::{
    self, Color, DEFAULT_STYLE_NAME, DocumentOrigin, ParsedSubtitle, ScriptInfo, Style, SubtitleDocument,
    SubtitleEvent,
};

/// Horizontal resolution written into every output
pub const PLAY_RES_X: &str = "1920";
/// Vertical resolution written into every output
pub const PLAY_RES_Y: &str = "1080";

/// Fully resolved parameters of one conversion
#[derive(Debug, Clone)]
pub struct ConversionJob {
    pub source: PathBuf,
    pub destination: PathBuf,
    /// Insert-config names to apply, in order
    pub selected_inserts: Vec<String>,
    /// Configured insert set the names are resolved against
    pub insert_configs: Arc<[InsertConfig]>,
    pub primary_color: Color,
    pub outline_color: Color,
    pub delete_original: bool,
    pub convert_text: bool,
    pub font_family: String,
    pub font_size: f64,
    pub short_reply_policy: ShortReplyPolicy,
}

impl ConversionJob {
    /// Job with the usual defaults: white text, black outline, Arial 40, nothing optional
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            selected_inserts: Vec::new(),
            insert_configs: Arc::from(Vec::<InsertConfig>::new()),
            primary_color: Color::WHITE,
            outline_color: Color::BLACK,
            delete_original: false,
            convert_text: false,
            font_family: "Arial".to_string(),
            font_size: 40.0,
            short_reply_policy: ShortReplyPolicy::default(),
        }
    }

    /// Default style this job creates when none can be kept
    pub fn fresh_default_style(&self) -> Style {
        Style {
            font_name: self.font_family.clone(),
            font_size: self.font_size,
            primary_color: self.primary_color,
            outline_color: self.outline_color,
            shadow: 1.0,
            ..Style::named(DEFAULT_STYLE_NAME)
        }
    }
}

/// Result of a successful conversion
#[derive(Debug)]
pub struct ConversionOutcome {
    /// The written ASS file
    pub output_path: PathBuf,
    /// Whether the source was removed
    pub source_deleted: bool,
    /// Set when removing the source failed; the output is still valid
    pub delete_error: Option<ConversionError>,
}

/// Script info written for sources without native styling
pub fn fresh_script_info() -> ScriptInfo {
    ScriptInfo::from_pairs([
        ("Title", "Default Aegisub file"),
        ("ScriptType", "v4.00+"),
        ("WrapStyle", "0"),
        ("ScaledBorderAndShadow", "yes"),
        ("YCbCr Matrix", "TV.601"),
        ("PlayResX", PLAY_RES_X),
        ("PlayResY", PLAY_RES_Y),
    ])
}

/// Apply the metadata and Default-style rules for the document's origin
pub fn resolve_styles(parsed: &mut ParsedSubtitle, job: &ConversionJob) {
    let document = &mut parsed.document;
    match parsed.origin {
        DocumentOrigin::Fresh => {
            document.info = fresh_script_info();
            document.styles.clear();
            document.styles.insert(job.fresh_default_style());
        }
        DocumentOrigin::PreExistingAss => {
            document.info.set_if_blank("PlayResX", PLAY_RES_X);
            document.info.set_if_blank("PlayResY", PLAY_RES_Y);

            match document.styles.get_mut(DEFAULT_STYLE_NAME) {
                Some(style) => {
                    style.primary_color = job.primary_color;
                    style.outline_color = job.outline_color;
                }
                None => document.styles.insert(job.fresh_default_style()),
            }
        }
    }
}

/// Rewrite every event's text through the converter, positionally
pub async fn convert_event_texts(
    document: &mut SubtitleDocument,
    converter: &dyn TextConverter,
    policy: ShortReplyPolicy,
) -> Result<(), ConversionError> {
    if document.events.is_empty() {
        debug!("No events to convert");
        return Ok(());
    }

    let combined = document
        .events
        .iter()
        .map(|event| event.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    let converted = converter.convert(&combined).await?;
    let lines: Vec<&str> = converted.split('\n').collect();

    let expected = document.events.len();
    let received = lines.len();
    if received < expected {
        match policy {
            ShortReplyPolicy::Fail => {
                return Err(ConversionError::TextConversionPartial { expected, received });
            }
            ShortReplyPolicy::KeepOriginal => warn!(
                "{} returned {} lines for {} events; the last {} keep their original text",
                converter.name(),
                received,
                expected,
                expected - received
            ),
        }
    } else if received > expected {
        warn!(
            "{} returned {} lines for {} events; ignoring the extra lines",
            converter.name(),
            received,
            expected
        );
    }

    for (event, line) in document.events.iter_mut().zip(lines) {
        event.text = line.to_string();
    }

    Ok(())
}

/// Append the selected insert configs as events, in selection order
///
/// The "no insertion" sentinel and names with no matching config are skipped.
pub fn inject_insert_configs(
    document: &mut SubtitleDocument,
    selected: &[String],
    configs: &[InsertConfig],
) -> Result<usize, ConversionError> {
    let mut appended = 0;

    for name in selected.iter().filter(|name| name.as_str() != NO_INSERTION) {
        let Some(config) = configs.iter().find(|c| &c.name == name) else {
            debug!("Insert config '{}' not found, skipping", name);
            continue;
        };

        let (start_ms, end_ms) = config.span_ms().map_err(|e| ConversionError::InvalidInsertConfig {
            name: config.name.clone(),
            message: e.to_string(),
        })?;
        document
            .events
            .push(SubtitleEvent::new(start_ms, end_ms, config.ass_statement.clone()));
        appended += 1;
    }

    Ok(appended)
}

/// Runs conversion jobs against a shared text converter
#[derive(Debug, Clone)]
pub struct SubtitleNormalizer {
    converter: Arc<dyn TextConverter>,
}

impl SubtitleNormalizer {
    pub fn new(converter: Arc<dyn TextConverter>) -> Self {
        Self { converter }
    }

    /// Convert one file
    pub async fn normalize(&self, job: &ConversionJob) -> Result<ConversionOutcome, ConversionError> {
        // 1. Parse
        let mut parsed = subtitle::load(&job.source)?;
        debug!(
            "Parsed {:?}: {} events, {} styles",
            job.source,
            parsed.document.events.len(),
            parsed.document.styles.len()
        );

        // 2. Styles and metadata
        resolve_styles(&mut parsed, job);

        // 3. Text conversion
        if job.convert_text {
            convert_event_texts(&mut parsed.document, self.converter.as_ref(), job.short_reply_policy).await?;
        }

        // 4. Insert configs
        let inserted = inject_insert_configs(&mut parsed.document, &job.selected_inserts, &job.insert_configs)?;
        if inserted > 0 {
            debug!("Appended {} insert config event(s)", inserted);
        }

        // 5. Write
        let content = subtitle::ass::to_ass_string(&parsed.document);
        FileManager::write_to_file(&job.destination, &content).map_err(|source| ConversionError::Write {
            path: job.destination.clone(),
            source,
        })?;

        // 6. Delete the source
        let mut outcome = ConversionOutcome {
            output_path: job.destination.clone(),
            source_deleted: false,
            delete_error: None,
        };
        if job.delete_original {
            if same_file(&job.source, &job.destination) {
                warn!("Not deleting {:?}: it is the output file", job.source);
            } else {
                match FileManager::remove_file(&job.source) {
                    Ok(()) => outcome.source_deleted = true,
                    Err(source) => {
                        let error = ConversionError::Delete {
                            path: job.source.clone(),
                            source,
                        };
                        warn!("{}", error);
                        outcome.delete_error = Some(error);
                    }
                }
            }
        }

        info!("Saved to {:?}", outcome.output_path);
        Ok(outcome)
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
