/*!
 * # toass - batch subtitle normalizer
 *
 * Converts SRT, WebVTT and ASS subtitles into styled ASS scripts.
 *
 * ## Features
 *
 * - Parse SRT, WebVTT and ASS/SSA sources
 * - Fresh sources get a uniform 1920x1080 script with a configurable Default style
 * - Existing ASS scripts keep their styling; only the Default colors are patched
 * - Optional traditional-to-simplified Chinese conversion through zhconvert
 * - User-defined insert events (logos, credits) appended to every output
 * - Bounded concurrent batch processing with progress reporting
 *
 * ## Architecture
 *
 * - `subtitle`: Document model and per-format parsers/serializer
 * - `normalizer`: The per-file conversion pipeline
 * - `providers`: Text converters (zhconvert client, retry wrapper, mock)
 * - `app_config`: `sub.json` and `settings.json`
 * - `app_controller`: Batch driver
 * - `file_utils`: File system operations
 * - `errors`: Custom error types for the application
 */

#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod file_utils;
pub mod normalizer;
pub mod providers;
pub mod subtitle;

pub use app_config::{Config, InsertConfig, Settings, SubtitleConfigs};
pub use app_controller::{BatchOptions, BatchReport, Controller, JobResult, JobStatus};
pub use errors::{AppError, ConversionError, ProviderError, SubtitleError};
pub use normalizer::{ConversionJob, ConversionOutcome, SubtitleNormalizer};
pub use providers::TextConverter;
pub use subtitle::{Color, SubtitleDocument, SubtitleFormat};
