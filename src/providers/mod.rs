/*!
 * Text-conversion providers.
 *
 * The conversion pipeline only ever sees the `TextConverter` trait:
 * - `zhconvert`: HTTP client for the zhconvert traditional/simplified service
 * - `retry`: bounded retry with exponential backoff around any converter
 * - `mock`: scripted converter for tests
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// Opaque text-to-text service
///
/// Implementations must return the converted text with its line structure
/// intact: one output line per input line, in the same order.
#[async_trait]
pub trait TextConverter: Send + Sync + Debug {
    /// Convert a blob of newline-separated text
    async fn convert(&self, text: &str) -> Result<String, ProviderError>;

    /// Short name used in log messages
    fn name(&self) -> &str;
}

pub mod mock;
pub mod retry;
pub mod zhconvert;

pub use mock::MockConverter;
pub use retry::Retrying;
pub use zhconvert::ZhConvert;
