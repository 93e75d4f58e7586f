/*!
 * Mock converter for testing.
 *
 * Simulates the behaviors the pipeline has to cope with:
 * - `MockConverter::identity()` - returns the input unchanged
 * - `MockConverter::mapping(f)` - applies a function to every line
 * - `MockConverter::dropping_last_line(f)` - like mapping, but one line short
 * - `MockConverter::failing()` - always fails with a transient error
 */

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::TextConverter;
use crate::errors::ProviderError;

/// Behavior mode for the mock converter
#[derive(Clone, Copy)]
pub enum MockBehavior {
    /// Echo the input
    Identity,
    /// Apply a function to each line
    Mapping(fn(&str) -> String),
    /// Apply a function to each line, then drop the last one
    DropLastLine(fn(&str) -> String),
    /// Always fail with a connection error
    Failing,
    /// Always fail with a non-retryable service error
    Rejecting,
    /// Fail with a connection error for the first N calls, then echo
    FailFirst { failures: usize },
}

impl std::fmt::Debug for MockBehavior {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Identity => write!(f, "Identity"),
            Self::Mapping(_) => write!(f, "Mapping"),
            Self::DropLastLine(_) => write!(f, "DropLastLine"),
            Self::Failing => write!(f, "Failing"),
            Self::Rejecting => write!(f, "Rejecting"),
            Self::FailFirst { failures } => write!(f, "FailFirst({})", failures),
        }
    }
}

/// Mock converter for testing conversion behavior
#[derive(Debug)]
pub struct MockConverter {
    /// Behavior mode
    behavior: MockBehavior,
    /// Number of calls seen so far
    calls: Arc<AtomicUsize>,
}

impl MockConverter {
    /// Create a new mock converter with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn identity() -> Self {
        Self::new(MockBehavior::Identity)
    }

    pub fn mapping(f: fn(&str) -> String) -> Self {
        Self::new(MockBehavior::Mapping(f))
    }

    pub fn dropping_last_line(f: fn(&str) -> String) -> Self {
        Self::new(MockBehavior::DropLastLine(f))
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Number of `convert` calls made so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn map_lines(text: &str, f: fn(&str) -> String) -> Vec<String> {
        text.split('\n').map(f).collect()
    }
}

#[async_trait]
impl TextConverter for MockConverter {
    async fn convert(&self, text: &str) -> Result<String, ProviderError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);

        match self.behavior {
            MockBehavior::Identity => Ok(text.to_string()),
            MockBehavior::Mapping(f) => Ok(Self::map_lines(text, f).join("\n")),
            MockBehavior::DropLastLine(f) => {
                let mut lines = Self::map_lines(text, f);
                lines.pop();
                Ok(lines.join("\n"))
            }
            MockBehavior::Failing => Err(ProviderError::ConnectionError("mock connection refused".to_string())),
            MockBehavior::Rejecting => Err(ProviderError::ServiceError {
                code: 1,
                message: "mock rejection".to_string(),
            }),
            MockBehavior::FailFirst { failures } if call < failures => {
                Err(ProviderError::ConnectionError(format!("mock failure {}", call + 1)))
            }
            MockBehavior::FailFirst { .. } => Ok(text.to_string()),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
