use async_trait::async_trait;
use log::warn;
use std::time::Duration;

use super::TextConverter;
use crate::errors::ProviderError;

/// Retries transient failures of the wrapped converter with exponential backoff
#[derive(Debug)]
pub struct Retrying<C> {
    inner: C,
    /// Retries after the first attempt
    max_retries: u32,
    /// Delay before the first retry, doubled on each further retry
    backoff_base_ms: u64,
}

impl<C: TextConverter> Retrying<C> {
    pub fn new(inner: C, max_retries: u32, backoff_base_ms: u64) -> Self {
        Self {
            inner,
            max_retries,
            backoff_base_ms,
        }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.min(16);
        Duration::from_millis(self.backoff_base_ms.saturating_mul(factor))
    }
}

#[async_trait]
impl<C: TextConverter> TextConverter for Retrying<C> {
    async fn convert(&self, text: &str) -> Result<String, ProviderError> {
        let mut attempt = 0;
        loop {
            match self.inner.convert(text).await {
                Ok(converted) => return Ok(converted),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    let delay = self.backoff(attempt);
                    warn!(
                        "{} failed ({}), retrying in {}ms ({}/{})",
                        self.inner.name(),
                        e,
                        delay.as_millis(),
                        attempt + 1,
                        self.max_retries
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
