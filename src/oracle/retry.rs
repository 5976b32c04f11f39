//! Retry wrapper for oracles.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::error::OracleError;
use crate::metrics::get_metrics;
use crate::prompt::CompiledPrompt;

use super::Oracle;

/// Upper bound on a single backoff delay.
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Retries transient failures with exponential backoff.
///
/// Only errors for which [`OracleError::is_transient`] holds are retried;
/// a reported or malformed reply is returned immediately.
pub struct RetryingOracle {
    inner: Arc<dyn Oracle>,
    max_retries: usize,
    retry_delay: Duration,
}

impl RetryingOracle {
    pub fn new(inner: Arc<dyn Oracle>, max_retries: usize, retry_delay: Duration) -> Self {
        Self {
            inner,
            max_retries,
            retry_delay,
        }
    }

    fn delay_for(&self, attempt: usize) -> Duration {
        let factor = 2u32.saturating_pow(u32::try_from(attempt).unwrap_or(u32::MAX));
        self.retry_delay
            .checked_mul(factor)
            .map_or(MAX_BACKOFF, |delay| delay.min(MAX_BACKOFF))
    }
}

#[async_trait]
impl Oracle for RetryingOracle {
    async fn complete(&self, prompt: &CompiledPrompt) -> Result<String, OracleError> {
        let mut attempt = 0;
        loop {
            match self.inner.complete(prompt).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    let delay = self.delay_for(attempt);
                    tracing::warn!(
                        oracle = self.inner.name(),
                        attempt = attempt + 1,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "Oracle request failed, retrying: {}",
                        e
                    );
                    get_metrics().oracle_retries_total.inc();
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
