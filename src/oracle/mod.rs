//! Reasoning endpoint clients.
//!
//! An [`Oracle`] turns a compiled prompt into raw reply text. Two providers
//! are supported:
//!
//! - [`GeminiOracle`]: Google Gemini `generateContent` REST API.
//! - [`OllamaOracle`]: a locally hosted model behind Ollama's `/api/generate`.
//!
//! [`create_oracle`] wraps either in a [`RetryingOracle`] when retries are
//! configured.

mod gemini;
mod ollama;
mod retry;
mod traits;

pub use gemini::GeminiOracle;
pub use ollama::OllamaOracle;
pub use retry::RetryingOracle;
pub use traits::Oracle;

use std::sync::Arc;
use std::time::Duration;

use crate::config::{OracleConfig, OracleProvider};
use crate::error::{OracleError, Result};

/// Create an oracle from configuration.
pub fn create_oracle(config: &OracleConfig) -> Result<Arc<dyn Oracle>> {
    let oracle: Arc<dyn Oracle> = match config.provider {
        OracleProvider::Gemini => Arc::new(GeminiOracle::from_config(config)?),
        OracleProvider::Ollama => Arc::new(OllamaOracle::from_config(config)?),
    };

    tracing::info!(
        provider = oracle.name(),
        model = %config.model,
        max_retries = config.max_retries,
        "Oracle configured"
    );

    if config.max_retries == 0 {
        return Ok(oracle);
    }
    Ok(Arc::new(RetryingOracle::new(
        oracle,
        config.max_retries,
        Duration::from_millis(config.retry_delay_ms),
    )))
}

/// Map a transport failure onto the oracle error taxonomy. The request URL
/// is stripped from the message.
pub(crate) fn transport_error(err: reqwest::Error, timeout_secs: u64) -> OracleError {
    let err = err.without_url();
    if err.is_timeout() {
        OracleError::Timeout(timeout_secs)
    } else if err.is_connect() {
        OracleError::Unreachable(format!("Connection failed: {}", err))
    } else if err.is_decode() || err.is_body() {
        OracleError::MalformedReply(format!("Failed to read response: {}", err))
    } else {
        OracleError::Unreachable(format!("Request failed: {}", err))
    }
}
