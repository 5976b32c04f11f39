//! Oracle trait definition.

use async_trait::async_trait;

use crate::error::OracleError;
use crate::prompt::CompiledPrompt;

/// A text-completion endpoint that answers compiled prompts.
///
/// Implementations return the raw generated text. Fence stripping and JSON
/// interpretation happen downstream.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Send one prompt and return the generated text.
    async fn complete(&self, prompt: &CompiledPrompt) -> Result<String, OracleError>;

    /// Short provider name for logs.
    fn name(&self) -> &str;
}
