//! Ollama `/api/generate` client for locally hosted models.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::OracleConfig;
use crate::error::{OracleError, Result};
use crate::prompt::CompiledPrompt;
use crate::utils::preview;

use super::{transport_error, Oracle};

pub struct OllamaOracle {
    client: Client,
    base_url: String,
    model: String,
    timeout_secs: u64,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    /// Constrains the model to emit a JSON document.
    format: &'static str,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: Option<String>,
    error: Option<String>,
}

impl OllamaOracle {
    pub fn from_config(config: &OracleConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| OracleError::Client(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            timeout_secs: config.timeout_secs,
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl Oracle for OllamaOracle {
    async fn complete(&self, prompt: &CompiledPrompt) -> std::result::Result<String, OracleError> {
        let url = format!("{}/api/generate", self.base_url);
        let request = GenerateRequest {
            model: &self.model,
            prompt: prompt.as_str(),
            stream: false,
            format: "json",
            options: GenerateOptions {
                temperature: self.temperature,
            },
        };

        tracing::debug!(model = %self.model, prompt_len = prompt.len(), "Calling Ollama");

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout_secs))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(e, self.timeout_secs))?;

        let parsed = serde_json::from_str::<GenerateResponse>(&body);

        if !status.is_success() {
            return Err(match parsed {
                // Unknown model and similar request errors come back as 404/400.
                Ok(GenerateResponse {
                    error: Some(message),
                    ..
                }) if status.is_client_error() => OracleError::Reported(message),
                _ => OracleError::Status {
                    status: status.as_u16(),
                    body: preview(&body, 200),
                },
            });
        }

        match parsed {
            Ok(GenerateResponse {
                error: Some(message),
                ..
            }) => Err(OracleError::Reported(message)),
            Ok(GenerateResponse {
                response: Some(text),
                ..
            }) => Ok(text),
            Ok(_) => Err(OracleError::MalformedReply(
                "Reply has no response field".to_string(),
            )),
            Err(e) => Err(OracleError::MalformedReply(format!(
                "Failed to parse response: {}",
                e
            ))),
        }
    }

    fn name(&self) -> &str {
        "ollama"
    }
}
