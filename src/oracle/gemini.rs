//! Gemini `generateContent` client.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::OracleConfig;
use crate::error::{OracleError, Result};
use crate::prompt::CompiledPrompt;
use crate::utils::preview;

use super::{transport_error, Oracle};

/// Header carrying the API key, keeping it out of request URLs.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini REST client.
pub struct GeminiOracle {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
    timeout_secs: u64,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Gemini error response format.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
    #[allow(dead_code)]
    code: Option<u16>,
    #[allow(dead_code)]
    status: Option<String>,
}

impl GeminiOracle {
    /// Create a client from configuration.
    pub fn from_config(config: &OracleConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .ok_or_else(|| {
                OracleError::Client(
                    "API key not provided and GEMINI_API_KEY env var not set".to_string(),
                )
            })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| OracleError::Client(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            timeout_secs: config.timeout_secs,
            temperature: config.temperature,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl Oracle for GeminiOracle {
    async fn complete(&self, prompt: &CompiledPrompt) -> std::result::Result<String, OracleError> {
        let request = GenerateRequest {
            contents: [Content {
                parts: [Part {
                    text: prompt.as_str(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
            },
        };

        tracing::debug!(model = %self.model, prompt_len = prompt.len(), "Calling Gemini");

        let response = self
            .client
            .post(self.endpoint())
            .header(API_KEY_HEADER, self.api_key.as_str())
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout_secs))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(e, self.timeout_secs))?;

        if !status.is_success() {
            // Quota and server errors stay retryable; anything else with a
            // structured payload is the endpoint refusing the request.
            return Err(match serde_json::from_str::<ErrorResponse>(&body) {
                Ok(err) if status.as_u16() != 429 && !status.is_server_error() => {
                    OracleError::Reported(err.error.message)
                }
                Ok(err) => OracleError::Status {
                    status: status.as_u16(),
                    body: err.error.message,
                },
                Err(_) => OracleError::Status {
                    status: status.as_u16(),
                    body: preview(&body, 200),
                },
            });
        }

        let parsed: GenerateResponse = serde_json::from_str(&body).map_err(|e| {
            OracleError::MalformedReply(format!("Failed to parse response: {}", e))
        })?;

        if let Some(err) = parsed.error {
            return Err(OracleError::Reported(err.message));
        }

        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .ok_or_else(|| OracleError::MalformedReply("Reply has no candidate text".to_string()))
    }

    fn name(&self) -> &str {
        "gemini"
    }
}
