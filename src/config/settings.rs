//! Configuration settings for the NLQ gateway.

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub oracle: OracleConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::ReadFile)?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default locations or use defaults.
    pub fn load() -> Result<Self> {
        let config_paths = [
            PathBuf::from("config.toml"),
            PathBuf::from("nlq-gateway.toml"),
            dirs::config_dir()
                .map(|p| p.join("nlq-gateway/config.toml"))
                .unwrap_or_default(),
        ];

        for path in &config_paths {
            if path.is_file() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        let config = Config::default();
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<()> {
        if self.oracle.base_url.is_empty() {
            return Err(ConfigError::MissingField("oracle.base_url".to_string()).into());
        }
        if self.oracle.model.is_empty() {
            return Err(ConfigError::MissingField("oracle.model".to_string()).into());
        }
        if self.oracle.timeout_secs == 0 {
            return Err(ConfigError::Invalid("oracle.timeout_secs must be > 0".to_string()).into());
        }
        if self.database.statement_timeout_secs == 0 {
            return Err(
                ConfigError::Invalid("database.statement_timeout_secs must be > 0".to_string())
                    .into(),
            );
        }
        if self.database.max_connections == 0 {
            return Err(
                ConfigError::Invalid("database.max_connections must be > 0".to_string()).into(),
            );
        }
        for prefix in &self.auth.public_prefixes {
            if !prefix.starts_with('/') {
                return Err(ConfigError::Invalid(format!(
                    "auth.public_prefixes entry '{}' must start with '/'",
                    prefix
                ))
                .into());
            }
        }
        Ok(())
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins ("*" allows any)
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors_origins: vec!["*".to_string()],
        }
    }
}

/// Reasoning endpoint provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OracleProvider {
    Gemini,
    Ollama,
}

/// Reasoning endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    pub provider: OracleProvider,
    /// Base URL of the endpoint
    pub base_url: String,
    /// Model name
    pub model: String,
    /// API key (loaded from GEMINI_API_KEY if not set)
    pub api_key: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Retries for transient transport failures (0 disables)
    pub max_retries: usize,
    /// Base delay between retries, doubled per attempt
    pub retry_delay_ms: u64,
    /// Sampling temperature
    pub temperature: f32,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            provider: OracleProvider::Gemini,
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.5-flash".to_string(),
            api_key: None,
            timeout_secs: 60,
            max_retries: 2,
            retry_delay_ms: 500,
            temperature: 0.1,
        }
    }
}

/// Shape checks applied to generated statements before execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuardMode {
    /// Execute generated SQL unchecked.
    #[default]
    Off,
    /// Reject multi-statement text, DDL, and statements whose verb does not match the intent.
    Strict,
}

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Connection URL (loaded from DATABASE_URL if not set)
    pub url: Option<String>,
    pub max_connections: u32,
    /// Upper bound on a single statement, in seconds
    pub statement_timeout_secs: u64,
    pub guard: GuardMode,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            statement_timeout_secs: 30,
            guard: GuardMode::Off,
        }
    }
}

impl DatabaseConfig {
    /// Resolve the connection URL from config or environment.
    pub fn resolve_url(&self) -> Result<String> {
        self.url
            .clone()
            .or_else(|| std::env::var("DATABASE_URL").ok())
            .ok_or_else(|| ConfigError::MissingField("database.url".to_string()).into())
    }
}

/// Request gatekeeper configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub enabled: bool,
    /// HS256 signing secret (loaded from NLQ_JWT_SECRET if empty)
    pub secret: String,
    /// Header carrying the token
    pub header: String,
    /// Path prefixes reachable without a token
    pub public_prefixes: Vec<String>,
    /// Lifetime of generated tokens in seconds
    pub expiry_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            secret: String::new(),
            header: "token".to_string(),
            public_prefixes: vec!["/ai".to_string(), "/login".to_string(), "/health".to_string()],
            expiry_secs: 12 * 60 * 60,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is unset
    pub level: String,
    /// Emit JSON lines
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}
