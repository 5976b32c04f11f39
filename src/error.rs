//! Error types for the NLQ gateway.

use thiserror::Error;

/// Main error type for gateway operations.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Configuration-related errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// Failures talking to the reasoning endpoint.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Endpoint unreachable: {0}")]
    Unreachable(String),

    #[error("Endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The endpoint answered with a structured error payload.
    #[error("Endpoint reported an error: {0}")]
    Reported(String),

    #[error("Malformed reply: {0}")]
    MalformedReply(String),

    #[error("Client setup failed: {0}")]
    Client(String),
}

impl OracleError {
    /// Whether another attempt may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            OracleError::Timeout(_) | OracleError::Unreachable(_) => true,
            OracleError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Transport-level failures mean the service could not be reached at all.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            OracleError::Timeout(_) | OracleError::Unreachable(_) | OracleError::Status { .. }
        )
    }
}

/// Failures executing a generated statement against the database.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("Statement timed out after {0}s")]
    Timeout(u64),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Statement rejected: {0}")]
    Rejected(String),

    #[error("Connection failed: {0}")]
    Connection(String),
}

impl From<sqlx::Error> for ExecutionError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                ExecutionError::Connection(err.to_string())
            }
            sqlx::Error::Database(db) => ExecutionError::Database(db.message().to_string()),
            other => ExecutionError::Database(other.to_string()),
        }
    }
}

/// Authentication errors.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Missing token")]
    MissingToken,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token signing secret not configured")]
    MissingSecret,

    #[error("Token generation failed: {0}")]
    TokenGeneration(String),
}

/// Result type alias for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GatewayError::Config(ConfigError::MissingField("oracle.model".to_string()));
        assert!(err.to_string().contains("oracle.model"));
    }

    #[test]
    fn test_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: GatewayError = io_err.into();
        assert!(matches!(err, GatewayError::Io(_)));
    }

    #[test]
    fn test_transient_classification() {
        assert!(OracleError::Timeout(30).is_transient());
        assert!(OracleError::Unreachable("refused".into()).is_transient());
        assert!(OracleError::Status { status: 503, body: String::new() }.is_transient());
        assert!(OracleError::Status { status: 429, body: String::new() }.is_transient());
        assert!(!OracleError::Status { status: 400, body: String::new() }.is_transient());
        assert!(!OracleError::Reported("bad key".into()).is_transient());
        assert!(!OracleError::MalformedReply("no text".into()).is_transient());
    }

    #[test]
    fn test_unavailable_classification() {
        assert!(OracleError::Timeout(5).is_unavailable());
        assert!(!OracleError::Reported("quota".into()).is_unavailable());
    }
}
