//! NLQ Gateway: natural-language questions over the academic records database.
//!
//! A question is compiled into a prompt together with the schema, sent to a
//! reasoning endpoint, and the reply is interpreted as a read, a write or a
//! chat answer. Reads and writes are executed against MySQL and every
//! outcome, including failures, is returned as a uniform envelope.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod intent;
pub mod metrics;
pub mod oracle;
pub mod prompt;
pub mod schema;
pub mod store;
pub mod utils;

pub use api::{create_rest_router, ApiResult, ApiState};
pub use auth::{AuthLayer, AuthMiddleware, Authenticator, TokenClaims};
pub use config::Config;
pub use error::{AuthError, ConfigError, ExecutionError, GatewayError, OracleError, Result};
pub use gateway::{EnvelopeData, Gateway, IntentRouter, RequestStage, ResultEnvelope};
pub use intent::{GeneratedStatement, Intent, IntentKind, ResponseInterpreter};
pub use metrics::{get_metrics, HealthCheck, HealthState, HealthStatus, Metrics};
pub use oracle::{create_oracle, GeminiOracle, OllamaOracle, Oracle, RetryingOracle};
pub use prompt::{CompiledPrompt, PromptCompiler, PromptRules};
pub use schema::{academic_schema, SchemaDescriptor, SCHEMA_VERSION};
pub use store::{MySqlExecutor, QueryExecutor, Row, StatementGuard};
