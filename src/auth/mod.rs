//! Request gatekeeper.
//!
//! Requests to public path prefixes pass through. Everything else must carry
//! an HS256-signed JWT in the configured header (`token` by default).

mod middleware;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::error::{AuthError, Result};

pub use middleware::{AuthLayer, AuthMiddleware};

/// JWT claims carried by portal tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Staff member id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Expiration time (Unix timestamp).
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
}

/// Validates tokens and decides which paths need one.
#[derive(Clone)]
pub struct Authenticator {
    config: AuthConfig,
    secret: String,
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("enabled", &self.config.enabled)
            .field("header", &self.config.header)
            .field("public_prefixes", &self.config.public_prefixes)
            .finish_non_exhaustive()
    }
}

impl Authenticator {
    /// Create an authenticator. Fails when auth is enabled but no secret is
    /// configured in the file or in `NLQ_JWT_SECRET`.
    pub fn new(config: AuthConfig) -> Result<Self> {
        let secret = if config.secret.is_empty() {
            std::env::var("NLQ_JWT_SECRET").unwrap_or_default()
        } else {
            config.secret.clone()
        };

        if config.enabled && secret.is_empty() {
            return Err(AuthError::MissingSecret.into());
        }

        Ok(Self { config, secret })
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Header the token is read from.
    pub fn header_name(&self) -> &str {
        &self.config.header
    }

    /// Whether `path` falls under a public prefix. A prefix matches the
    /// exact path or any path continuing with `/`.
    pub fn is_public(&self, path: &str) -> bool {
        self.config.public_prefixes.iter().any(|prefix| {
            let prefix = prefix.trim_end_matches('/');
            if prefix.is_empty() {
                return true;
            }
            path.strip_prefix(prefix)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
    }

    /// Validate a token and return its claims.
    pub fn validate(&self, token: Option<&str>) -> Result<TokenClaims> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;

        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<TokenClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        Ok(data.claims)
    }

    /// Issue a token for a staff member.
    pub fn generate_token(&self, id: i64, username: &str) -> Result<String> {
        if self.secret.is_empty() {
            return Err(AuthError::MissingSecret.into());
        }

        let now = Utc::now();
        let claims = TokenClaims {
            id: Some(id),
            username: Some(username.to_string()),
            exp: (now + Duration::seconds(self.config.expiry_secs as i64)).timestamp(),
            iat: Some(now.timestamp()),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenGeneration(e.to_string()).into())
    }
}
