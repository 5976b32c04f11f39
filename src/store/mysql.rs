//! MySQL executor backed by a sqlx connection pool.

use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::mysql::{MySql, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{Column, Decode, Executor as _, Row as _, Type, TypeInfo};
use std::future::Future;
use std::time::Duration;

use crate::config::DatabaseConfig;
use crate::error::{ExecutionError, Result};

use super::{QueryExecutor, Row};

const START_READ_ONLY: &str = "START TRANSACTION READ ONLY";

/// Executes statements on a MySQL pool, bounding each by a timeout.
pub struct MySqlExecutor {
    pool: MySqlPool,
    statement_timeout: Duration,
}

impl MySqlExecutor {
    /// Connect eagerly, failing if the database cannot be reached.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let url = config.resolve_url()?;
        tracing::info!(url = %mask_database_url(&url), "Connecting to database");

        let pool = pool_options(config).connect(&url).await.map_err(|e| {
            tracing::warn!("Failed to connect to database: {}", e);
            ExecutionError::from(e)
        })?;

        tracing::info!("Database connection pool created");
        Ok(Self::with_pool(pool, config))
    }

    /// Create the pool without connecting. Connections open on first use.
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<Self> {
        let url = config.resolve_url()?;
        tracing::info!(url = %mask_database_url(&url), "Configuring lazy database pool");

        let pool = pool_options(config)
            .connect_lazy(&url)
            .map_err(ExecutionError::from)?;
        Ok(Self::with_pool(pool, config))
    }

    pub fn with_pool(pool: MySqlPool, config: &DatabaseConfig) -> Self {
        Self {
            pool,
            statement_timeout: Duration::from_secs(config.statement_timeout_secs),
        }
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    async fn bounded<T, F>(&self, fut: F) -> std::result::Result<T, ExecutionError>
    where
        F: Future<Output = std::result::Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.statement_timeout, fut).await {
            Ok(result) => result.map_err(ExecutionError::from),
            Err(_) => Err(ExecutionError::Timeout(self.statement_timeout.as_secs())),
        }
    }
}

fn pool_options(config: &DatabaseConfig) -> MySqlPoolOptions {
    MySqlPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.statement_timeout_secs))
        .idle_timeout(Duration::from_secs(600))
}

#[async_trait]
impl QueryExecutor for MySqlExecutor {
    /// Runs inside a `READ ONLY` transaction that is always rolled back, so
    /// the server refuses any statement that would change data.
    async fn execute_read(&self, statement: &str) -> std::result::Result<Vec<Row>, ExecutionError> {
        let mut conn = self.bounded(self.pool.acquire()).await?;
        self.bounded((&mut *conn).execute(sqlx::raw_sql(START_READ_ONLY)))
            .await?;

        let fetched = self
            .bounded(sqlx::query(statement).fetch_all(&mut *conn))
            .await;

        if let Err(e) = self.bounded((&mut *conn).execute(sqlx::raw_sql("ROLLBACK"))).await {
            tracing::warn!(error = %e, "Rollback of read-only transaction failed, discarding connection");
            conn.close_on_drop();
        }

        let rows = fetched?;
        Ok(rows.iter().map(row_to_json).collect())
    }

    async fn execute_write(&self, statement: &str) -> std::result::Result<u64, ExecutionError> {
        let result = self
            .bounded(sqlx::query(statement).execute(&self.pool))
            .await?;
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> std::result::Result<(), ExecutionError> {
        self.bounded(sqlx::query("SELECT 1").execute(&self.pool))
            .await
            .map(|_| ())
    }
}

/// Convert a row to a JSON object keyed by column label.
fn row_to_json(row: &MySqlRow) -> Row {
    let mut out = Row::new();
    for (idx, column) in row.columns().iter().enumerate() {
        let value = decode_value(row, idx, column.type_info().name());
        out.insert(column.name().to_string(), value);
    }
    out
}

/// Decode column `idx` as `T`. `None` means the column is not a `T`;
/// `Some(Value::Null)` means SQL NULL.
fn as_json<'r, T, F>(row: &'r MySqlRow, idx: usize, f: F) -> Option<Value>
where
    T: Decode<'r, MySql> + Type<MySql>,
    F: FnOnce(T) -> Value,
{
    row.try_get::<Option<T>, _>(idx)
        .ok()
        .map(|v| v.map(f).unwrap_or(Value::Null))
}

fn decimal_to_json(d: Decimal) -> Value {
    d.to_f64()
        .map(Value::from)
        .unwrap_or_else(|| Value::String(d.to_string()))
}

fn decode_value(row: &MySqlRow, idx: usize, type_name: &str) -> Value {
    let type_name = type_name.to_ascii_uppercase();

    let typed = match type_name.as_str() {
        "NULL" => Some(Value::Null),
        "BOOLEAN" => as_json::<bool, _>(row, idx, Value::from)
            .or_else(|| as_json::<i64, _>(row, idx, Value::from)),
        "YEAR" => as_json::<u16, _>(row, idx, Value::from),
        name if name.contains("INT") => {
            if name.ends_with("UNSIGNED") {
                as_json::<u64, _>(row, idx, Value::from)
                    .or_else(|| as_json::<i64, _>(row, idx, Value::from))
            } else {
                as_json::<i64, _>(row, idx, Value::from)
                    .or_else(|| as_json::<u64, _>(row, idx, Value::from))
            }
        }
        "FLOAT" => as_json::<f32, _>(row, idx, |v| Value::from(f64::from(v))),
        "DOUBLE" => as_json::<f64, _>(row, idx, Value::from),
        "DECIMAL" => as_json::<Decimal, _>(row, idx, decimal_to_json),
        "DATE" => as_json::<chrono::NaiveDate, _>(row, idx, |d| {
            Value::String(d.format("%Y-%m-%d").to_string())
        }),
        "DATETIME" => as_json::<chrono::NaiveDateTime, _>(row, idx, |d| {
            Value::String(d.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
        }),
        "TIMESTAMP" => as_json::<chrono::DateTime<chrono::Utc>, _>(row, idx, |d| {
            Value::String(d.to_rfc3339())
        }),
        "TIME" => as_json::<chrono::NaiveTime, _>(row, idx, |t| Value::String(t.to_string())),
        "JSON" => as_json::<Value, _>(row, idx, |v| v),
        _ => None,
    };

    typed
        .or_else(|| as_json::<String, _>(row, idx, Value::String))
        .or_else(|| {
            as_json::<Vec<u8>, _>(row, idx, |bytes| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        })
        .unwrap_or_else(|| {
            tracing::debug!(column = idx, type_name = %type_name, "Undecodable column, returning null");
            Value::Null
        })
}

/// Hide the password component of a connection URL for logging.
pub fn mask_database_url(url: &str) -> String {
    let Some(scheme_end) = url.find("://") else {
        return url.to_string();
    };
    let rest = &url[scheme_end + 3..];
    let Some(at) = rest.rfind('@') else {
        return url.to_string();
    };
    let credentials = &rest[..at];
    match credentials.find(':') {
        Some(colon) => format!(
            "{}{}:****{}",
            &url[..scheme_end + 3],
            &credentials[..colon],
            &rest[at..]
        ),
        None => url.to_string(),
    }
}
