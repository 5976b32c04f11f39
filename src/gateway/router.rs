//! Intent routing: executes statements and assembles the result envelope.

use serde::Serialize;
use std::sync::Arc;

use crate::error::ExecutionError;
use crate::intent::{Intent, IntentKind};
use crate::metrics::{get_metrics, Metrics};
use crate::store::{changes_data, GuardVerdict, QueryExecutor, Row, StatementGuard};
use crate::utils::preview;

/// Byte limit for statements quoted in logs.
const LOG_STATEMENT_LEN: usize = 500;

/// Envelope payload: a row set, a confirmation message, or empty rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EnvelopeData {
    Rows(Vec<Row>),
    Message(String),
}

impl EnvelopeData {
    pub fn empty() -> Self {
        Self::Rows(Vec::new())
    }
}

/// The response body for one question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultEnvelope {
    #[serde(rename = "type")]
    pub kind: IntentKind,
    #[serde(rename = "aiMessage")]
    pub ai_message: String,
    pub data: EnvelopeData,
    /// Present only when the generated statement failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResultEnvelope {
    pub fn chat(ai_message: impl Into<String>) -> Self {
        Self {
            kind: IntentKind::Chat,
            ai_message: ai_message.into(),
            data: EnvelopeData::empty(),
            error: None,
        }
    }

    fn rows(ai_message: String, rows: Vec<Row>) -> Self {
        Self {
            kind: IntentKind::Read,
            ai_message,
            data: EnvelopeData::Rows(rows),
            error: None,
        }
    }

    fn written(ai_message: String, affected: u64) -> Self {
        Self {
            kind: IntentKind::Write,
            ai_message,
            data: EnvelopeData::Message(write_confirmation(affected)),
            error: None,
        }
    }

    fn failed(ai_message: String, err: &ExecutionError) -> Self {
        Self {
            kind: IntentKind::Chat,
            ai_message,
            data: EnvelopeData::empty(),
            error: Some(format!("Database execution failed: {}", err)),
        }
    }
}

/// Confirmation text for a completed write.
pub fn write_confirmation(affected: u64) -> String {
    format!("Operation Confirmed. Database Records Affected: {}", affected)
}

/// Dispatches validated intents to the executor.
pub struct IntentRouter {
    executor: Arc<dyn QueryExecutor>,
    guard: StatementGuard,
}

impl IntentRouter {
    pub fn new(executor: Arc<dyn QueryExecutor>, guard: StatementGuard) -> Self {
        Self { executor, guard }
    }

    pub fn executor(&self) -> &Arc<dyn QueryExecutor> {
        &self.executor
    }

    /// Route one intent. Execution failures become a `CHAT` envelope with
    /// the `error` field set; this never fails.
    pub async fn route(&self, intent: Intent) -> ResultEnvelope {
        match intent {
            Intent::Chat { explanation } => ResultEnvelope::chat(explanation),
            Intent::Read(generated) => {
                let (statement, explanation) = generated.into_parts();
                tracing::info!(statement = %preview(&statement, LOG_STATEMENT_LEN), "Executing read statement");
                match self.run_read(&statement).await {
                    Ok(rows) => {
                        tracing::debug!(rows = rows.len(), "Read statement completed");
                        ResultEnvelope::rows(explanation, rows)
                    }
                    Err(e) => self.failure(IntentKind::Read, &statement, explanation, e),
                }
            }
            Intent::Write(generated) => {
                let (statement, explanation) = generated.into_parts();
                tracing::warn!(statement = %preview(&statement, LOG_STATEMENT_LEN), "Executing write statement");
                match self.run_write(&statement).await {
                    Ok(affected) => {
                        tracing::info!(affected, "Write statement completed");
                        ResultEnvelope::written(explanation, affected)
                    }
                    Err(e) => self.failure(IntentKind::Write, &statement, explanation, e),
                }
            }
        }
    }

    async fn run_read(&self, statement: &str) -> Result<Vec<Row>, ExecutionError> {
        if changes_data(statement) {
            return Err(ExecutionError::Rejected(
                "a read intent cannot run a data-changing statement".to_string(),
            ));
        }
        self.screen(IntentKind::Read, statement)?;
        let _timer = Metrics::start_timer(&get_metrics().execution_duration_seconds);
        self.executor.execute_read(statement).await
    }

    async fn run_write(&self, statement: &str) -> Result<u64, ExecutionError> {
        self.screen(IntentKind::Write, statement)?;
        let _timer = Metrics::start_timer(&get_metrics().execution_duration_seconds);
        self.executor.execute_write(statement).await
    }

    fn screen(&self, kind: IntentKind, statement: &str) -> Result<(), ExecutionError> {
        match self.guard.check(kind, statement) {
            GuardVerdict::Valid => Ok(()),
            GuardVerdict::Invalid { reason } => Err(ExecutionError::Rejected(reason)),
        }
    }

    fn failure(
        &self,
        kind: IntentKind,
        statement: &str,
        explanation: String,
        err: ExecutionError,
    ) -> ResultEnvelope {
        tracing::error!(
            intent_type = %kind,
            statement = %preview(statement, LOG_STATEMENT_LEN),
            error = %err,
            "Generated statement failed"
        );
        get_metrics().execution_errors_total.inc();
        ResultEnvelope::failed(explanation, &err)
    }
}
