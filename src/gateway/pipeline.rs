//! Request pipeline: question in, envelope out.

use std::sync::Arc;
use std::time::Instant;

use tracing::Instrument;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{ExecutionError, OracleError, Result};
use crate::intent::{Intent, ResponseInterpreter};
use crate::metrics::{get_metrics, InFlightGuard, Metrics};
use crate::oracle::{create_oracle, Oracle};
use crate::prompt::PromptCompiler;
use crate::store::{QueryExecutor, StatementGuard};
use crate::utils::preview;

use super::router::{IntentRouter, ResultEnvelope};

/// Byte limit for questions and replies quoted in logs.
const LOG_PREVIEW_LEN: usize = 300;

/// Stages one request passes through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStage {
    Received,
    Prompted,
    OracleReplied,
    Interpreted,
    Executed,
    ExecutionFailed,
    Skipped,
    Responded,
}

impl RequestStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Received => "RECEIVED",
            Self::Prompted => "PROMPTED",
            Self::OracleReplied => "ORACLE_REPLIED",
            Self::Interpreted => "INTERPRETED",
            Self::Executed => "EXECUTED",
            Self::ExecutionFailed => "EXECUTION_FAILED",
            Self::Skipped => "SKIPPED",
            Self::Responded => "RESPONDED",
        }
    }

    /// Stage reached once the router has handled an intent.
    pub fn after_routing(executed: bool, failed: bool) -> Self {
        match (executed, failed) {
            (false, _) => Self::Skipped,
            (true, false) => Self::Executed,
            (true, true) => Self::ExecutionFailed,
        }
    }
}

impl std::fmt::Display for RequestStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The question-answering pipeline. Holds no per-request state and is
/// shared across concurrent requests.
pub struct Gateway {
    compiler: PromptCompiler,
    oracle: Arc<dyn Oracle>,
    interpreter: ResponseInterpreter,
    router: IntentRouter,
}

impl Gateway {
    pub fn new(
        compiler: PromptCompiler,
        oracle: Arc<dyn Oracle>,
        interpreter: ResponseInterpreter,
        router: IntentRouter,
    ) -> Self {
        Self {
            compiler,
            oracle,
            interpreter,
            router,
        }
    }

    /// Assemble a gateway from configuration around an existing executor.
    pub fn from_config(config: &Config, executor: Arc<dyn QueryExecutor>) -> Result<Self> {
        let oracle = create_oracle(&config.oracle)?;
        let router = IntentRouter::new(executor, StatementGuard::new(config.database.guard));
        Ok(Self::new(
            PromptCompiler::default(),
            oracle,
            ResponseInterpreter::new(),
            router,
        ))
    }

    pub fn compiler(&self) -> &PromptCompiler {
        &self.compiler
    }

    pub fn oracle_name(&self) -> &str {
        self.oracle.name()
    }

    /// Check the database behind the router.
    pub async fn ping_database(&self) -> std::result::Result<(), ExecutionError> {
        self.router.executor().ping().await
    }

    /// Answer one question. Every failure is folded into a `CHAT` envelope.
    pub async fn ask(&self, question: &str) -> ResultEnvelope {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("ask", request_id = %request_id);
        self.ask_inner(question).instrument(span).await
    }

    async fn ask_inner(&self, question: &str) -> ResultEnvelope {
        let metrics = get_metrics();
        metrics.questions_total.inc();
        let _in_flight = InFlightGuard::new(&metrics.in_flight);
        let _timer = Metrics::start_timer(&metrics.request_duration_seconds);
        let started = Instant::now();

        tracing::info!(question = %preview(question, LOG_PREVIEW_LEN), "Question received");
        stage(RequestStage::Received);

        let prompt = self.compiler.compile(question);
        tracing::debug!(prompt_len = prompt.len(), "Prompt compiled");
        stage(RequestStage::Prompted);

        let reply = {
            let _oracle_timer = Metrics::start_timer(&metrics.oracle_duration_seconds);
            self.oracle.complete(&prompt).await
        };

        let intent = match reply {
            Ok(raw) => {
                tracing::debug!(reply = %preview(&raw, LOG_PREVIEW_LEN), "Oracle replied");
                stage(RequestStage::OracleReplied);
                self.interpreter.interpret(&raw)
            }
            Err(e) => {
                metrics.oracle_failures_total.inc();
                tracing::error!(oracle = self.oracle.name(), error = %e, "Oracle call failed");
                Intent::chat(oracle_failure_message(&e))
            }
        };
        tracing::debug!(intent_type = %intent.kind(), "Intent interpreted");
        stage(RequestStage::Interpreted);

        let executes = intent.statement().is_some();
        let envelope = self.router.route(intent).await;
        stage(RequestStage::after_routing(executes, envelope.error.is_some()));

        metrics.record_intent(envelope.kind);
        tracing::info!(
            intent_type = %envelope.kind,
            failed = envelope.error.is_some(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Question answered"
        );
        stage(RequestStage::Responded);

        envelope
    }
}

fn stage(stage: RequestStage) {
    tracing::debug!(stage = %stage, "Stage reached");
}

/// Explanation shown to the user when the oracle could not answer.
/// Transport detail stays in the server log.
pub fn oracle_failure_message(err: &OracleError) -> String {
    match err {
        OracleError::Reported(message) => format!("[AI ERROR] {}", message),
        e if e.is_unavailable() => {
            "[SYSTEM FAILURE] AI service unavailable. Please try again later.".to_string()
        }
        _ => "[SYSTEM FAILURE] AI service returned an unusable reply.".to_string(),
    }
}
