//! Scripted oracle and in-memory executor shared by the integration tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use nlq_gateway::{
    CompiledPrompt, ExecutionError, Gateway, IntentRouter, Oracle, OracleError, PromptCompiler,
    QueryExecutor, ResponseInterpreter, Row, StatementGuard,
};
use serde_json::json;

/// Oracle that answers every prompt with the same reply.
pub struct ScriptedOracle {
    reply: Result<String, OracleError>,
    pub calls: Mutex<usize>,
}

impl ScriptedOracle {
    pub fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(reply.to_string()),
            calls: Mutex::new(0),
        })
    }

    pub fn failing(err: OracleError) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(err),
            calls: Mutex::new(0),
        })
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    async fn complete(&self, _prompt: &CompiledPrompt) -> Result<String, OracleError> {
        *self.calls.lock().unwrap() += 1;
        self.reply.clone()
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Executor over a fixed student table that records every statement.
#[derive(Default)]
pub struct MemoryExecutor {
    pub reads: Mutex<Vec<String>>,
    pub writes: Mutex<Vec<String>>,
    pub fail_with: Option<String>,
}

impl MemoryExecutor {
    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            fail_with: Some(message.to_string()),
            ..Self::default()
        })
    }

    pub fn executed(&self) -> usize {
        self.reads.lock().unwrap().len() + self.writes.lock().unwrap().len()
    }
}

fn student(id: i64, name: &str, gpa: f64) -> Row {
    let mut row = Row::new();
    row.insert("id".to_string(), json!(id));
    row.insert("name".to_string(), json!(name));
    row.insert("gpa".to_string(), json!(gpa));
    row
}

#[async_trait]
impl QueryExecutor for MemoryExecutor {
    async fn execute_read(&self, statement: &str) -> Result<Vec<Row>, ExecutionError> {
        self.reads.lock().unwrap().push(statement.to_string());
        if let Some(message) = &self.fail_with {
            return Err(ExecutionError::Database(message.clone()));
        }
        Ok(vec![student(1, "Ada", 8.7), student(4, "Grace", 8.9)])
    }

    async fn execute_write(&self, statement: &str) -> Result<u64, ExecutionError> {
        self.writes.lock().unwrap().push(statement.to_string());
        if let Some(message) = &self.fail_with {
            return Err(ExecutionError::Database(message.clone()));
        }
        Ok(3)
    }

    async fn ping(&self) -> Result<(), ExecutionError> {
        Ok(())
    }
}

pub fn gateway(oracle: Arc<ScriptedOracle>, executor: Arc<MemoryExecutor>) -> Gateway {
    Gateway::new(
        PromptCompiler::default(),
        oracle,
        ResponseInterpreter::new(),
        IntentRouter::new(executor, StatementGuard::default()),
    )
}
