//! End-to-end question handling through the gateway pipeline.

use std::sync::Arc;

use nlq_gateway::{EnvelopeData, IntentKind, OracleError, ResultEnvelope};
use serde_json::json;

use super::support::{gateway, MemoryExecutor, ScriptedOracle};

#[tokio::test]
async fn test_read_returns_rows() {
    let oracle = ScriptedOracle::replying(
        r#"{"type":"SELECT","sql":"SELECT id, name, gpa FROM student WHERE gpa > 8.5","message":"Top students."}"#,
    );
    let executor = Arc::new(MemoryExecutor::default());
    let envelope = gateway(oracle, executor.clone())
        .ask("Which students have a GPA above 8.5?")
        .await;

    assert_eq!(envelope.kind, IntentKind::Read);
    assert_eq!(envelope.ai_message, "Top students.");
    assert!(envelope.error.is_none());

    let body = serde_json::to_value(&envelope).unwrap();
    assert_eq!(body["type"], "SELECT");
    assert_eq!(
        body["data"],
        json!([
            {"id": 1, "name": "Ada", "gpa": 8.7},
            {"id": 4, "name": "Grace", "gpa": 8.9}
        ])
    );
    assert_eq!(
        *executor.reads.lock().unwrap(),
        vec!["SELECT id, name, gpa FROM student WHERE gpa > 8.5".to_string()]
    );
    assert!(executor.writes.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_fenced_write_confirms_affected_rows() {
    let oracle = ScriptedOracle::replying(
        "```json\n{\"type\":\"DML\",\"sql\":\"UPDATE student SET year_level = 2 WHERE clazz_id = 7\",\"message\":\"Promoted class 7.\"}\n```",
    );
    let executor = Arc::new(MemoryExecutor::default());
    let envelope = gateway(oracle, executor.clone())
        .ask("Move everyone in class 7 to second year")
        .await;

    assert_eq!(envelope.kind, IntentKind::Write);
    assert_eq!(envelope.ai_message, "Promoted class 7.");
    assert_eq!(
        envelope.data,
        EnvelopeData::Message("Operation Confirmed. Database Records Affected: 3".to_string())
    );
    assert_eq!(executor.writes.lock().unwrap().len(), 1);
    assert!(executor.reads.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_chat_with_sql_never_executes() {
    let oracle = ScriptedOracle::replying(
        r#"{"type":"CHAT","sql":"DROP TABLE student","message":"I can only answer questions about the records."}"#,
    );
    let executor = Arc::new(MemoryExecutor::default());
    let envelope = gateway(oracle, executor.clone()).ask("tell me a joke").await;

    assert_eq!(
        envelope,
        ResultEnvelope::chat("I can only answer questions about the records.")
    );
    assert_eq!(executor.executed(), 0);
}

#[tokio::test]
async fn test_oracle_outage_becomes_chat() {
    let oracle = ScriptedOracle::failing(OracleError::Timeout(60));
    let executor = Arc::new(MemoryExecutor::default());
    let envelope = gateway(oracle.clone(), executor.clone())
        .ask("How many departments are there?")
        .await;

    assert_eq!(envelope.kind, IntentKind::Chat);
    assert!(envelope.ai_message.starts_with("[SYSTEM FAILURE]"));
    assert_eq!(envelope.data, EnvelopeData::empty());
    assert_eq!(*oracle.calls.lock().unwrap(), 1);
    assert_eq!(executor.executed(), 0);
}

#[tokio::test]
async fn test_reported_oracle_error_is_quoted() {
    let oracle = ScriptedOracle::failing(OracleError::Reported("API key not valid".to_string()));
    let envelope = gateway(oracle, Arc::new(MemoryExecutor::default()))
        .ask("List departments")
        .await;

    assert_eq!(envelope.ai_message, "[AI ERROR] API key not valid");
}

#[tokio::test]
async fn test_broken_reply_becomes_chat() {
    let oracle = ScriptedOracle::replying("{\"type\": \"SELECT\", \"sql\": ");
    let executor = Arc::new(MemoryExecutor::default());
    let envelope = gateway(oracle, executor.clone()).ask("List students").await;

    assert_eq!(envelope.kind, IntentKind::Chat);
    assert!(envelope.ai_message.starts_with("[PARSE ERROR]"));
    assert_eq!(executor.executed(), 0);
}

#[tokio::test]
async fn test_unknown_intent_type_is_not_executed() {
    let oracle = ScriptedOracle::replying(
        r#"{"type":"select","sql":"SELECT * FROM dept","message":"Departments."}"#,
    );
    let executor = Arc::new(MemoryExecutor::default());
    let envelope = gateway(oracle, executor.clone()).ask("List departments").await;

    assert_eq!(envelope.kind, IntentKind::Chat);
    assert!(envelope.ai_message.starts_with("[UNRECOGNIZED INTENT]"));
    assert_eq!(executor.executed(), 0);
}

#[tokio::test]
async fn test_execution_failure_keeps_explanation() {
    let oracle = ScriptedOracle::replying(
        r#"{"type":"SELECT","sql":"SELECT violation_count FROM student","message":"Violations per student."}"#,
    );
    let executor = MemoryExecutor::failing("Unknown column 'violation_count'");
    let envelope = gateway(oracle, executor.clone()).ask("Show violations").await;

    assert_eq!(envelope.kind, IntentKind::Chat);
    assert_eq!(envelope.ai_message, "Violations per student.");
    assert_eq!(envelope.data, EnvelopeData::empty());
    let error = envelope.error.expect("execution error reported");
    assert!(error.starts_with("Database execution failed:"));
    assert!(error.contains("violation_count"));
}

#[tokio::test]
async fn test_concurrent_questions_are_independent() {
    let oracle = ScriptedOracle::replying(
        r#"{"type":"SELECT","sql":"SELECT * FROM student","message":"All students."}"#,
    );
    let executor = Arc::new(MemoryExecutor::default());
    let gw = Arc::new(gateway(oracle.clone(), executor.clone()));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let gw = gw.clone();
            tokio::spawn(async move { gw.ask(&format!("question {}", i)).await })
        })
        .collect();

    for handle in handles {
        let envelope = handle.await.unwrap();
        assert_eq!(envelope.kind, IntentKind::Read);
    }
    assert_eq!(*oracle.calls.lock().unwrap(), 8);
    assert_eq!(executor.reads.lock().unwrap().len(), 8);
}
