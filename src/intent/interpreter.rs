//! Response interpreter: raw endpoint text to [`Intent`].
//!
//! Interpretation never fails. Anything the interpreter cannot map onto a
//! valid intent becomes a `Chat` intent carrying a diagnostic explanation.

use serde_json::{Map, Value};

use super::types::{Intent, IntentKind};
use crate::metrics::get_metrics;
use crate::utils::preview;

/// Default byte limit for prose replies passed through as chat.
const DEFAULT_MAX_PROSE_LEN: usize = 500;

/// Byte limit for reply excerpts quoted in parse diagnostics.
const DIAGNOSTIC_EXCERPT_LEN: usize = 200;

/// Remove surrounding Markdown code-fence markers and whitespace.
///
/// Handles both bare fences and fences with a language tag (```` ```json ````).
pub fn strip_code_fences(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```") {
        let tag_len = rest
            .find(|c: char| !c.is_ascii_alphanumeric())
            .unwrap_or(rest.len());
        text = &rest[tag_len..];
    }
    if let Some(rest) = text.trim_end().strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

/// Slice from the first `{` to the last `}`, if both exist in order.
fn outermost_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Maps raw reply text onto a validated intent.
#[derive(Debug, Clone)]
pub struct ResponseInterpreter {
    max_prose_len: usize,
}

impl Default for ResponseInterpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseInterpreter {
    pub fn new() -> Self {
        Self {
            max_prose_len: DEFAULT_MAX_PROSE_LEN,
        }
    }

    /// Set the byte limit for prose replies passed through as chat.
    pub fn with_max_prose_len(mut self, max_prose_len: usize) -> Self {
        self.max_prose_len = max_prose_len;
        self
    }

    /// Interpret one raw reply.
    pub fn interpret(&self, raw: &str) -> Intent {
        let text = strip_code_fences(raw);

        if text.is_empty() {
            return fallback("[PARSE ERROR] The assistant returned an empty reply.".to_string());
        }

        let value = match serde_json::from_str::<Value>(text) {
            Ok(value) => value,
            Err(err) => {
                if !text.contains('{') {
                    tracing::warn!(
                        reply = %preview(text, DIAGNOSTIC_EXCERPT_LEN),
                        "Reply contains no JSON object, treating as chat"
                    );
                    return fallback(preview(text, self.max_prose_len));
                }

                match outermost_object(text).and_then(|slice| serde_json::from_str(slice).ok()) {
                    Some(value) => value,
                    None => {
                        tracing::warn!(
                            error = %err,
                            reply = %preview(text, DIAGNOSTIC_EXCERPT_LEN),
                            "Reply is not valid JSON"
                        );
                        return fallback(format!(
                            "[PARSE ERROR] The assistant reply could not be understood ({}). Reply began: {}",
                            err,
                            preview(text, DIAGNOSTIC_EXCERPT_LEN)
                        ));
                    }
                }
            }
        };

        match value {
            Value::Object(map) => self.from_object(&map),
            other => {
                tracing::warn!(reply = %preview(text, DIAGNOSTIC_EXCERPT_LEN), "Reply is not a JSON object");
                fallback(format!(
                    "[PARSE ERROR] Expected a JSON object from the assistant but received {}.",
                    json_type_name(&other)
                ))
            }
        }
    }

    fn from_object(&self, map: &Map<String, Value>) -> Intent {
        let message = match map.get("message") {
            Some(Value::String(s)) => s.clone(),
            None | Some(Value::Null) => String::new(),
            Some(other) => other.to_string(),
        };

        let kind = match map.get("type") {
            Some(Value::String(name)) => match IntentKind::from_wire(name) {
                Some(kind) => kind,
                None => {
                    tracing::warn!(intent_type = %name, "Unrecognized intent type");
                    return fallback(join_note(
                        format!("[UNRECOGNIZED INTENT] The assistant answered with type '{}'.", name),
                        &message,
                    ));
                }
            },
            None | Some(Value::Null) => {
                tracing::warn!("Reply has no intent type");
                return fallback(join_note(
                    "[UNRECOGNIZED INTENT] The assistant reply has no 'type' field.".to_string(),
                    &message,
                ));
            }
            Some(other) => {
                tracing::warn!(intent_type = %other, "Intent type is not a string");
                return fallback(join_note(
                    format!(
                        "[UNRECOGNIZED INTENT] The assistant answered with a {} 'type' field.",
                        json_type_name(other)
                    ),
                    &message,
                ));
            }
        };

        let statement = match map.get("sql") {
            Some(Value::String(s)) => s.as_str(),
            _ => "",
        };

        let intent = match kind {
            IntentKind::Read => Intent::read(statement, message),
            IntentKind::Write => Intent::write(statement, message),
            IntentKind::Chat => Intent::chat(message),
        };

        if intent.kind() != kind {
            tracing::warn!(intent_type = %kind, "Intent arrived without a statement, downgraded to chat");
            get_metrics().interpret_fallbacks_total.inc();
        }
        intent
    }
}

fn fallback(explanation: String) -> Intent {
    get_metrics().interpret_fallbacks_total.inc();
    Intent::chat(explanation)
}

fn join_note(note: String, message: &str) -> String {
    if message.is_empty() {
        note
    } else {
        format!("{} {}", note, message)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
