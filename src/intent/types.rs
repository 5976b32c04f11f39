//! Intent types.

use serde::{Deserialize, Serialize};

/// Classification of a question. Serialized with the wire names the
/// reasoning endpoint and the envelope use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntentKind {
    #[serde(rename = "SELECT")]
    Read,
    #[serde(rename = "DML")]
    Write,
    #[serde(rename = "CHAT")]
    Chat,
}

impl IntentKind {
    pub const ALL: [IntentKind; 3] = [IntentKind::Read, IntentKind::Write, IntentKind::Chat];

    /// Name used on the wire.
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Read => "SELECT",
            Self::Write => "DML",
            Self::Chat => "CHAT",
        }
    }

    /// Parse a wire name. Matching is case-sensitive.
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "SELECT" => Some(Self::Read),
            "DML" => Some(Self::Write),
            "CHAT" => Some(Self::Chat),
            _ => None,
        }
    }

    /// Whether this kind carries a statement to execute.
    pub fn requires_statement(self) -> bool {
        !matches!(self, Self::Chat)
    }
}

impl std::fmt::Display for IntentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// A non-empty, trimmed statement with the explanation that came with it.
/// Only built through [`Intent::read`] and [`Intent::write`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedStatement {
    sql: String,
    explanation: String,
}

impl GeneratedStatement {
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    pub fn into_parts(self) -> (String, String) {
        (self.sql, self.explanation)
    }
}

/// A validated intent. `Read` and `Write` always carry a non-empty statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Read(GeneratedStatement),
    Write(GeneratedStatement),
    Chat { explanation: String },
}

impl Intent {
    pub fn chat(explanation: impl Into<String>) -> Self {
        Self::Chat {
            explanation: explanation.into(),
        }
    }

    /// Build a read; an empty statement downgrades to `Chat`.
    pub fn read(statement: impl Into<String>, explanation: impl Into<String>) -> Self {
        Self::with_statement(IntentKind::Read, statement.into(), explanation.into())
    }

    /// Build a write; an empty statement downgrades to `Chat`.
    pub fn write(statement: impl Into<String>, explanation: impl Into<String>) -> Self {
        Self::with_statement(IntentKind::Write, statement.into(), explanation.into())
    }

    fn with_statement(kind: IntentKind, statement: String, explanation: String) -> Self {
        let sql = statement.trim().to_string();
        if sql.is_empty() {
            let explanation = if explanation.is_empty() {
                format!("[NO STATEMENT] A {} intent arrived without SQL.", kind)
            } else {
                format!("[NO STATEMENT] A {} intent arrived without SQL. {}", kind, explanation)
            };
            return Self::Chat { explanation };
        }
        let statement = GeneratedStatement { sql, explanation };
        match kind {
            IntentKind::Read => Self::Read(statement),
            IntentKind::Write => Self::Write(statement),
            IntentKind::Chat => Self::Chat {
                explanation: statement.explanation,
            },
        }
    }

    pub fn kind(&self) -> IntentKind {
        match self {
            Self::Read(_) => IntentKind::Read,
            Self::Write(_) => IntentKind::Write,
            Self::Chat { .. } => IntentKind::Chat,
        }
    }

    pub fn statement(&self) -> Option<&str> {
        match self {
            Self::Read(s) | Self::Write(s) => Some(s.sql()),
            Self::Chat { .. } => None,
        }
    }

    pub fn explanation(&self) -> &str {
        match self {
            Self::Read(s) | Self::Write(s) => s.explanation(),
            Self::Chat { explanation } => explanation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names() {
        for kind in IntentKind::ALL {
            assert_eq!(IntentKind::from_wire(kind.wire_name()), Some(kind));
            assert_eq!(
                serde_json::to_string(&kind).unwrap(),
                format!("\"{}\"", kind.wire_name())
            );
        }
        assert_eq!(IntentKind::from_wire("select"), None);
        assert_eq!(IntentKind::from_wire("READ"), None);
    }

    #[test]
    fn test_constructors_keep_invariant() {
        let read = Intent::read("SELECT 1", "one");
        assert_eq!(read.kind(), IntentKind::Read);
        assert_eq!(read.statement(), Some("SELECT 1"));

        let empty = Intent::write("   ", "Updated GPA");
        assert_eq!(empty.kind(), IntentKind::Chat);
        assert_eq!(empty.statement(), None);
        assert!(empty.explanation().contains("[NO STATEMENT]"));
        assert!(empty.explanation().contains("Updated GPA"));
    }

    #[test]
    fn test_statement_trimmed() {
        let intent = Intent::read("\n SELECT * FROM dept \n", "");
        assert_eq!(intent.statement(), Some("SELECT * FROM dept"));
        assert_eq!(intent.explanation(), "");
    }

    #[test]
    fn test_chat_has_no_statement() {
        let chat = Intent::chat("Hello!");
        assert_eq!(chat.kind(), IntentKind::Chat);
        assert!(chat.statement().is_none());
        assert!(!chat.kind().requires_statement());
    }
}
