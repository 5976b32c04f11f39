//! Statement shape checks applied before generated SQL reaches the database.
//!
//! The guard is a coarse filter on the leading verb and statement count. It
//! does not parse SQL and is no substitute for database-level permissions.

use crate::config::GuardMode;
use crate::intent::IntentKind;

const READ_VERBS: &[&str] = &["SELECT", "WITH", "SHOW", "DESCRIBE", "DESC", "EXPLAIN"];
const WRITE_VERBS: &[&str] = &["INSERT", "UPDATE", "DELETE", "REPLACE"];
const SCHEMA_VERBS: &[&str] = &[
    "CREATE", "DROP", "ALTER", "TRUNCATE", "RENAME", "GRANT", "REVOKE",
];

/// Outcome of a guard check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardVerdict {
    Valid,
    Invalid { reason: String },
}

impl GuardVerdict {
    fn invalid(reason: impl Into<String>) -> Self {
        Self::Invalid {
            reason: reason.into(),
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StatementGuard {
    mode: GuardMode,
}

impl StatementGuard {
    pub fn new(mode: GuardMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> GuardMode {
        self.mode
    }

    /// Check `statement` against the intent that produced it.
    pub fn check(&self, kind: IntentKind, statement: &str) -> GuardVerdict {
        if self.mode == GuardMode::Off {
            return GuardVerdict::Valid;
        }

        let body = strip_leading_comments(statement);
        if has_inner_semicolon(body) {
            return GuardVerdict::invalid("multiple statements are not allowed");
        }

        let verb = leading_verb(body);
        if SCHEMA_VERBS.contains(&verb.as_str()) {
            return GuardVerdict::invalid(format!("{} statements are not allowed", verb));
        }

        let allowed = match kind {
            IntentKind::Read => READ_VERBS,
            IntentKind::Write => WRITE_VERBS,
            IntentKind::Chat => return GuardVerdict::invalid("chat intents carry no statement"),
        };
        if !allowed.contains(&verb.as_str()) {
            let shown = if verb.is_empty() { "(none)" } else { verb.as_str() };
            return GuardVerdict::invalid(format!(
                "a {} intent cannot run a statement starting with {}",
                kind, shown
            ));
        }

        GuardVerdict::Valid
    }
}

/// True if the statement's leading verb inserts, updates, deletes or changes
/// schema. Applies regardless of guard mode: such statements never run as a read.
pub fn changes_data(statement: &str) -> bool {
    let verb = leading_verb(strip_leading_comments(statement));
    WRITE_VERBS.contains(&verb.as_str())
        || SCHEMA_VERBS.contains(&verb.as_str())
        || matches!(verb.as_str(), "LOAD" | "CALL" | "LOCK" | "SET")
}

/// Skip whitespace, `--`/`#` line comments, `/* */` block comments and
/// opening parentheses ahead of the first keyword.
fn strip_leading_comments(sql: &str) -> &str {
    let mut rest = sql;
    loop {
        let trimmed = rest.trim_start().trim_start_matches('(');
        if let Some(after) = trimmed.strip_prefix("--").or_else(|| trimmed.strip_prefix('#')) {
            rest = after.find('\n').map_or("", |nl| &after[nl + 1..]);
        } else if let Some(after) = trimmed.strip_prefix("/*") {
            rest = after.find("*/").map_or("", |end| &after[end + 2..]);
        } else {
            return trimmed;
        }
    }
}

fn leading_verb(sql: &str) -> String {
    sql.chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_ascii_uppercase()
}

/// True if a `;` outside quotes is followed by anything but whitespace.
fn has_inner_semicolon(sql: &str) -> bool {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (idx, c) in sql.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' | '`' => quote = Some(c),
            ';' => {
                if !sql[idx + 1..].trim().is_empty() {
                    return true;
                }
            }
            _ => {}
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strict() -> StatementGuard {
        StatementGuard::new(GuardMode::Strict)
    }

    #[test]
    fn test_changes_data() {
        assert!(changes_data("DELETE FROM student"));
        assert!(changes_data("  /* cleanup */ drop table dept"));
        assert!(changes_data("-- bump\nUPDATE emp SET job = 2"));
        assert!(!changes_data("SELECT * FROM student"));
        assert!(!changes_data("(select id from dept)"));
        assert!(!changes_data("SHOW TABLES"));
    }

    #[test]
    fn test_off_accepts_everything() {
        let guard = StatementGuard::default();
        assert_eq!(guard.mode(), GuardMode::Off);
        assert!(guard.check(IntentKind::Read, "DROP TABLE student").is_valid());
        assert!(guard
            .check(IntentKind::Write, "DELETE FROM student; DROP TABLE dept")
            .is_valid());
    }

    #[test]
    fn test_strict_accepts_matching_verbs() {
        let guard = strict();
        assert!(guard
            .check(IntentKind::Read, "SELECT * FROM student WHERE year_level=1")
            .is_valid());
        assert!(guard
            .check(IntentKind::Read, "  with t as (select 1) select * from t;")
            .is_valid());
        assert!(guard
            .check(IntentKind::Read, "(SELECT id FROM dept) UNION (SELECT id FROM emp)")
            .is_valid());
        assert!(guard
            .check(IntentKind::Write, "UPDATE student SET gpa=9.0 WHERE id=5")
            .is_valid());
        assert!(guard
            .check(IntentKind::Write, "-- raise\nUPDATE emp SET salary=salary+1")
            .is_valid());
    }

    #[test]
    fn test_strict_rejects_verb_mismatch() {
        let guard = strict();
        assert!(!guard.check(IntentKind::Read, "DELETE FROM student").is_valid());
        assert!(!guard.check(IntentKind::Write, "SELECT * FROM student").is_valid());
        assert!(!guard.check(IntentKind::Chat, "SELECT 1").is_valid());
    }

    #[test]
    fn test_strict_rejects_ddl() {
        let verdict = strict().check(IntentKind::Write, "/* tidy */ DROP TABLE student");
        assert_eq!(
            verdict,
            GuardVerdict::Invalid {
                reason: "DROP statements are not allowed".to_string()
            }
        );
    }

    #[test]
    fn test_strict_rejects_multiple_statements() {
        let guard = strict();
        assert!(!guard
            .check(IntentKind::Write, "DELETE FROM student; DROP TABLE dept")
            .is_valid());
        // Semicolons inside literals and a single trailing one are fine.
        assert!(guard
            .check(IntentKind::Read, "SELECT * FROM dept WHERE name = 'a;b';")
            .is_valid());
        assert!(guard
            .check(IntentKind::Read, "SELECT * FROM dept WHERE name = 'it\\'s; ok'")
            .is_valid());
    }
}
