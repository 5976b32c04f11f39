//! Prompt compilation.
//!
//! Combines the schema descriptor, a fixed rule set and the user question into
//! the single instruction document sent to the reasoning endpoint.

use std::fmt::Write as _;

use crate::schema::{academic_schema, SchemaDescriptor};

/// A concept the endpoint must express through a specific column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConceptMapping {
    pub concept: &'static str,
    pub column: &'static str,
    pub detail: Option<&'static str>,
}

/// Hard rules stated ahead of the schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRules {
    pub role: &'static str,
    pub mission: &'static str,
    pub dialect: &'static str,
    /// Columns from earlier schema revisions that no longer exist.
    pub retired_columns: Vec<&'static str>,
    pub concepts: Vec<ConceptMapping>,
}

impl Default for PromptRules {
    fn default() -> Self {
        Self {
            role: "You are the Academic Database Agent.",
            mission: "Convert natural language queries into SQL for the university records database.",
            dialect: "MySQL",
            retired_columns: vec!["violation_count"],
            concepts: vec![
                ConceptMapping {
                    concept: "academic performance",
                    column: "gpa",
                    detail: Some("Scale is 9.0"),
                },
                ConceptMapping {
                    concept: "Year 1-4 queries",
                    column: "year_level",
                    detail: None,
                },
            ],
        }
    }
}

/// The instruction document for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPrompt {
    text: String,
}

impl CompiledPrompt {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl std::fmt::Display for CompiledPrompt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

const RESPONSE_FORMAT: &str = r#"RESPONSE FORMAT (JSON ONLY):
{
  "type": "SELECT" (for queries) or "DML" (for update/insert/delete) or "CHAT" (for greetings/errors),
  "sql": "The SQL statement" (or null if CHAT),
  "message": "A brief summary of what you did"
}
"#;

/// Builds instruction documents. Holds no per-request state.
#[derive(Debug, Clone)]
pub struct PromptCompiler {
    schema: &'static SchemaDescriptor,
    rules: PromptRules,
}

impl Default for PromptCompiler {
    fn default() -> Self {
        Self::new(academic_schema(), PromptRules::default())
    }
}

impl PromptCompiler {
    pub fn new(schema: &'static SchemaDescriptor, rules: PromptRules) -> Self {
        Self { schema, rules }
    }

    pub fn schema(&self) -> &'static SchemaDescriptor {
        self.schema
    }

    /// Compile the instruction document for `question`.
    ///
    /// Output depends only on the question, the rules and the schema version.
    pub fn compile(&self, question: &str) -> CompiledPrompt {
        let rules = &self.rules;
        let mut text = String::with_capacity(self.schema.render().len() + 1024);

        let _ = writeln!(text, "ROLE: {}", rules.role);
        let _ = writeln!(text, "MISSION: {}", rules.mission);
        text.push('\n');

        text.push_str("STRICT RULES:\n");
        let mut rule_no = 1;
        if !rules.retired_columns.is_empty() {
            let quoted: Vec<String> = rules
                .retired_columns
                .iter()
                .map(|c| format!("'{}'", c))
                .collect();
            let _ = writeln!(
                text,
                "{}. MEMORY WIPE: Do NOT use old columns like {}. They do not exist.",
                rule_no,
                quoted.join(", ")
            );
            rule_no += 1;
        }
        if !rules.concepts.is_empty() {
            let _ = writeln!(text, "{}. NEW LOGIC:", rule_no);
            for mapping in &rules.concepts {
                match mapping.detail {
                    Some(detail) => {
                        let _ = writeln!(
                            text,
                            "   - Use '{}' for {} ({}).",
                            mapping.column, mapping.concept, detail
                        );
                    }
                    None => {
                        let _ = writeln!(text, "   - Use '{}' for {}.", mapping.column, mapping.concept);
                    }
                }
            }
            rule_no += 1;
        }
        let _ = writeln!(
            text,
            "{}. SQL SYNTAX: {} dialect. Always join tables when necessary.",
            rule_no, rules.dialect
        );
        text.push('\n');

        text.push_str("DATABASE SCHEMA:\n");
        text.push_str(self.schema.render());
        text.push('\n');

        let _ = writeln!(text, "USER QUERY: \"{}\"", question);
        text.push('\n');

        text.push_str(RESPONSE_FORMAT);

        CompiledPrompt { text }
    }
}
