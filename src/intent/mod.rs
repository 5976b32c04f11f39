//! Structured intents and the interpreter that produces them.
//!
//! Raw endpoint output is mapped into the closed [`Intent`] variant here and
//! nowhere else; nothing past this module sees the free-form JSON.

mod interpreter;
mod types;

pub use interpreter::{strip_code_fences, ResponseInterpreter};
pub use types::{GeneratedStatement, Intent, IntentKind};
