//! CLI command implementations.
//!
//! `serve` runs the HTTP gateway. The remaining commands are one-shot
//! helpers for operators: answer a question from the terminal, inspect the
//! prompt or schema given to the model, and issue access tokens.

mod commands;
mod output;

pub use commands::*;
