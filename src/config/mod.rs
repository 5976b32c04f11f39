//! Configuration for the NLQ gateway.

mod settings;

pub use settings::*;
