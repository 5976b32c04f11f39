//! Question-answering gateway.
//!
//! [`Gateway`] runs one question through prompt compilation, the oracle, the
//! response interpreter and the [`IntentRouter`], always producing a
//! [`ResultEnvelope`].

mod pipeline;
mod router;

pub use pipeline::{oracle_failure_message, Gateway, RequestStage};
pub use router::{write_confirmation, EnvelopeData, IntentRouter, ResultEnvelope};
