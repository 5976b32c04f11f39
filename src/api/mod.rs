//! HTTP API.
//!
//! Exposes the gateway as `GET /ai/search`, plus health and metrics
//! endpoints, behind the token gatekeeper.

mod handlers;
mod rest;

pub use handlers::*;
pub use rest::*;
