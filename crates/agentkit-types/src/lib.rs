//! Shared domain types for agentkit.
//!
//! Manifests, sources, resolved types, dependency trees, install plans,
//! project configuration and the error taxonomy. No I/O lives here.

pub mod config;
pub mod error;
pub mod manifest;
pub mod resolve;
pub mod validation;
