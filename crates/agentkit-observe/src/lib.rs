//! Observability setup for agentkit.

pub mod tracing_setup;
