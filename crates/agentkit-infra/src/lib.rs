//! Infrastructure layer for agentkit.
//!
//! Side-effecting adapters around the engine in `agentkit-core`: the
//! filesystem installer, skill registry initialization, `PATH` probing,
//! native links, and project configuration loading.

pub mod config;
pub mod installer;
pub mod link;
pub mod paths;
pub mod probe;
pub mod registry;
