//! Engine logic for agentkit: manifests, sources, dependency graphs and
//! install planning. Nothing here writes to disk except [`link`], which goes
//! through a [`link::LinkPlatform`].

pub mod graph;
pub mod link;
pub mod manifest;
pub mod plan;
pub mod probe;
pub mod source;
pub mod update;
