//! `PATH` lookup for declared CLI dependencies.

use agentkit_core::probe::CliProbe;

/// Looks executables up on `PATH` with the same rules a shell would use.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathProbe;

impl CliProbe for PathProbe {
    fn is_available(&self, command: &str) -> bool {
        which::which(command).is_ok()
    }
}
