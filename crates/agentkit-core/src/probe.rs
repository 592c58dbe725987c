//! Availability probing for external CLI dependencies.
//!
//! The planner only needs a yes/no answer per executable name; the concrete
//! `PATH` lookup lives in the infrastructure layer.

/// Answers whether an executable can be found.
pub trait CliProbe {
    fn is_available(&self, command: &str) -> bool;
}

impl<F> CliProbe for F
where
    F: Fn(&str) -> bool,
{
    fn is_available(&self, command: &str) -> bool {
        self(command)
    }
}
