//! Presence predicates: is a dependency already satisfied?
use crate::config::dependencies::Presence;
use crate::exec::Executor;
use crate::identity::TargetIdentity;

/// Evaluate a presence check.
///
/// Command checks consult `PATH` through `executor`; path checks expand `~`
/// against the target home, never against `$HOME`.
#[must_use]
pub fn is_present(check: &Presence, executor: &dyn Executor, identity: &TargetIdentity) -> bool {
    match check {
        Presence::Command { command } => executor.which(command),
        Presence::Path { path } => identity.expand(path).exists(),
    }
}
