//! The idempotent installer: check presence, then fall back through methods.
use std::fmt;

use super::{MethodEnv, presence, resolver};
use crate::config::dependencies::DependencySpec;
use crate::error::ProvisionError;
use crate::logging::Log;

/// What happened to one dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// The presence check already passed; nothing was done.
    AlreadyPresent,
    /// Installed by the `method`-th method (1-based) in declared order.
    Installed {
        /// 1-based index of the method that succeeded.
        method: usize,
        /// Description of that method.
        description: String,
    },
    /// An optional dependency could not be obtained; the run continues.
    Skipped {
        /// Why every method failed.
        reason: String,
    },
}

impl fmt::Display for InstallOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyPresent => write!(f, "already present"),
            Self::Installed {
                method,
                description,
            } => write!(f, "installed via method {method} ({description})"),
            Self::Skipped { reason } => write!(f, "skipped: {reason}"),
        }
    }
}

/// Installs dependencies that are not yet present.
#[derive(Debug, Clone)]
pub struct Installer {
    env: MethodEnv,
}

impl Installer {
    /// Create an installer over a method environment.
    #[must_use]
    pub const fn new(env: MethodEnv) -> Self {
        Self { env }
    }

    /// Evaluate the dependency's presence check.
    #[must_use]
    pub fn is_present(&self, dep: &DependencySpec) -> bool {
        presence::is_present(&dep.check, self.env.user.as_ref(), &self.env.identity)
    }

    /// Ensure `dep` is installed.
    ///
    /// A present dependency is left alone, unless it is marked `refresh`, in
    /// which case it is fetched again on every run.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::FatalPrerequisite`] when a required
    /// dependency cannot be installed by any method.
    pub fn install(
        &self,
        dep: &DependencySpec,
        log: &dyn Log,
    ) -> Result<InstallOutcome, ProvisionError> {
        if self.is_present(dep) {
            if !dep.refresh {
                log.debug(&format!("{}: already present ({})", dep.name, dep.check));
                return Ok(InstallOutcome::AlreadyPresent);
            }
            log.info(&format!("{}: always refreshed, fetching again", dep.name));
        }
        let methods: Vec<_> = dep
            .methods
            .iter()
            .map(|m| self.env.build(m, dep.refresh))
            .collect();
        resolver::resolve(dep, &methods, log)
    }
}
