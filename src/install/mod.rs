//! Install-method strategies, the fallback resolver and the idempotent
//! installer that drives them.
//!
//! Each [`MethodSpec`] in the manifest becomes one [`InstallMethod`].  The
//! [`Installer`] checks presence first and only then hands the ordered
//! method list to [`resolver::resolve`], which tries each in turn.
pub mod fetch;
mod git;
mod installer;
mod package;
pub mod presence;
mod release;
pub mod resolver;
mod script;

pub use installer::{InstallOutcome, Installer};

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use thiserror::Error;

use crate::config::dependencies::MethodSpec;
use crate::error::ProvisionError;
use crate::exec::Executor;
use crate::identity::TargetIdentity;
use crate::logging::Log;
use crate::platform::Arch;
use fetch::{Fetcher, Retry};

/// Why a single install method did not succeed.
#[derive(Error, Debug)]
pub enum MethodError {
    /// The method cannot be used on this machine; try the next one.
    #[error("not applicable: {0}")]
    Unsupported(String),

    /// A download exhausted its retry budget.
    #[error(transparent)]
    Network(ProvisionError),

    /// The method ran and failed.
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

/// One strategy for obtaining a dependency.
pub trait InstallMethod: std::fmt::Debug {
    /// Human-readable description, e.g. `apt-get install eza`.
    fn description(&self) -> String;

    /// Try to install.
    ///
    /// # Errors
    ///
    /// Returns a [`MethodError`] describing why the method did not succeed.
    fn attempt(&self, log: &dyn Log) -> Result<(), MethodError>;
}

/// Everything an install method needs from its surroundings.
#[derive(Debug, Clone)]
pub struct MethodEnv {
    /// Runs commands as the process itself (staging, extraction).
    pub local: Arc<dyn Executor>,
    /// Runs commands as the target user.
    pub user: Arc<dyn Executor>,
    /// Runs commands as root.
    pub root: Arc<dyn Executor>,
    /// Downloads release assets and installer scripts.
    pub fetcher: Arc<dyn Fetcher>,
    /// Retry policy for downloads.
    pub retry: Retry,
    /// Target identity.
    pub identity: Arc<TargetIdentity>,
    /// Architecture used for asset lookups.
    pub arch: Arch,
    /// Set once the apt package index has been refreshed this run.
    pub apt_index_fresh: Arc<AtomicBool>,
}

impl MethodEnv {
    /// Build the strategy for one manifest method entry.
    ///
    /// `refresh` is forwarded to methods that must clear an existing
    /// destination before fetching again.
    #[must_use]
    pub fn build(&self, spec: &MethodSpec, refresh: bool) -> Box<dyn InstallMethod> {
        match spec {
            MethodSpec::Package { manager, packages } => Box::new(package::PackageMethod::new(
                *manager,
                packages.clone(),
                self.clone(),
            )),
            MethodSpec::Release(release) => {
                Box::new(release::ReleaseMethod::new(release.clone(), self.clone()))
            }
            MethodSpec::Git(git) => Box::new(git::GitMethod::new(git.clone(), refresh, self.clone())),
            MethodSpec::Script(script) => {
                Box::new(script::ScriptMethod::new(script.clone(), self.clone()))
            }
        }
    }
}

/// Create a private staging directory, removed when the guard drops.
fn staging_dir() -> anyhow::Result<tempfile::TempDir> {
    use anyhow::Context as _;
    tempfile::Builder::new()
        .prefix("devsetup-")
        .tempdir()
        .context("creating staging directory")
}

/// Last path component of a URL, used to name downloaded files.
fn file_name_of(url: &str) -> &str {
    url.rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("download")
}

/// Hand ownership of `path` to the target user when commands run as them.
fn give_to_target(path: &Path, identity: &TargetIdentity) -> anyhow::Result<()> {
    use anyhow::Context as _;
    if identity.requires_switch() && identity.is_privileged() {
        std::os::unix::fs::chown(path, Some(identity.uid), Some(identity.gid))
            .with_context(|| format!("changing owner of {}", path.display()))?;
    }
    Ok(())
}
