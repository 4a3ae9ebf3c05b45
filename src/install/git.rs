//! Shallow git clones run as the target user.
use anyhow::Context as _;
use std::path::{Path, PathBuf};

use super::{InstallMethod, MethodEnv, MethodError};
use crate::config::dependencies::GitSpec;
use crate::logging::Log;
use crate::resources::fs::move_aside;

/// Clone a repository (depth 1, single branch) into a home-relative path.
///
/// The clone lands in a sibling staging directory and is renamed into place
/// only once git succeeds, so an interrupted clone never leaves a partial
/// checkout at the destination.
#[derive(Debug)]
pub struct GitMethod {
    spec: GitSpec,
    refresh: bool,
    env: MethodEnv,
}

impl GitMethod {
    /// Create a git clone method.
    ///
    /// With `refresh`, an existing destination is replaced by a fresh clone.
    /// Without it, an existing destination is one whose presence check
    /// failed, so it is moved aside as a timestamped backup.
    #[must_use]
    pub const fn new(spec: GitSpec, refresh: bool, env: MethodEnv) -> Self {
        Self { spec, refresh, env }
    }

    fn clone_into(&self, dir: &Path) -> anyhow::Result<()> {
        let dir = dir.to_string_lossy().into_owned();
        let mut args = vec!["clone", "--depth", "1", "--single-branch", "--quiet"];
        if let Some(branch) = &self.spec.branch {
            args.extend(["--branch", branch.as_str()]);
        }
        args.extend([self.spec.url.as_str(), dir.as_str()]);
        self.env
            .user
            .run("git", &args)
            .with_context(|| format!("cloning {}", self.spec.url))?;
        Ok(())
    }

    /// Move the finished clone over `dest`.
    fn swap_in(&self, staging: &Path, dest: &Path, log: &dyn Log) -> anyhow::Result<()> {
        if dest.exists() {
            if self.refresh {
                log.debug(&format!("replacing {}", dest.display()));
                std::fs::remove_dir_all(dest)
                    .with_context(|| format!("removing {}", dest.display()))?;
            } else {
                let aside = move_aside(dest)?;
                log.warn(&format!(
                    "{} held an incomplete checkout, kept as {}",
                    dest.display(),
                    aside.display()
                ));
            }
        }
        std::fs::rename(staging, dest)
            .with_context(|| format!("moving clone into {}", dest.display()))?;
        Ok(())
    }
}

/// Sibling directory a clone is staged in before it replaces `dest`.
fn staging_path(dest: &Path) -> PathBuf {
    PathBuf::from(format!("{}.devsetup-partial", dest.display()))
}

impl InstallMethod for GitMethod {
    fn description(&self) -> String {
        format!("git clone {}", self.spec.url)
    }

    fn attempt(&self, log: &dyn Log) -> Result<(), MethodError> {
        if !self.env.user.which("git") {
            return Err(MethodError::Unsupported("git not found".to_string()));
        }
        let dest = self.env.identity.expand(&self.spec.dest);
        let staging = staging_path(&dest);
        if staging.exists() {
            log.debug(&format!("removing stale {}", staging.display()));
            std::fs::remove_dir_all(&staging)
                .with_context(|| format!("removing {}", staging.display()))?;
        }

        if let Err(e) = self.clone_into(&staging) {
            if staging.exists() {
                let _ = std::fs::remove_dir_all(&staging);
            }
            return Err(e.into());
        }
        self.swap_in(&staging, &dest, log)?;
        Ok(())
    }
}
