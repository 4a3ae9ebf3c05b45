//! System package manager installs.
use std::sync::atomic::Ordering;

use super::{InstallMethod, MethodEnv, MethodError};
use crate::config::dependencies::PackageManager;
use crate::logging::Log;

/// Environment forcing package managers to never prompt.
const NONINTERACTIVE: &[(&str, &str)] = &[("DEBIAN_FRONTEND", "noninteractive")];

/// Install packages through `apt-get` or `pacman`, elevated.
#[derive(Debug)]
pub struct PackageMethod {
    manager: PackageManager,
    packages: Vec<String>,
    env: MethodEnv,
}

impl PackageMethod {
    /// Create a package install method.
    #[must_use]
    pub const fn new(manager: PackageManager, packages: Vec<String>, env: MethodEnv) -> Self {
        Self {
            manager,
            packages,
            env,
        }
    }

    /// Refresh the apt index, at most once per run.
    fn refresh_index(&self, log: &dyn Log) -> anyhow::Result<()> {
        if self.env.apt_index_fresh.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        log.debug("updating apt package index");
        let result = self
            .env
            .root
            .run_with_env("apt-get", &["update", "-qq"], NONINTERACTIVE);
        if result.is_err() {
            self.env.apt_index_fresh.store(false, Ordering::SeqCst);
        }
        result.map(drop)
    }
}

impl InstallMethod for PackageMethod {
    fn description(&self) -> String {
        format!(
            "{} install {}",
            self.manager.program(),
            self.packages.join(" ")
        )
    }

    fn attempt(&self, log: &dyn Log) -> Result<(), MethodError> {
        let program = self.manager.program();
        if !self.env.root.which(program) {
            return Err(MethodError::Unsupported(format!("{program} not found")));
        }
        let packages: Vec<&str> = self.packages.iter().map(String::as_str).collect();
        let mut args: Vec<&str> = match self.manager {
            PackageManager::Apt => {
                self.refresh_index(log)?;
                vec!["install", "-y", "-qq", "--no-install-recommends"]
            }
            PackageManager::Pacman => vec!["-S", "--needed", "--noconfirm"],
        };
        args.extend(packages);
        self.env.root.run_with_env(program, &args, NONINTERACTIVE)?;
        Ok(())
    }
}
