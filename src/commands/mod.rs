//! Top-level subcommand orchestration.
pub mod install;
pub mod verify;

use anyhow::Result;
use std::sync::Arc;

use crate::cli::GlobalOpts;
use crate::config::Config;
use crate::exec::Executor;
use crate::identity::TargetIdentity;
use crate::logging::Log;
use crate::platform::Platform;

/// Shared state produced by the common command setup sequence.
#[derive(Debug)]
pub struct CommandSetup {
    /// Detected (or overridden) platform.
    pub platform: Arc<Platform>,
    /// Validated manifest.
    pub config: Arc<Config>,
}

impl CommandSetup {
    /// Detect the platform and load the manifest.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest cannot be read or fails validation.
    pub fn init(global: &GlobalOpts, log: &dyn Log) -> Result<Self> {
        let platform = Platform::detect(global.arch.as_deref());
        log.debug(&format!("platform: {} {}", platform.os, platform.arch));

        log.stage("Loading manifest");
        let config = Config::load(global.config.as_deref())?;
        let required = config.dependencies.iter().filter(|d| d.required).count();
        log.info(&format!(
            "{} dependencies ({required} required)",
            config.dependencies.len()
        ));

        Ok(Self {
            platform: Arc::new(platform),
            config: Arc::new(config),
        })
    }
}

/// Describe the resolved identity in the log.
fn log_identity(identity: &TargetIdentity, log: &dyn Log) {
    log.info(&format!(
        "target user: {} (uid {}, group {}), home {}",
        identity.user,
        identity.uid,
        identity.group,
        identity.home.display()
    ));
    if identity.requires_switch() {
        log.debug("commands for the target user run through sudo");
    }
}

/// The user `sudo` recorded as the invoker, if any.
fn sudo_user() -> Option<String> {
    std::env::var("SUDO_USER").ok()
}

/// Build the process-level executor.
fn system_executor() -> Arc<dyn Executor> {
    Arc::new(crate::exec::SystemExecutor)
}
