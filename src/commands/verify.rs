//! Read-only report of what the install workflow manages.
use anyhow::{Result, bail};
use serde::Serialize;
use std::sync::Arc;

use super::{CommandSetup, log_identity, sudo_user, system_executor};
use crate::cli::{GlobalOpts, VerifyOpts};
use crate::config::Config;
use crate::config::dependencies::DependencySpec;
use crate::exec::{Executor, PrivilegedExecutor};
use crate::identity::{self, TargetIdentity};
use crate::install::presence;
use crate::logging::{Log, Logger, TaskStatus};

/// Presence of one managed dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyReport {
    /// Dependency name.
    pub name: String,
    /// Whether the dependency is required.
    pub required: bool,
    /// Whether its presence check passes.
    pub present: bool,
    /// Summary label: `ok`, `skipped` (optional and missing) or `failed`.
    pub status: &'static str,
    /// First line of the version command's output, when one is configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// State of the managed rc file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShellConfigReport {
    /// Expanded path of the rc file.
    pub path: String,
    /// Whether the file exists.
    pub exists: bool,
}

/// Everything the verifier found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifyReport {
    /// Target user the report describes.
    pub user: String,
    /// One entry per manifest dependency, in manifest order.
    pub dependencies: Vec<DependencyReport>,
    /// The rc file.
    pub shell_config: ShellConfigReport,
}

impl VerifyReport {
    /// Names of required dependencies that are not present.
    #[must_use]
    pub fn missing_required(&self) -> Vec<&str> {
        self.dependencies
            .iter()
            .filter(|d| d.required && !d.present)
            .map(|d| d.name.as_str())
            .collect()
    }
}

/// Run the verify command.
///
/// # Errors
///
/// Returns an error if the target cannot be identified, the manifest cannot
/// be loaded, or a required dependency is missing.
pub fn run(global: &GlobalOpts, opts: &VerifyOpts, log: &Arc<Logger>) -> Result<()> {
    let executor = system_executor();

    log.stage("Resolving target identity");
    let identity = Arc::new(identity::lookup_target(
        executor.as_ref(),
        sudo_user().as_deref(),
    )?);
    log_identity(&identity, log.as_ref());

    let setup = CommandSetup::init(global, log.as_ref())?;
    let user = PrivilegedExecutor::as_target(executor, Arc::clone(&identity));

    let report = verify(&setup.config, &identity, &user, log.as_ref());
    if opts.json {
        let json = serde_json::to_string_pretty(&report)?;
        #[allow(clippy::print_stdout)]
        {
            println!("{json}");
        }
    } else {
        log.print_summary();
    }
    evaluate(&report)
}

/// Build the report and record one entry per dependency in `log`.
///
/// Nothing is installed or written.
#[must_use]
pub fn verify(
    config: &Config,
    identity: &TargetIdentity,
    user: &dyn Executor,
    log: &dyn Log,
) -> VerifyReport {
    log.stage("Checking dependencies");
    let report = collect(config, identity, user);

    for dep in &report.dependencies {
        let status = status_for(dep.present, dep.required);
        let message = match status {
            TaskStatus::Ok => dep.version.as_deref(),
            TaskStatus::Failed => Some("missing"),
            _ => Some("not installed"),
        };
        log.record_task(&dep.name, status, message);
    }

    let rc = &report.shell_config;
    if rc.exists {
        log.record_task("shell config", TaskStatus::Ok, Some(&rc.path));
    } else {
        log.record_task("shell config", TaskStatus::Skipped, Some("not written yet"));
    }
    report
}

/// Evaluate every presence check and version command.
#[must_use]
pub fn collect(config: &Config, identity: &TargetIdentity, user: &dyn Executor) -> VerifyReport {
    let dependencies = config
        .dependencies
        .iter()
        .map(|dep| {
            let present = presence::is_present(&dep.check, user, identity);
            DependencyReport {
                name: dep.name.clone(),
                required: dep.required,
                present,
                status: status_for(present, dep.required).label(),
                version: if present {
                    installed_version(dep, identity, user)
                } else {
                    None
                },
            }
        })
        .collect();

    let rc = identity.expand(&config.shell.rc);
    VerifyReport {
        user: identity.user.clone(),
        dependencies,
        shell_config: ShellConfigReport {
            exists: rc.is_file(),
            path: rc.display().to_string(),
        },
    }
}

const fn status_for(present: bool, required: bool) -> TaskStatus {
    match (present, required) {
        (true, _) => TaskStatus::Ok,
        (false, true) => TaskStatus::Failed,
        (false, false) => TaskStatus::Skipped,
    }
}

/// Run the dependency's version command as the target user.
fn installed_version(
    dep: &DependencySpec,
    identity: &TargetIdentity,
    user: &dyn Executor,
) -> Option<String> {
    let (program, args) = dep.version.as_deref()?.split_first()?;
    let program = identity.expand(program);
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    let result = user
        .run_unchecked(&program.to_string_lossy(), &args)
        .ok()
        .filter(|r| r.success)?;
    let output = if result.stdout.trim().is_empty() {
        result.stderr
    } else {
        result.stdout
    };
    output
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
}

/// Fail when a required dependency is missing.
///
/// # Errors
///
/// Returns an error naming every missing required dependency.
pub fn evaluate(report: &VerifyReport) -> Result<()> {
    let missing = report.missing_required();
    if !missing.is_empty() {
        bail!("required dependencies missing: {}", missing.join(", "));
    }
    Ok(())
}
