//! Named, strictly sequential steps of the install workflow.
mod context;
pub mod dependencies;
pub mod login_shell;
mod processing;
pub mod shell_config;

pub use context::Context;
pub use processing::process_resource;

use anyhow::{Result, bail};

use crate::config::Config;
use crate::logging::TaskStatus;

/// Result of a single step.
///
/// # Examples
///
/// ```
/// use devsetup_cli::tasks::TaskResult;
///
/// let skipped = TaskResult::Skipped("no asset for riscv64".into());
/// assert!(matches!(skipped, TaskResult::Skipped(_)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskResult {
    /// Step completed; the system is in the desired state.
    Ok,
    /// Step gave up on an optional goal; the run continues.
    Skipped(String),
    /// Step ran in dry-run mode.
    DryRun,
}

/// A named, executable step.
pub trait Task: Send + Sync {
    /// Human-readable step name, also matched by `--skip`/`--only`.
    fn name(&self) -> &str;

    /// Whether this step applies to the current machine.
    fn should_run(&self, ctx: &Context) -> bool;

    /// Execute the step.
    ///
    /// # Errors
    ///
    /// Returns an error when the step cannot reach its goal and the
    /// workflow must stop, e.g. a required dependency could not be installed.
    fn run(&self, ctx: &Context) -> Result<TaskResult>;
}

/// Every step of the install workflow, in execution order.
///
/// One `Install <name>` step per manifest dependency, then the shell
/// config, then the login shell.
#[must_use]
pub fn install_tasks(config: &Config) -> Vec<Box<dyn Task>> {
    let mut tasks: Vec<Box<dyn Task>> = config
        .dependencies
        .iter()
        .map(|dep| Box::new(dependencies::InstallDependency::new(dep.clone())) as Box<dyn Task>)
        .collect();
    tasks.push(Box::new(shell_config::WriteShellConfig));
    tasks.push(Box::new(login_shell::ConfigureShell));
    tasks
}

/// Keep the steps selected by `--only`/`--skip`.
///
/// Both match a case-insensitive substring of the step name. `only` wins
/// when both are given.
#[must_use]
pub fn filter_tasks<'a>(
    tasks: &'a [Box<dyn Task>],
    skip: &[String],
    only: &[String],
) -> Vec<&'a dyn Task> {
    tasks
        .iter()
        .filter(|t| {
            let name = t.name().to_lowercase();
            if !only.is_empty() {
                return only.iter().any(|o| name.contains(&o.to_lowercase()));
            }
            !skip.iter().any(|s| name.contains(&s.to_lowercase()))
        })
        .map(AsRef::as_ref)
        .collect()
}

/// Execute one step, recording its result in the logger.
///
/// # Errors
///
/// Returns the step's error after recording it as failed.
pub fn execute(task: &dyn Task, ctx: &Context) -> Result<()> {
    if !task.should_run(ctx) {
        ctx.log
            .debug(&format!("skipping step: {} (not applicable)", task.name()));
        ctx.log
            .record_task(task.name(), TaskStatus::NotApplicable, None);
        return Ok(());
    }

    ctx.log.stage(task.name());

    match task.run(ctx) {
        Ok(TaskResult::Ok) => {
            ctx.log.record_task(task.name(), TaskStatus::Ok, None);
        }
        Ok(TaskResult::Skipped(reason)) => {
            ctx.log
                .record_task(task.name(), TaskStatus::Skipped, Some(&reason));
        }
        Ok(TaskResult::DryRun) => {
            ctx.log.record_task(task.name(), TaskStatus::DryRun, None);
        }
        Err(e) => {
            ctx.log.error(&format!("{}: {e:#}", task.name()));
            ctx.log
                .record_task(task.name(), TaskStatus::Failed, Some(&format!("{e:#}")));
            return Err(e);
        }
    }
    Ok(())
}

/// Run `tasks` in order, stopping at the first failed step.
///
/// Steps after a failure are never started. An interrupt requested between
/// steps also stops the run.
///
/// # Errors
///
/// Returns the error of the step that failed, or an error if interrupted.
pub fn run_sequence(tasks: &[&dyn Task], ctx: &Context) -> Result<()> {
    for task in tasks {
        if ctx.is_interrupted() {
            bail!("interrupted before step '{}'", task.name());
        }
        execute(*task, ctx)?;
    }
    Ok(())
}
