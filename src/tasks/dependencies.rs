//! One `Install <name>` step per manifest dependency.
use anyhow::Result;

use super::{Context, Task, TaskResult};
use crate::config::dependencies::{DependencySpec, MethodSpec};
use crate::install::InstallOutcome;

/// Ensure one dependency is present.
#[derive(Debug)]
pub struct InstallDependency {
    name: String,
    dep: DependencySpec,
}

impl InstallDependency {
    /// Create the step for `dep`.
    #[must_use]
    pub fn new(dep: DependencySpec) -> Self {
        Self {
            name: format!("Install {}", dep.name),
            dep,
        }
    }

    fn dry_run(&self, ctx: &Context) -> TaskResult {
        let installer = ctx.installer();
        let dep = &self.dep;
        if installer.is_present(dep) && !dep.refresh {
            ctx.log.info(&format!("{}: already present", dep.name));
        } else {
            let methods: Vec<&str> = dep.methods.iter().map(MethodSpec::kind).collect();
            ctx.log.dry_run(&format!(
                "would install {} (methods: {})",
                dep.name,
                methods.join(" → ")
            ));
        }
        TaskResult::DryRun
    }
}

impl Task for InstallDependency {
    fn name(&self) -> &str {
        &self.name
    }

    fn should_run(&self, _ctx: &Context) -> bool {
        true
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        if ctx.dry_run {
            return Ok(self.dry_run(ctx));
        }
        let outcome = ctx.installer().install(&self.dep, ctx.log.as_ref())?;
        ctx.log.info(&format!("{}: {outcome}", self.dep.name));
        Ok(match outcome {
            InstallOutcome::AlreadyPresent | InstallOutcome::Installed { .. } => TaskResult::Ok,
            InstallOutcome::Skipped { reason } => TaskResult::Skipped(reason),
        })
    }
}
