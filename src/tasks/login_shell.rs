//! Make the configured shell the target user's login shell.
use anyhow::Result;

use super::{Context, Task, TaskResult, process_resource};
use crate::error::ProvisionError;
use crate::resources::login_shell::LoginShellResource;

/// Change the target user's login shell.
#[derive(Debug)]
pub struct ConfigureShell;

impl Task for ConfigureShell {
    fn name(&self) -> &'static str {
        "Configure default shell"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        // chsh needs an interactive password prompt on most CI runners
        ctx.platform.is_linux() && !ctx.ci
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let binary = &ctx.config.shell.binary;
        let Some(path) = ctx.executor.resolve(binary) else {
            if ctx.dry_run {
                ctx.log
                    .dry_run(&format!("would change login shell to {binary} once installed"));
                return Ok(TaskResult::DryRun);
            }
            return Err(ProvisionError::FatalPrerequisite {
                name: binary.clone(),
                reason: "no executable found on PATH".to_string(),
            }
            .into());
        };
        let resource = LoginShellResource::new(
            ctx.identity.user.clone(),
            path.display().to_string(),
            ctx.executor.as_ref(),
            ctx.root.as_ref(),
        );
        process_resource(ctx, &resource, "change")
    }
}
