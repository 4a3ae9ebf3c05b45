//! Render and install the shell rc file.
use anyhow::Result;

use super::{Context, Task, TaskResult, process_resource};
use crate::config::dependencies::DependencySpec;
use crate::config::validation::parse_mode;
use crate::resources::shell_config::{ShellConfigResource, render};

/// Write the shell config for the target user.
///
/// Theme, plugin and snippet blocks are included only for dependencies whose
/// presence check passes right now, so a tool that was skipped earlier in
/// the run is never referenced.
#[derive(Debug)]
pub struct WriteShellConfig;

impl WriteShellConfig {
    /// Build the resource this step converges.
    fn resource(ctx: &Context) -> Result<ShellConfigResource> {
        let installer = ctx.installer();
        let present: Vec<&DependencySpec> = ctx
            .config
            .dependencies
            .iter()
            .filter(|d| d.has_integration())
            .filter(|d| {
                let found = installer.is_present(d);
                if !found {
                    ctx.log
                        .debug(&format!("{}: not present, leaving it out of the config", d.name));
                }
                found
            })
            .collect();

        let shell = &ctx.config.shell;
        let owner = ctx
            .identity
            .is_privileged()
            .then_some((ctx.identity.uid, ctx.identity.gid));
        Ok(ShellConfigResource::new(
            ctx.identity.expand(&shell.rc),
            render(shell, &present),
            parse_mode(&shell.mode)?,
            owner,
        ))
    }
}

impl Task for WriteShellConfig {
    fn name(&self) -> &'static str {
        "Write shell config"
    }

    fn should_run(&self, _ctx: &Context) -> bool {
        true
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let resource = Self::resource(ctx)?;
        process_resource(ctx, &resource, "write")
    }
}
