//! Check-then-apply loop for a single resource.
use anyhow::{Result, bail};

use super::{Context, TaskResult};
use crate::resources::{Resource, ResourceChange, ResourceState};

/// Bring `resource` into its desired state.
///
/// A correct resource is left alone. A missing or incorrect one is applied,
/// or only reported in dry-run mode. `verb` is used in log messages
/// ("write", "change").
///
/// # Errors
///
/// Returns an error if the state cannot be read, the resource is in a state
/// that cannot be fixed, or applying it fails.
pub fn process_resource<R: Resource>(ctx: &Context, resource: &R, verb: &str) -> Result<TaskResult> {
    let desc = resource.description();
    match resource.current_state()? {
        ResourceState::Correct => {
            ctx.log.info(&format!("already up to date: {desc}"));
            Ok(TaskResult::Ok)
        }
        ResourceState::Invalid { reason } => {
            bail!("cannot {verb} {desc}: {reason}")
        }
        state @ (ResourceState::Missing | ResourceState::Incorrect { .. }) => {
            if ctx.dry_run {
                let msg = if let ResourceState::Incorrect { current } = state {
                    format!("would {verb} {desc} (currently {current})")
                } else {
                    format!("would {verb}: {desc}")
                };
                ctx.log.dry_run(&msg);
                return Ok(TaskResult::DryRun);
            }
            match resource.apply()? {
                ResourceChange::Applied => {
                    ctx.log.info(&format!("{verb}: {desc}"));
                    Ok(TaskResult::Ok)
                }
                ResourceChange::AlreadyCorrect => Ok(TaskResult::Ok),
                ResourceChange::Skipped { reason } => {
                    ctx.log.warn(&format!("did not {verb} {desc}: {reason}"));
                    Ok(TaskResult::Skipped(reason))
                }
            }
        }
    }
}
