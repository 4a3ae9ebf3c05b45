//! Provision the target account: install dependencies, write the rc file,
//! and set the login shell.
use anyhow::Result;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use super::{CommandSetup, log_identity, sudo_user, system_executor};
use crate::cli::{GlobalOpts, InstallOpts};
use crate::identity;
use crate::install::fetch::HttpFetcher;
use crate::logging::{Log, Logger};
use crate::tasks::{self, Context};

/// Run the install command.
///
/// # Errors
///
/// Returns an error if identity resolution or manifest loading fails, or
/// if a step fails and stops the workflow.
pub fn run(global: &GlobalOpts, opts: &InstallOpts, log: &Arc<Logger>) -> Result<()> {
    let version = option_env!("DEVSETUP_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"));
    log.info(&format!("devsetup {version}"));

    let executor = system_executor();

    log.stage("Resolving target identity");
    let identity = identity::resolve(executor.as_ref(), sudo_user().as_deref())?;
    log_identity(&identity, log.as_ref());

    let setup = CommandSetup::init(global, log.as_ref())?;

    let ctx = Context::new(
        setup.config,
        setup.platform,
        Arc::new(identity),
        Arc::clone(log) as Arc<dyn Log>,
        executor,
        Arc::new(HttpFetcher::default()),
        global.dry_run,
    );

    let interrupted = Arc::clone(&ctx.interrupted);
    if let Err(e) = ctrlc::set_handler(move || interrupted.store(true, Ordering::SeqCst)) {
        log.debug(&format!("interrupt handler not installed: {e}"));
    }

    provision(&ctx, opts, log)
}

/// Run the selected install steps against `ctx` and print the summary.
///
/// # Errors
///
/// Returns the error of the first failed step; later steps are not run.
pub fn provision(ctx: &Context, opts: &InstallOpts, log: &Logger) -> Result<()> {
    let all_tasks = tasks::install_tasks(&ctx.config);
    let selected = tasks::filter_tasks(&all_tasks, &opts.skip, &opts.only);
    if selected.is_empty() {
        log.warn("no steps selected");
    }

    let result = tasks::run_sequence(&selected, ctx);
    log.print_summary();
    result
}
