use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::Config;
use crate::exec::{Executor, PrivilegedExecutor};
use crate::identity::TargetIdentity;
use crate::install::fetch::{Fetcher, Retry};
use crate::install::{Installer, MethodEnv};
use crate::logging::Log;
use crate::platform::Platform;

/// Everything a step needs, threaded explicitly through the workflow.
pub struct Context {
    /// Validated manifest.
    pub config: Arc<Config>,
    /// Detected (or overridden) platform.
    pub platform: Arc<Platform>,
    /// The account every action applies to.
    pub identity: Arc<TargetIdentity>,
    /// Logger for output and step recording.
    pub log: Arc<dyn Log>,
    /// Whether to only report what would change.
    pub dry_run: bool,
    /// Runs commands as the process itself.
    pub executor: Arc<dyn Executor>,
    /// Runs commands as the target user.
    pub user: Arc<dyn Executor>,
    /// Runs commands as root.
    pub root: Arc<dyn Executor>,
    /// Environment handed to install methods.
    pub methods: MethodEnv,
    /// Running under CI, where the login shell is left alone.
    pub ci: bool,
    /// Set by the signal handler; checked between steps.
    pub interrupted: Arc<AtomicBool>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("platform", &self.platform)
            .field("identity", &self.identity)
            .field("log", &"<dyn Log>")
            .field("dry_run", &self.dry_run)
            .field("ci", &self.ci)
            .field("interrupted", &self.interrupted)
            .finish_non_exhaustive()
    }
}

impl Context {
    /// Create a context.
    ///
    /// `executor` runs commands as the process itself; the target-user and
    /// elevated executors are layered on top of it.  `CI` is read from the
    /// environment once, here.
    #[must_use]
    pub fn new(
        config: Arc<Config>,
        platform: Arc<Platform>,
        identity: Arc<TargetIdentity>,
        log: Arc<dyn Log>,
        executor: Arc<dyn Executor>,
        fetcher: Arc<dyn Fetcher>,
        dry_run: bool,
    ) -> Self {
        let user: Arc<dyn Executor> = Arc::new(PrivilegedExecutor::as_target(
            Arc::clone(&executor),
            Arc::clone(&identity),
        ));
        let root: Arc<dyn Executor> = Arc::new(PrivilegedExecutor::elevated(
            Arc::clone(&executor),
            Arc::clone(&identity),
        ));
        let methods = MethodEnv {
            local: Arc::clone(&executor),
            user: Arc::clone(&user),
            root: Arc::clone(&root),
            fetcher,
            retry: Retry::default(),
            identity: Arc::clone(&identity),
            arch: platform.arch.clone(),
            apt_index_fresh: Arc::new(AtomicBool::new(false)),
        };
        Self {
            config,
            platform,
            identity,
            log,
            dry_run,
            executor,
            user,
            root,
            methods,
            ci: std::env::var_os("CI").is_some(),
            interrupted: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Replace the download retry policy.
    #[must_use]
    pub const fn with_retry(mut self, retry: Retry) -> Self {
        self.methods.retry = retry;
        self
    }

    /// Installer over this context's method environment.
    #[must_use]
    pub fn installer(&self) -> Installer {
        Installer::new(self.methods.clone())
    }

    /// Whether an interrupt has been requested.
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }
}
