//! Run commands as the target identity or with elevated privileges.
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{ExecResult, Executor};
use crate::identity::TargetIdentity;

/// Whose privileges a wrapped command runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunAs {
    /// The target user, with the target's home as `HOME`.
    Target,
    /// Root.
    Root,
}

/// [`Executor`] decorator that runs every command as the target user or as root.
///
/// When the running process already has the required identity the command
/// runs directly with no `sudo` in between.  Otherwise it is wrapped as
/// `sudo -u <user> -H -- env HOME=<home> …` (target) or `sudo -- …` (root).
/// Failures are propagated unchanged from the inner executor.
#[derive(Debug, Clone)]
pub struct PrivilegedExecutor {
    inner: Arc<dyn Executor>,
    identity: Arc<TargetIdentity>,
    run_as: RunAs,
}

impl PrivilegedExecutor {
    /// Run commands as the target user.
    #[must_use]
    pub fn as_target(inner: Arc<dyn Executor>, identity: Arc<TargetIdentity>) -> Self {
        Self {
            inner,
            identity,
            run_as: RunAs::Target,
        }
    }

    /// Run commands as root.
    #[must_use]
    pub fn elevated(inner: Arc<dyn Executor>, identity: Arc<TargetIdentity>) -> Self {
        Self {
            inner,
            identity,
            run_as: RunAs::Root,
        }
    }

    /// Environment every wrapped command receives.
    fn base_env(&self) -> Vec<(String, String)> {
        match self.run_as {
            RunAs::Target => vec![(
                "HOME".to_string(),
                self.identity.home.display().to_string(),
            )],
            RunAs::Root => Vec::new(),
        }
    }

    /// Build the `sudo` argument vector, or `None` when no switch is needed.
    fn sudo_args(
        &self,
        program: &str,
        args: &[&str],
        env: &[(&str, &str)],
    ) -> Option<Vec<String>> {
        let mut argv: Vec<String> = match self.run_as {
            RunAs::Target if self.identity.requires_switch() => vec![
                "-u".to_string(),
                self.identity.user.clone(),
                "-H".to_string(),
                "--".to_string(),
            ],
            RunAs::Root if !self.identity.is_privileged() => vec!["--".to_string()],
            _ => return None,
        };
        let assignments: Vec<String> = self
            .base_env()
            .into_iter()
            .chain(env.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())))
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        if !assignments.is_empty() {
            argv.push("env".to_string());
            argv.extend(assignments);
        }
        argv.push(program.to_string());
        argv.extend(args.iter().map(ToString::to_string));
        Some(argv)
    }
}

fn as_strs(argv: &[String]) -> Vec<&str> {
    argv.iter().map(String::as_str).collect()
}

fn merge_env<'a>(
    owned: &'a [(String, String)],
    extra: &[(&'a str, &'a str)],
) -> Vec<(&'a str, &'a str)> {
    owned
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .chain(extra.iter().copied())
        .collect()
}

impl Executor for PrivilegedExecutor {
    fn run(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        self.run_with_env(program, args, &[])
    }

    fn run_in(&self, dir: &Path, program: &str, args: &[&str]) -> Result<ExecResult> {
        match self.sudo_args(program, args, &[]) {
            Some(argv) => self.inner.run_in(dir, "sudo", &as_strs(&argv)),
            None if self.run_as == RunAs::Target => {
                // `run_in` carries no environment; route through env(1).
                let home = format!("HOME={}", self.identity.home.display());
                let mut argv = vec![home.as_str(), program];
                argv.extend_from_slice(args);
                self.inner.run_in(dir, "env", &argv)
            }
            None => self.inner.run_in(dir, program, args),
        }
    }

    fn run_with_env(
        &self,
        program: &str,
        args: &[&str],
        env: &[(&str, &str)],
    ) -> Result<ExecResult> {
        match self.sudo_args(program, args, env) {
            Some(argv) => self.inner.run("sudo", &as_strs(&argv)),
            None => {
                let owned = self.base_env();
                let env = merge_env(&owned, env);
                if env.is_empty() {
                    self.inner.run(program, args)
                } else {
                    self.inner.run_with_env(program, args, &env)
                }
            }
        }
    }

    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        match self.sudo_args(program, args, &[]) {
            Some(argv) => self.inner.run_unchecked("sudo", &as_strs(&argv)),
            None if self.run_as == RunAs::Target => {
                let home = format!("HOME={}", self.identity.home.display());
                let mut argv = vec![home.as_str(), program];
                argv.extend_from_slice(args);
                self.inner.run_unchecked("env", &argv)
            }
            None => self.inner.run_unchecked(program, args),
        }
    }

    fn resolve(&self, program: &str) -> Option<PathBuf> {
        self.inner.resolve(program)
    }
}
