//! Workstation provisioning engine.
//!
//! Brings a developer machine to a known state: system packages, a shell
//! framework with its theme and plugins, optional CLI tools fetched from
//! release assets, an interpreter distribution, a rendered shell config and
//! the default login shell. Every step checks current state first, so
//! re-running converges instead of repeating work.
//!
//! The public API is organised into layers:
//!
//! - **[`config`]**: parse and validate the TOML manifest of dependencies
//! - **[`identity`]**: resolve the user every action applies to
//! - **[`exec`]**: run external programs, directly or as the target user
//! - **[`install`]**: install methods and the ordered fallback between them
//! - **[`resources`]**: idempotent `check + apply` primitives (shell config, login shell)
//! - **[`tasks`]**: named, strictly sequential steps wired to the above
//! - **[`commands`]**: top-level subcommand orchestration (`install`, `verify`)
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod identity;
pub mod install;
pub mod logging;
pub mod platform;
pub mod resources;
pub mod tasks;
