//! Domain-specific error types for the provisioning engine.
//!
//! Internal modules return typed errors while command handlers at the CLI
//! boundary convert them to [`anyhow::Error`] via the standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! ProvisionError
//! ├── FatalPrerequisite   : required dependency unavailable, aborts the run
//! ├── DegradedOptional    : optional dependency unavailable, run continues
//! ├── TransientNetwork    : download failed after bounded retry
//! └── UnsupportedPlatform : no release asset for this architecture
//! IdentityError           : target user cannot be resolved or used
//! ConfigError             : manifest parsing and validation
//! ```

use thiserror::Error;

/// Failure kinds of the provisioning workflow.
///
/// Only [`ProvisionError::FatalPrerequisite`] ever aborts a run; the other
/// variants are downgraded to warnings by the installer that observes them.
#[derive(Error, Debug)]
pub enum ProvisionError {
    /// A dependency the rest of the workflow strictly needs is unavailable.
    #[error("required prerequisite '{name}' is unavailable: {reason}")]
    FatalPrerequisite {
        /// Name of the missing prerequisite.
        name: String,
        /// Why every method to obtain it failed.
        reason: String,
    },

    /// An optional dependency could not be obtained by any method.
    #[error("optional dependency '{name}' skipped: {reason}")]
    DegradedOptional {
        /// Name of the skipped dependency.
        name: String,
        /// Why every method failed.
        reason: String,
    },

    /// A download did not succeed within the retry budget.
    #[error("download of {url} failed after {attempts} attempt(s): {reason}")]
    TransientNetwork {
        /// URL that could not be fetched.
        url: String,
        /// Number of attempts made.
        attempts: u32,
        /// Last error observed.
        reason: String,
    },

    /// The release lookup table has no asset for the running architecture.
    #[error("no release asset for architecture '{arch}'")]
    UnsupportedPlatform {
        /// Architecture that had no entry.
        arch: String,
    },
}

impl ProvisionError {
    /// Whether this error must stop the workflow.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::FatalPrerequisite { .. })
    }
}

/// Errors raised while resolving the target identity.
#[derive(Error, Debug)]
pub enum IdentityError {
    /// The account database has no entry for the user.
    #[error("user '{0}' not found in the account database")]
    UnknownUser(String),

    /// An account database entry could not be parsed.
    #[error("malformed account entry: {0}")]
    MalformedEntry(String),

    /// The target home directory does not exist.
    #[error("home directory {0} does not exist")]
    MissingHome(String),

    /// The target home directory exists but cannot be written.
    #[error("home directory {0} is not writable")]
    UnwritableHome(String),
}

/// Errors that arise from manifest loading and validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Two dependencies share the same name.
    #[error("duplicate dependency name '{0}'")]
    DuplicateDependency(String),

    /// A dependency declares no install method.
    #[error("dependency '{0}' has no install methods")]
    NoMethods(String),

    /// A download URL template lacks the `{{asset}}` placeholder.
    #[error("dependency '{name}': url '{url}' must contain {{asset}}")]
    MissingAssetPlaceholder {
        /// Dependency the method belongs to.
        name: String,
        /// Offending URL template.
        url: String,
    },

    /// A permission string is not a valid octal mode.
    #[error("invalid octal mode '{0}'")]
    InvalidMode(String),
}
