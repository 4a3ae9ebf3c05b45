//! Dependency descriptors: what to install, how to detect it, and how to
//! obtain it.
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::platform::Arch;

/// Placeholder in URL templates replaced by the architecture's asset name.
pub const ASSET_PLACEHOLDER: &str = "{asset}";

/// Placeholder in script arguments replaced by the expanded destination.
pub const DEST_PLACEHOLDER: &str = "{dest}";

/// One installable tool, framework, theme, plugin or interpreter.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DependencySpec {
    /// Unique name, also used as the step name suffix.
    pub name: String,
    /// Whether the rest of the workflow cannot proceed without it.
    #[serde(default)]
    pub required: bool,
    /// Remove and re-fetch on every run instead of skipping when present.
    ///
    /// This is the one deliberate exception to idempotence, used for
    /// cosmetic content that should always track upstream.
    #[serde(default)]
    pub refresh: bool,
    /// Presence predicate.
    pub check: Presence,
    /// Install methods, tried strictly in this order.
    pub methods: Vec<MethodSpec>,
    /// Command line printing the installed version, for the verifier.
    #[serde(default)]
    pub version: Option<Vec<String>>,
    /// Shell framework theme this dependency provides.
    #[serde(default)]
    pub theme: Option<String>,
    /// Shell framework plugin this dependency provides.
    #[serde(default)]
    pub plugin: Option<String>,
    /// Shell snippet appended to the config while the dependency is present.
    #[serde(default)]
    pub snippet: Option<String>,
}

impl DependencySpec {
    /// Whether the dependency contributes anything to the shell config.
    #[must_use]
    pub const fn has_integration(&self) -> bool {
        self.theme.is_some() || self.plugin.is_some() || self.snippet.is_some()
    }
}

/// How to tell whether a dependency is already satisfied.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Presence {
    /// An executable of this name resolves on `PATH`.
    Command {
        /// Executable name.
        command: String,
    },
    /// A path, `~`-relative to the target home, exists.
    Path {
        /// Path to test.
        path: String,
    },
}

impl fmt::Display for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command { command } => write!(f, "command {command}"),
            Self::Path { path } => write!(f, "path {path}"),
        }
    }
}

/// Supported system package managers.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    /// Debian/Ubuntu `apt-get`.
    Apt,
    /// Arch Linux `pacman`.
    Pacman,
}

impl PackageManager {
    /// Executable name.
    #[must_use]
    pub const fn program(self) -> &'static str {
        match self {
            Self::Apt => "apt-get",
            Self::Pacman => "pacman",
        }
    }
}

/// One way of obtaining a dependency.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MethodSpec {
    /// Install through the system package manager.
    Package {
        /// Which package manager.
        manager: PackageManager,
        /// Packages to install.
        packages: Vec<String>,
    },
    /// Download a release archive and install one binary from it.
    Release(ReleaseSpec),
    /// Shallow clone of a git repository.
    Git(GitSpec),
    /// Download an installer script and run it non-interactively.
    Script(ScriptSpec),
}

impl MethodSpec {
    /// Short label for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Package { .. } => "package",
            Self::Release(_) => "release",
            Self::Git(_) => "git",
            Self::Script(_) => "script",
        }
    }
}

/// Binary release archive parameters.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ReleaseSpec {
    /// URL template containing `{asset}`.
    pub url: String,
    /// Canonical architecture name to asset file name.
    pub assets: BTreeMap<String, String>,
    /// Executable expected inside the archive.
    pub binary: String,
    /// Directory the executable is installed into.
    #[serde(default = "default_install_dir")]
    pub install_dir: String,
    /// Octal permission bits of the installed executable.
    #[serde(default = "default_binary_mode")]
    pub mode: String,
    /// Optional SHA-256 digests keyed by canonical architecture name.
    #[serde(default)]
    pub sha256: BTreeMap<String, String>,
}

/// Git clone parameters.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct GitSpec {
    /// Repository URL.
    pub url: String,
    /// Clone destination, `~`-relative.
    pub dest: String,
    /// Branch to clone instead of the remote default.
    #[serde(default)]
    pub branch: Option<String>,
}

/// Installer script parameters.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ScriptSpec {
    /// URL template containing `{asset}`.
    pub url: String,
    /// Canonical architecture name to script file name.
    pub assets: BTreeMap<String, String>,
    /// Arguments passed to the script; `{dest}` expands to `dest`.
    #[serde(default)]
    pub args: Vec<String>,
    /// Installation directory, `~`-relative.
    pub dest: String,
}

fn default_install_dir() -> String {
    "/usr/local/bin".to_string()
}

fn default_binary_mode() -> String {
    "755".to_string()
}

/// Look up the asset for `arch` and substitute it into `url`.
///
/// Returns `None` when the architecture is unknown or has no entry.
#[must_use]
pub fn asset_url(url: &str, assets: &BTreeMap<String, String>, arch: &Arch) -> Option<String> {
    let asset = assets.get(arch.key()?)?;
    Some(url.replace(ASSET_PLACEHOLDER, asset))
}
