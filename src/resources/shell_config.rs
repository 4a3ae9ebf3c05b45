//! Rendered shell rc file with backup and atomic replacement.
use anyhow::{Context as _, Result};
use std::fmt::Write as _;
use std::os::unix::fs::PermissionsExt as _;
use std::path::PathBuf;

use super::fs::{backup_file, write_atomic};
use super::{Applicable, Resource, ResourceChange, ResourceState};
use crate::config::dependencies::DependencySpec;
use crate::config::shell::ShellConfig;

/// First line of every rendered file.
const HEADER: &str = "# Managed by devsetup. Local edits are replaced on the next run;\n\
                      # earlier versions are kept next to this file as *.devsetup-backup-*.";

/// Write `~/` as `$HOME/` so the file stays valid if the home moves.
fn shell_path(path: &str) -> String {
    path.strip_prefix("~/")
        .map_or_else(|| path.to_string(), |rest| format!("$HOME/{rest}"))
}

/// Render the rc file.
///
/// `present` holds the dependencies whose presence check currently passes;
/// only they contribute a theme, plugins or snippet blocks, so the result
/// never refers to a tool that is not installed.
#[must_use]
pub fn render(shell: &ShellConfig, present: &[&DependencySpec]) -> String {
    let theme = present
        .iter()
        .find_map(|d| d.theme.as_deref())
        .unwrap_or(&shell.default_theme);

    let mut plugins: Vec<&str> = shell.plugins.iter().map(String::as_str).collect();
    for plugin in present.iter().filter_map(|d| d.plugin.as_deref()) {
        if !plugins.contains(&plugin) {
            plugins.push(plugin);
        }
    }

    let mut out = String::new();
    let _ = writeln!(out, "{HEADER}");
    let _ = writeln!(out);
    let _ = writeln!(out, "export ZSH=\"{}\"", shell_path(&shell.framework_dir));
    let _ = writeln!(out, "ZSH_THEME=\"{theme}\"");
    let _ = writeln!(out, "plugins=({})", plugins.join(" "));
    let _ = writeln!(out);
    let _ = writeln!(out, "source \"$ZSH/oh-my-zsh.sh\"");

    for dep in present {
        let Some(snippet) = dep.snippet.as_deref() else {
            continue;
        };
        let _ = writeln!(out);
        let _ = writeln!(out, "# >>> {} >>>", dep.name);
        let _ = writeln!(out, "{}", snippet.trim_end());
        let _ = writeln!(out, "# <<< {} <<<", dep.name);
    }
    out
}

/// The target user's shell rc file.
///
/// Any existing file whose content or mode differs is first copied to a
/// timestamped backup, then replaced atomically.
#[derive(Debug, Clone)]
pub struct ShellConfigResource {
    /// Absolute path of the rc file.
    pub path: PathBuf,
    /// Desired content.
    pub content: String,
    /// Desired permission bits.
    pub mode: u32,
    /// uid/gid to assign; `None` keeps the writer's own.
    pub owner: Option<(u32, u32)>,
}

impl ShellConfigResource {
    /// Create a new shell config resource.
    #[must_use]
    pub const fn new(path: PathBuf, content: String, mode: u32, owner: Option<(u32, u32)>) -> Self {
        Self {
            path,
            content,
            mode,
            owner,
        }
    }
}

impl Applicable for ShellConfigResource {
    fn description(&self) -> String {
        self.path.display().to_string()
    }

    fn apply(&self) -> Result<ResourceChange> {
        if self.path.exists() {
            backup_file(&self.path, self.owner)?;
        }
        write_atomic(&self.path, &self.content, self.mode, self.owner)?;
        Ok(ResourceChange::Applied)
    }
}

impl Resource for ShellConfigResource {
    fn current_state(&self) -> Result<ResourceState> {
        if self.path.is_dir() {
            return Ok(ResourceState::Invalid {
                reason: "path is a directory".to_string(),
            });
        }
        if !self.path.exists() {
            return Ok(ResourceState::Missing);
        }
        let current = std::fs::read(&self.path)
            .with_context(|| format!("reading {}", self.path.display()))?;
        if current != self.content.as_bytes() {
            return Ok(ResourceState::Incorrect {
                current: "content differs".to_string(),
            });
        }
        let mode = std::fs::metadata(&self.path)
            .with_context(|| format!("reading metadata: {}", self.path.display()))?
            .permissions()
            .mode()
            & 0o7777;
        if mode != self.mode {
            return Ok(ResourceState::Incorrect {
                current: format!("mode {mode:o}"),
            });
        }
        Ok(ResourceState::Correct)
    }
}
