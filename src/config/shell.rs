//! The `[shell]` table: login shell and rc file layout.
use serde::Deserialize;

/// Shell configuration written for the target user.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ShellConfig {
    /// Executable that becomes the login shell.
    pub binary: String,
    /// Rc file the config writer manages, `~`-relative.
    pub rc: String,
    /// Shell framework install directory, `~`-relative.
    pub framework_dir: String,
    /// Theme used when no theme dependency is present.
    pub default_theme: String,
    /// Framework plugins that are always enabled.
    pub plugins: Vec<String>,
    /// Octal permission bits of the rc file.
    pub mode: String,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            binary: "zsh".to_string(),
            rc: "~/.zshrc".to_string(),
            framework_dir: "~/.oh-my-zsh".to_string(),
            default_theme: "robbyrussell".to_string(),
            plugins: vec!["git".to_string()],
            mode: "644".to_string(),
        }
    }
}
