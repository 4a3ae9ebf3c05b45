//! Provisioning manifest: dependency descriptors and shell configuration.
pub mod dependencies;
pub mod shell;
pub mod toml_loader;
pub mod validation;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::Path;

use dependencies::DependencySpec;
use shell::ShellConfig;

/// Manifest compiled into the binary, used when no `--config` is given.
pub const EMBEDDED_MANIFEST: &str = include_str!("../../conf/manifest.toml");

/// All loaded configuration.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Dependencies in installation order.
    #[serde(default, rename = "dependency")]
    pub dependencies: Vec<DependencySpec>,
    /// Shell configuration.
    #[serde(default)]
    pub shell: ShellConfig,
}

impl Config {
    /// Load the manifest from `path`, or the embedded one when `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable, malformed, or
    /// fails validation.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config: Self = match path {
            Some(path) => {
                if !path.exists() {
                    bail!("manifest not found: {}", path.display());
                }
                toml_loader::load_config(path)?
            }
            None => toml_loader::parse_config(EMBEDDED_MANIFEST)
                .context("parsing embedded manifest")?,
        };
        validation::validate(&config)?;
        Ok(config)
    }

    /// Look up a dependency by name.
    #[must_use]
    pub fn dependency(&self, name: &str) -> Option<&DependencySpec> {
        self.dependencies.iter().find(|d| d.name == name)
    }
}

/// Parse and validate manifest text.
///
/// # Errors
///
/// Returns an error if the text is malformed or fails validation.
pub fn parse(content: &str) -> Result<Config> {
    let config: Config = toml_loader::parse_config(content)?;
    validation::validate(&config)?;
    Ok(config)
}
