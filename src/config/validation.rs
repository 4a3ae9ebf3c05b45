//! Manifest validation.
//!
//! Every rule here is fatal: an invalid manifest stops the run before any
//! step executes.
use std::collections::HashSet;

use super::Config;
use super::dependencies::{ASSET_PLACEHOLDER, MethodSpec};
use crate::error::ConfigError;

/// Minimum length for octal mode strings.
const OCTAL_MODE_MIN_LEN: usize = 3;

/// Maximum length for octal mode strings.
const OCTAL_MODE_MAX_LEN: usize = 4;

/// Parse an octal mode string such as `"644"` or `"0755"`.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidMode`] unless the string is three or four
/// octal digits.
pub fn parse_mode(mode: &str) -> Result<u32, ConfigError> {
    let valid_len = (OCTAL_MODE_MIN_LEN..=OCTAL_MODE_MAX_LEN).contains(&mode.len());
    if !valid_len || !mode.chars().all(|c| ('0'..='7').contains(&c)) {
        return Err(ConfigError::InvalidMode(mode.to_string()));
    }
    u32::from_str_radix(mode, 8).map_err(|_| ConfigError::InvalidMode(mode.to_string()))
}

/// Check the whole manifest.
///
/// # Errors
///
/// Returns the first rule violation found.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    parse_mode(&config.shell.mode)?;

    let mut seen = HashSet::new();
    for dep in &config.dependencies {
        if !seen.insert(dep.name.as_str()) {
            return Err(ConfigError::DuplicateDependency(dep.name.clone()));
        }
        if dep.methods.is_empty() {
            return Err(ConfigError::NoMethods(dep.name.clone()));
        }
        for method in &dep.methods {
            let url = match method {
                MethodSpec::Release(release) => {
                    parse_mode(&release.mode)?;
                    &release.url
                }
                MethodSpec::Script(script) => &script.url,
                MethodSpec::Package { .. } | MethodSpec::Git(_) => continue,
            };
            if !url.contains(ASSET_PLACEHOLDER) {
                return Err(ConfigError::MissingAssetPlaceholder {
                    name: dep.name.clone(),
                    url: url.clone(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::parse;

    #[test]
    fn parse_mode_accepts_valid_modes() {
        assert_eq!(parse_mode("644").unwrap(), 0o644);
        assert_eq!(parse_mode("0755").unwrap(), 0o755);
    }

    #[test]
    fn parse_mode_rejects_bad_digits_and_lengths() {
        for bad in ["64", "12345", "648", "rwx", ""] {
            assert!(
                matches!(parse_mode(bad), Err(ConfigError::InvalidMode(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn duplicate_names_rejected() {
        let err = parse(
            r#"
            [[dependency]]
            name = "zsh"
            check = { kind = "command", command = "zsh" }
            methods = [{ kind = "package", manager = "apt", packages = ["zsh"] }]

            [[dependency]]
            name = "zsh"
            check = { kind = "command", command = "zsh" }
            methods = [{ kind = "package", manager = "pacman", packages = ["zsh"] }]
            "#,
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::DuplicateDependency(name)) if name == "zsh"
        ));
    }

    #[test]
    fn empty_methods_rejected() {
        let err = parse(
            r#"
            [[dependency]]
            name = "ghost"
            check = { kind = "command", command = "ghost" }
            methods = []
            "#,
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::NoMethods(_))
        ));
    }

    #[test]
    fn release_url_without_placeholder_rejected() {
        let err = parse(
            r#"
            [[dependency]]
            name = "eza"
            check = { kind = "command", command = "eza" }
            methods = [{ kind = "release", url = "https://example.com/eza.tar.gz", binary = "eza", assets = { x86_64 = "eza.tar.gz" } }]
            "#,
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::MissingAssetPlaceholder { .. })
        ));
    }

    #[test]
    fn invalid_release_mode_rejected() {
        let err = parse(
            r#"
            [[dependency]]
            name = "eza"
            check = { kind = "command", command = "eza" }
            methods = [{ kind = "release", url = "https://example.com/{asset}", binary = "eza", mode = "999", assets = { x86_64 = "eza.tar.gz" } }]
            "#,
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::InvalidMode(_))
        ));
    }

    #[test]
    fn invalid_shell_mode_rejected() {
        let err = parse("[shell]\nmode = \"8\"\n").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::InvalidMode(_))
        ));
    }
}
