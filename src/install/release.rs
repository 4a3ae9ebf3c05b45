//! Architecture-specific binary release downloads.
use anyhow::{Context as _, bail};
use std::os::unix::fs::PermissionsExt as _;
use std::path::{Path, PathBuf};

use super::fetch::{compute_sha256, fetch_with_retry};
use super::{InstallMethod, MethodEnv, MethodError, file_name_of, staging_dir};
use crate::config::dependencies::{ReleaseSpec, asset_url};
use crate::error::ProvisionError;
use crate::logging::Log;

/// Directory depth searched for the executable inside an extracted archive.
const MAX_SEARCH_DEPTH: usize = 4;

/// Download a release archive for the running architecture, extract it in a
/// private staging directory and install the named executable.
///
/// The staging directory is removed when the attempt returns, whether it
/// succeeded or not.
#[derive(Debug)]
pub struct ReleaseMethod {
    spec: ReleaseSpec,
    env: MethodEnv,
}

impl ReleaseMethod {
    /// Create a release install method.
    #[must_use]
    pub const fn new(spec: ReleaseSpec, env: MethodEnv) -> Self {
        Self { spec, env }
    }

    fn target(&self) -> PathBuf {
        Path::new(&self.spec.install_dir).join(&self.spec.binary)
    }

    /// Compare the archive against the configured digest, if any.
    fn verify_checksum(&self, archive: &Path) -> anyhow::Result<()> {
        let Some(expected) = self
            .env
            .arch
            .key()
            .and_then(|key| self.spec.sha256.get(key))
        else {
            return Ok(());
        };
        let actual = compute_sha256(archive)?;
        if !expected.eq_ignore_ascii_case(&actual) {
            bail!("checksum mismatch: expected {expected}, got {actual}");
        }
        Ok(())
    }
}

/// Find an executable regular file named `name` below `dir`.
fn find_executable(dir: &Path, name: &str, depth: usize) -> Option<PathBuf> {
    let mut subdirs = Vec::new();
    for entry in std::fs::read_dir(dir).ok()?.flatten() {
        let path = entry.path();
        let Ok(meta) = entry.metadata() else { continue };
        if meta.is_dir() {
            subdirs.push(path);
        } else if meta.is_file()
            && path.file_name().is_some_and(|n| n == name)
            && meta.permissions().mode() & 0o111 != 0
        {
            return Some(path);
        }
    }
    if depth == 0 {
        return None;
    }
    subdirs
        .iter()
        .find_map(|sub| find_executable(sub, name, depth - 1))
}

impl InstallMethod for ReleaseMethod {
    fn description(&self) -> String {
        format!("release download of {}", self.spec.binary)
    }

    fn attempt(&self, log: &dyn Log) -> Result<(), MethodError> {
        let Some(url) = asset_url(&self.spec.url, &self.spec.assets, &self.env.arch) else {
            return Err(MethodError::Unsupported(
                ProvisionError::UnsupportedPlatform {
                    arch: self.env.arch.to_string(),
                }
                .to_string(),
            ));
        };

        let staging = staging_dir()?;
        let archive = staging.path().join(file_name_of(&url));
        log.debug(&format!("downloading {url}"));
        fetch_with_retry(
            self.env.fetcher.as_ref(),
            &url,
            &archive,
            self.env.retry,
            log,
        )
        .map_err(MethodError::Network)?;
        self.verify_checksum(&archive)?;

        let extract = staging.path().join("extract");
        std::fs::create_dir(&extract).context("creating extraction directory")?;
        let archive_str = archive.to_string_lossy();
        let extract_str = extract.to_string_lossy();
        self.env
            .local
            .run("tar", &["-xf", &archive_str, "-C", &extract_str])
            .context("extracting release archive")?;

        let binary = find_executable(&extract, &self.spec.binary, MAX_SEARCH_DEPTH)
            .with_context(|| {
                format!("archive does not contain an executable named {}", self.spec.binary)
            })?;

        let target = self.target();
        let binary_str = binary.to_string_lossy();
        let target_str = target.to_string_lossy();
        self.env
            .root
            .run(
                "install",
                &["-D", "-m", &self.spec.mode, &binary_str, &target_str],
            )
            .with_context(|| format!("installing {}", target.display()))?;
        log.debug(&format!("installed {}", target.display()));
        Ok(())
    }
}
