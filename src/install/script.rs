//! Non-interactive installer scripts, e.g. interpreter distributions.
use anyhow::Context as _;

use super::fetch::fetch_with_retry;
use super::{InstallMethod, MethodEnv, MethodError, file_name_of, give_to_target, staging_dir};
use crate::config::dependencies::{DEST_PLACEHOLDER, ScriptSpec, asset_url};
use crate::error::ProvisionError;
use crate::logging::Log;

/// Download an installer script for the running architecture and run it
/// with `bash` as the target user.
#[derive(Debug)]
pub struct ScriptMethod {
    spec: ScriptSpec,
    env: MethodEnv,
}

impl ScriptMethod {
    /// Create a script install method.
    #[must_use]
    pub const fn new(spec: ScriptSpec, env: MethodEnv) -> Self {
        Self { spec, env }
    }
}

impl InstallMethod for ScriptMethod {
    fn description(&self) -> String {
        format!("installer script into {}", self.spec.dest)
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
        let script = staging.path().join(file_name_of(&url));
        log.debug(&format!("downloading {url}"));
        fetch_with_retry(
            self.env.fetcher.as_ref(),
            &url,
            &script,
            self.env.retry,
            log,
        )
        .map_err(MethodError::Network)?;
        // The script runs as the target user, who must be able to read it.
        give_to_target(staging.path(), &self.env.identity)?;
        give_to_target(&script, &self.env.identity)?;

        let dest = self.env.identity.expand(&self.spec.dest);
        let dest_str = dest.to_string_lossy().into_owned();
        let script_str = script.to_string_lossy().into_owned();
        let args: Vec<String> = self
            .spec
            .args
            .iter()
            .map(|a| a.replace(DEST_PLACEHOLDER, &dest_str))
            .collect();
        let mut argv = vec![script_str.as_str()];
        argv.extend(args.iter().map(String::as_str));
        self.env
            .user
            .run("bash", &argv)
            .with_context(|| format!("running installer from {url}"))?;
        Ok(())
    }
}
