//! HTTP downloads with bounded retry.
use anyhow::{Context as _, Result};
use std::path::Path;
use std::time::Duration;

use crate::error::ProvisionError;
use crate::logging::Log;

/// Number of download attempts.
const RETRY_COUNT: u32 = 3;

/// Seconds to wait between download attempts.
const RETRY_DELAY: u64 = 2;

/// TCP connect timeout in seconds.
const CONNECT_TIMEOUT: u64 = 10;

/// Total transfer timeout in seconds.
const TRANSFER_TIMEOUT: u64 = 120;

/// Downloads a URL to a local file.
#[cfg_attr(test, mockall::automock)]
pub trait Fetcher: Send + Sync + std::fmt::Debug {
    /// Download `url` into `dest`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns an error on connection failure, timeout, non-success HTTP
    /// status, or if `dest` cannot be written.
    fn fetch(&self, url: &str, dest: &Path) -> Result<()>;
}

/// [`Fetcher`] backed by a blocking `ureq` agent.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    /// Create a fetcher with the standard connect and transfer timeouts.
    #[must_use]
    pub fn new() -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_connect(Some(Duration::from_secs(CONNECT_TIMEOUT)))
            .timeout_global(Some(Duration::from_secs(TRANSFER_TIMEOUT)))
            .build();
        Self {
            agent: config.into(),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<()> {
        let mut response = self
            .agent
            .get(url)
            .call()
            .with_context(|| format!("requesting {url}"))?;
        let mut file = std::fs::File::create(dest)
            .with_context(|| format!("creating {}", dest.display()))?;
        std::io::copy(&mut response.body_mut().as_reader(), &mut file)
            .with_context(|| format!("writing {}", dest.display()))?;
        Ok(())
    }
}

/// How often, and how patiently, to retry a download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retry {
    /// Total number of attempts, including the first.
    pub attempts: u32,
    /// Fixed pause between attempts.
    pub delay: Duration,
}

impl Default for Retry {
    fn default() -> Self {
        Self {
            attempts: RETRY_COUNT,
            delay: Duration::from_secs(RETRY_DELAY),
        }
    }
}

/// Download `url` to `dest`, retrying on failure.
///
/// # Errors
///
/// Returns [`ProvisionError::TransientNetwork`] once every attempt has
/// failed, carrying the last error seen.
pub fn fetch_with_retry(
    fetcher: &dyn Fetcher,
    url: &str,
    dest: &Path,
    retry: Retry,
    log: &dyn Log,
) -> Result<(), ProvisionError> {
    let attempts = retry.attempts.max(1);
    let mut last_error = String::new();
    for attempt in 1..=attempts {
        if attempt > 1 {
            log.debug(&format!(
                "retry {attempt}/{attempts} after {}s",
                retry.delay.as_secs()
            ));
            std::thread::sleep(retry.delay);
        }
        match fetcher.fetch(url, dest) {
            Ok(()) => return Ok(()),
            Err(e) => {
                log.debug(&format!("download of {url} failed: {e:#}"));
                last_error = format!("{e:#}");
            }
        }
    }
    let _ = std::fs::remove_file(dest);
    Err(ProvisionError::TransientNetwork {
        url: url.to_string(),
        attempts,
        reason: last_error,
    })
}

/// Compute the lowercase hex SHA-256 digest of the file at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn compute_sha256(path: &Path) -> Result<String> {
    use sha2::{Digest, Sha256};
    use std::fmt::Write as _;

    let bytes = std::fs::read(path)
        .with_context(|| format!("reading {} for checksum verification", path.display()))?;
    let digest = Sha256::digest(&bytes);
    let mut hex = String::with_capacity(64);
    for b in &digest {
        write!(hex, "{b:02x}").unwrap_or(());
    }
    Ok(hex)
}
