//! Target identity resolution.
//!
//! Provisioning always acts on behalf of one user account.  When the engine
//! runs under `sudo`, that account is the user who invoked `sudo`, not root:
//! every file written and every user-scoped command run must belong to them.
use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};

use crate::error::IdentityError;
use crate::exec::Executor;

/// The user account every provisioning action applies to.
///
/// Resolved once at startup from the account database and never changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetIdentity {
    /// Login name.
    pub user: String,
    /// Numeric user id.
    pub uid: u32,
    /// Numeric primary group id.
    pub gid: u32,
    /// Primary group name.
    pub group: String,
    /// Home directory from the account database.
    pub home: PathBuf,
    /// Effective uid of the running process.
    pub process_uid: u32,
}

impl TargetIdentity {
    /// Whether the running process has root privileges.
    #[must_use]
    pub const fn is_privileged(&self) -> bool {
        self.process_uid == 0
    }

    /// Whether commands must switch user to act as the target.
    #[must_use]
    pub const fn requires_switch(&self) -> bool {
        self.process_uid != self.uid
    }

    /// Expand a `~`-prefixed path against the target home.
    ///
    /// Absolute and relative paths without `~` are returned unchanged.
    #[must_use]
    pub fn expand(&self, path: &str) -> PathBuf {
        if path == "~" {
            self.home.clone()
        } else if let Some(rest) = path.strip_prefix("~/") {
            self.home.join(rest)
        } else {
            PathBuf::from(path)
        }
    }
}

/// One parsed line of the account database (`getent passwd`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswdEntry {
    /// Login name.
    pub name: String,
    /// Numeric user id.
    pub uid: u32,
    /// Numeric primary group id.
    pub gid: u32,
    /// Home directory.
    pub home: PathBuf,
    /// Login shell.
    pub shell: String,
}

impl PasswdEntry {
    /// Parse a `name:passwd:uid:gid:gecos:home:shell` line.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::MalformedEntry`] if the line does not have
    /// seven fields or the ids are not numeric.
    pub fn parse(line: &str) -> Result<Self, IdentityError> {
        let malformed = || IdentityError::MalformedEntry(line.to_string());
        let fields: Vec<&str> = line.trim().split(':').collect();
        let [name, _, uid, gid, _, home, shell] = fields.as_slice() else {
            return Err(malformed());
        };
        Ok(Self {
            name: (*name).to_string(),
            uid: uid.parse().map_err(|_| malformed())?,
            gid: gid.parse().map_err(|_| malformed())?,
            home: PathBuf::from(*home),
            shell: (*shell).to_string(),
        })
    }
}

/// Look up `user` in the account database.
///
/// # Errors
///
/// Returns [`IdentityError::UnknownUser`] if there is no entry, or an error
/// if `getent` cannot be run or its output cannot be parsed.
pub fn lookup_user(executor: &dyn Executor, user: &str) -> Result<PasswdEntry> {
    let result = executor.run_unchecked("getent", &["passwd", user])?;
    let line = result.stdout.lines().next().unwrap_or_default();
    if !result.success || line.is_empty() {
        return Err(IdentityError::UnknownUser(user.to_string()).into());
    }
    Ok(PasswdEntry::parse(line)?)
}

/// Look up the name of group `gid`, falling back to the numeric id.
fn lookup_group(executor: &dyn Executor, gid: u32) -> String {
    let gid = gid.to_string();
    executor
        .run_unchecked("getent", &["group", &gid])
        .ok()
        .filter(|r| r.success)
        .and_then(|r| r.stdout.split(':').next().map(str::to_string))
        .filter(|name| !name.is_empty())
        .unwrap_or(gid)
}

/// Identify the target account without touching its home directory.
///
/// If the process runs as root and `sudo_user` names a non-root account
/// (the value `sudo` records in `SUDO_USER`), that account is the target.
/// Otherwise the target is the process's own user.  Home and group always
/// come from the account database.
///
/// # Errors
///
/// Returns an error if the process user or the target cannot be looked up.
pub fn lookup_target(executor: &dyn Executor, sudo_user: Option<&str>) -> Result<TargetIdentity> {
    let process_uid: u32 = executor
        .run("id", &["-u"])?
        .stdout
        .trim()
        .parse()
        .context("parsing output of `id -u`")?;

    let user = match sudo_user.filter(|u| process_uid == 0 && !u.is_empty() && *u != "root") {
        Some(original) => original.to_string(),
        None => executor.run("id", &["-un"])?.stdout.trim().to_string(),
    };

    let entry = lookup_user(executor, &user)?;
    let group = lookup_group(executor, entry.gid);

    Ok(TargetIdentity {
        user: entry.name,
        uid: entry.uid,
        gid: entry.gid,
        group,
        home: entry.home,
        process_uid,
    })
}

/// Resolve the target identity the workflow will write as.
///
/// Same as [`lookup_target`], and additionally requires the home directory
/// to exist and be writable.
///
/// # Errors
///
/// Returns an error if the user cannot be found, or if the resolved home
/// directory is missing or not writable.
pub fn resolve(executor: &dyn Executor, sudo_user: Option<&str>) -> Result<TargetIdentity> {
    let identity = lookup_target(executor, sudo_user)?;
    check_home(&identity.home)?;
    Ok(identity)
}

/// Fail unless `home` is an existing, writable directory.
///
/// # Errors
///
/// Returns [`IdentityError::MissingHome`] or [`IdentityError::UnwritableHome`].
pub fn check_home(home: &Path) -> Result<(), IdentityError> {
    if !home.is_dir() {
        return Err(IdentityError::MissingHome(home.display().to_string()));
    }
    tempfile::Builder::new()
        .prefix(".devsetup-probe")
        .tempfile_in(home)
        .map(drop)
        .map_err(|_| IdentityError::UnwritableHome(home.display().to_string()))
}
