//! File-system helpers shared by resources that write files.
use anyhow::{Context as _, Result};
use std::io::Write as _;
use std::os::unix::fs::PermissionsExt as _;
use std::path::{Path, PathBuf};

/// Ensure the parent directory of `path` exists, creating it (and any
/// ancestors) if necessary.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create parent: {}", parent.display()))?;
    }
    Ok(())
}

/// First unused backup path for `path` with the given timestamp.
///
/// `~/.zshrc` becomes `~/.zshrc.devsetup-backup-<stamp>`; when that name is
/// already taken a numeric suffix is appended so no backup is ever replaced.
#[must_use]
pub fn backup_path(path: &Path, stamp: &str) -> PathBuf {
    let base = format!("{}.devsetup-backup-{stamp}", path.display());
    let mut candidate = PathBuf::from(&base);
    let mut n = 1u32;
    while candidate.symlink_metadata().is_ok() {
        candidate = PathBuf::from(format!("{base}.{n}"));
        n += 1;
    }
    candidate
}

fn timestamp() -> String {
    chrono::Local::now().format("%Y%m%d-%H%M%S").to_string()
}

/// Rename `path` to a new timestamped backup next to it and return the
/// backup's location.
///
/// Ownership and contents are untouched; `path` no longer exists afterwards.
///
/// # Errors
///
/// Returns an error if the rename fails.
pub fn move_aside(path: &Path) -> Result<PathBuf> {
    let backup = backup_path(path, &timestamp());
    std::fs::rename(path, &backup)
        .with_context(|| format!("moving {} to {}", path.display(), backup.display()))?;
    Ok(backup)
}

/// Copy `path` to a new timestamped backup next to it and return the
/// backup's location.
///
/// The copy keeps the original's mode; when `owner` is set it is also given
/// that uid/gid, so a backup in the target's home never belongs to root.
///
/// # Errors
///
/// Returns an error if the copy or the ownership change fails.
pub fn backup_file(path: &Path, owner: Option<(u32, u32)>) -> Result<PathBuf> {
    let backup = backup_path(path, &timestamp());
    std::fs::copy(path, &backup).with_context(|| {
        format!("backing up {} to {}", path.display(), backup.display())
    })?;
    if let Some((uid, gid)) = owner {
        std::os::unix::fs::chown(&backup, Some(uid), Some(gid))
            .with_context(|| format!("changing owner of {}", backup.display()))?;
    }
    Ok(backup)
}

/// Replace `path` with `content` atomically.
///
/// The content is written to a temporary file in the same directory, given
/// `mode` and, when `owner` is set, that uid/gid, and then renamed over
/// `path`. An interrupted write leaves the previous file untouched.
///
/// # Errors
///
/// Returns an error if any step fails; the temporary file is removed.
pub fn write_atomic(path: &Path, content: &str, mode: u32, owner: Option<(u32, u32)>) -> Result<()> {
    ensure_parent_dir(path)?;
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::Builder::new()
        .prefix(".devsetup-")
        .tempfile_in(dir)
        .with_context(|| format!("creating temporary file in {}", dir.display()))?;
    tmp.write_all(content.as_bytes())
        .and_then(|()| tmp.as_file().sync_all())
        .with_context(|| format!("writing {}", tmp.path().display()))?;
    std::fs::set_permissions(tmp.path(), std::fs::Permissions::from_mode(mode))
        .with_context(|| format!("setting permissions on {}", tmp.path().display()))?;
    if let Some((uid, gid)) = owner {
        std::os::unix::fs::chown(tmp.path(), Some(uid), Some(gid))
            .with_context(|| format!("changing owner of {}", tmp.path().display()))?;
    }
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("replacing {}", path.display()))?;
    Ok(())
}
