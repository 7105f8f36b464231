//! Rotating backups of the live settings file.
//!
//! A copy is taken whenever a switch is about to change the live file. Names
//! embed a UTC timestamp (`settings.20260114_103045_123.bak`) so lexical order
//! is chronological order.

use chrono::{DateTime, NaiveDateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{SwapError, SwapResult};
use crate::paths::Paths;

/// Number of backups to keep
pub const MAX_BACKUPS: usize = 10;

const PREFIX: &str = "settings.";
const SUFFIX: &str = ".bak";
const STAMP_FORMAT: &str = "%Y%m%d_%H%M%S_%3f";

/// A backup file on disk
#[derive(Debug, Clone)]
pub struct Backup {
    pub id: String,
    pub path: PathBuf,
    pub created_at: Option<DateTime<Utc>>,
    pub size: u64,
}

/// Copy `contents` of the live file into a new backup, then rotate
pub fn backup_contents(paths: &Paths, contents: &str) -> SwapResult<PathBuf> {
    fs::create_dir_all(&paths.backups_dir)
        .map_err(|e| SwapError::io("create directory", &paths.backups_dir, e))?;

    let stamp = Utc::now().format(STAMP_FORMAT).to_string();
    let mut backup_path = paths.backups_dir.join(format!("{PREFIX}{stamp}{SUFFIX}"));
    let mut counter = 1;
    while backup_path.exists() {
        backup_path = paths
            .backups_dir
            .join(format!("{PREFIX}{stamp}-{counter}{SUFFIX}"));
        counter += 1;
    }

    crate::fs_utils::write_atomic(
        &backup_path,
        contents.as_bytes(),
        crate::fs_utils::Mode::Private,
    )?;
    debug!(path = %backup_path.display(), "backed up live settings");

    cleanup_old_backups(&paths.backups_dir, MAX_BACKUPS)?;
    Ok(backup_path)
}

/// List backups, most recent first
pub fn list_backups(paths: &Paths) -> SwapResult<Vec<Backup>> {
    let mut backups: Vec<Backup> = backup_entries(&paths.backups_dir)?
        .into_iter()
        .map(|(id, path)| {
            let size = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
            Backup {
                created_at: parse_stamp(&id),
                id,
                path,
                size,
            }
        })
        .collect();
    backups.sort_by(|a, b| chronological_key(&b.id).cmp(&chronological_key(&a.id)));
    Ok(backups)
}

/// Resolve a backup id to its path, rejecting anything outside the backups dir
pub fn find_backup(paths: &Paths, id: &str) -> SwapResult<PathBuf> {
    let well_formed = id.starts_with(PREFIX)
        && id.ends_with(SUFFIX)
        && !id.contains(['/', '\\'])
        && !id.contains("..");
    let path = paths.backups_dir.join(id);
    if !well_formed || !path.is_file() {
        return Err(SwapError::BackupNotFound(id.to_string()));
    }
    Ok(path)
}

/// Delete the oldest backups beyond `keep`; returns how many were removed
pub fn cleanup_old_backups(backups_dir: &Path, keep: usize) -> SwapResult<usize> {
    let mut backups = backup_entries(backups_dir)?;
    if backups.len() <= keep {
        return Ok(0);
    }

    // Oldest first
    backups.sort_by(|a, b| chronological_key(&a.0).cmp(&chronological_key(&b.0)));

    let to_remove = backups.len() - keep;
    for (_, path) in backups.iter().take(to_remove) {
        fs::remove_file(path).map_err(|e| SwapError::io("remove", path, e))?;
    }
    Ok(to_remove)
}

fn backup_entries(backups_dir: &Path) -> SwapResult<Vec<(String, PathBuf)>> {
    let entries = match fs::read_dir(backups_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(SwapError::io("read", backups_dir, e)),
    };

    Ok(entries
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .filter_map(|e| {
            let name = e.file_name().to_str()?.to_string();
            (name.starts_with(PREFIX) && name.ends_with(SUFFIX)).then(|| (name, e.path()))
        })
        .collect())
}

/// Same-millisecond backups carry `-N`; order them after the unsuffixed one
fn chronological_key(id: &str) -> (&str, u32) {
    let stamp = id
        .strip_prefix(PREFIX)
        .and_then(|s| s.strip_suffix(SUFFIX))
        .unwrap_or(id);
    match stamp.split_once('-') {
        Some((base, counter)) => (base, counter.parse().unwrap_or(0)),
        None => (stamp, 0),
    }
}

fn parse_stamp(id: &str) -> Option<DateTime<Utc>> {
    let stamp = id.strip_prefix(PREFIX)?.strip_suffix(SUFFIX)?;
    // Strip a collision counter
    let stamp = stamp.split('-').next()?;
    NaiveDateTime::parse_from_str(stamp, STAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}
