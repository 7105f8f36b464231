//! Filesystem utility functions
//!
//! Every file claudeswap owns or rewrites goes through [`write_atomic`], so a
//! crash mid-write leaves either the old contents or the new ones.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::trace;

use crate::error::{SwapError, SwapResult};

/// File permissions applied to files that hold credentials
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Leave permissions at the process umask default
    Default,
    /// Owner read/write only (0600 on Unix)
    Private,
}

/// Maximum number of symlink hops followed before writing
const MAX_LINK_DEPTH: usize = 16;

/// Atomically replace `path` with `contents`
///
/// Writes to a temporary sibling, syncs it, then renames it over the target.
/// When `path` is a symlink the link is kept and its target is replaced. The
/// parent directory is created if missing. On failure the temporary file is
/// removed and the target is left untouched.
pub fn write_atomic(path: &Path, contents: &[u8], mode: Mode) -> SwapResult<()> {
    let resolved = resolve_symlinks(path);
    let path = resolved.as_path();

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| SwapError::io("create directory", parent, e))?;
    }

    let temp_path = temp_sibling(path);
    trace!(path = %path.display(), temp = %temp_path.display(), "atomic write");

    if let Err(err) = write_temp(&temp_path, contents, mode) {
        let _ = fs::remove_file(&temp_path);
        return Err(err);
    }

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        SwapError::io("replace", path, e)
    })
}

fn write_temp(temp_path: &Path, contents: &[u8], mode: Mode) -> SwapResult<()> {
    let mut file = open_temp(temp_path, mode)?;
    file.write_all(contents).map_err(|e| SwapError::io("write", temp_path, e))?;
    file.sync_all().map_err(|e| SwapError::io("sync", temp_path, e))
}

fn open_temp(temp_path: &Path, mode: Mode) -> SwapResult<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        if mode == Mode::Private {
            options.mode(0o600);
        }
    }
    #[cfg(not(unix))]
    let _ = mode;

    options.open(temp_path).map_err(|e| SwapError::io("create", temp_path, e))
}

/// Follow `path` through any symlinks to the file that actually gets written
///
/// A dangling link resolves to its missing target, so the write creates it.
pub fn resolve_symlinks(path: &Path) -> PathBuf {
    let mut current = path.to_path_buf();
    for _ in 0..MAX_LINK_DEPTH {
        let is_link = fs::symlink_metadata(&current).is_ok_and(|m| m.file_type().is_symlink());
        if !is_link {
            break;
        }
        let Ok(target) = fs::read_link(&current) else {
            break;
        };
        current = match current.parent() {
            Some(parent) if target.is_relative() => parent.join(target),
            _ => target,
        };
    }
    if current != path {
        trace!(link = %path.display(), target = %current.display(), "following symlink");
    }
    current
}

/// `settings.json` -> `.settings.json.<pid>.tmp` in the same directory
fn temp_sibling(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.{}.tmp", file_name, std::process::id()))
}

/// Read a file to a string, returning `None` when it does not exist
pub fn read_optional(path: &Path) -> SwapResult<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(SwapError::io("read", path, e)),
    }
}
