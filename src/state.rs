use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::trace;

use crate::error::{SwapError, SwapResult};
use crate::fs_utils::{Mode, read_optional, write_atomic};

/// Active Pointer stored in ~/.claude-swap/state.json
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct State {
    /// The profile currently installed into the live settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_profile: Option<String>,

    /// `env` keys written into the live settings by the last switch
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub managed_env: Vec<String>,

    /// When the state was last updated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl State {
    /// Read state from file, returning default if file doesn't exist
    pub fn read(path: &Path) -> SwapResult<Self> {
        match read_optional(path)? {
            Some(content) if !content.trim().is_empty() => {
                serde_json::from_str(&content).map_err(|e| SwapError::json(path, e))
            }
            _ => Ok(Self::default()),
        }
    }

    /// Write state to file atomically
    pub fn write(&self, path: &Path) -> SwapResult<()> {
        let content = serde_json::to_string_pretty(self).map_err(|e| SwapError::json(path, e))?;
        write_atomic(path, content.as_bytes(), Mode::Default)
    }

    pub fn activated(name: &str, managed_env: Vec<String>) -> Self {
        Self {
            active_profile: Some(name.to_string()),
            managed_env,
            updated_at: Some(Utc::now()),
        }
    }

    pub fn cleared() -> Self {
        Self {
            active_profile: None,
            managed_env: Vec::new(),
            updated_at: Some(Utc::now()),
        }
    }
}

/// Advisory exclusive lock serializing writers of the live settings and state
///
/// Released when dropped.
pub struct SwapLock {
    file: File,
    path: PathBuf,
}

impl SwapLock {
    /// Open and lock the lock file (blocks until available)
    pub fn acquire(path: &Path) -> SwapResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| SwapError::io("create directory", parent, e))?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| SwapError::io("open", path, e))?;

        file.lock_exclusive().map_err(|e| SwapError::Lock {
            path: path.to_path_buf(),
            source: e,
        })?;
        trace!(path = %path.display(), "acquired lock");

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }
}

impl Drop for SwapLock {
    fn drop(&mut self) {
        // Release the lock (ignore errors during drop)
        let _ = FileExt::unlock(&self.file);
        trace!(path = %self.path.display(), "released lock");
    }
}
