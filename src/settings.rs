//! Claude Code's live `settings.json`.
//!
//! The file belongs to Claude Code. claudeswap only edits the `env` object,
//! and only the keys it manages; every other key is carried through untouched.
//! Key order is preserved (serde_json `preserve_order`), so existing entries
//! keep their position and new ones are appended.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use crate::error::{SwapError, SwapResult};
use crate::fs_utils::{Mode, read_optional, write_atomic};
use crate::profile::reserved_env_keys;

const ENV_OBJECT: &str = "env";

/// Parsed live settings document
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LiveSettings {
    root: Map<String, Value>,
}

impl LiveSettings {
    /// Read the live settings; a missing or empty file reads as `{}`
    pub fn read(path: &Path) -> SwapResult<Self> {
        match read_optional(path)? {
            Some(content) => Self::parse(path, &content),
            None => Ok(Self::default()),
        }
    }

    /// Parse settings content previously read from `path`
    pub fn parse(path: &Path, content: &str) -> SwapResult<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        match serde_json::from_str::<Value>(content).map_err(|e| SwapError::json(path, e))? {
            Value::Object(root) => Ok(Self { root }),
            _ => Err(SwapError::LiveConfig(path.to_path_buf())),
        }
    }

    /// Current value of an `env` entry
    pub fn env_value(&self, key: &str) -> Option<&str> {
        self.root
            .get(ENV_OBJECT)
            .and_then(Value::as_object)
            .and_then(|env| env.get(key))
            .and_then(Value::as_str)
    }

    /// Install `entries`, removing every other managed key
    ///
    /// `previously_managed` lists extra keys written by an earlier switch so
    /// they do not outlive the profile that introduced them. Keys present in
    /// `entries` are updated in place.
    pub fn apply(&mut self, entries: &BTreeMap<String, String>, previously_managed: &[String]) {
        if let Some(Value::Object(env)) = self.root.get_mut(ENV_OBJECT) {
            remove_keys(env, previously_managed, |key| !entries.contains_key(key));
        }

        let env = self
            .root
            .entry(ENV_OBJECT)
            .or_insert_with(|| Value::Object(Map::new()));
        if !env.is_object() {
            *env = Value::Object(Map::new());
        }
        if let Value::Object(env) = env {
            for (key, value) in entries {
                env.insert(key.clone(), Value::String(value.clone()));
            }
        }
    }

    /// Remove every managed key; drops the `env` object if it ends up empty
    pub fn strip_managed(&mut self, previously_managed: &[String]) {
        let Some(Value::Object(env)) = self.root.get_mut(ENV_OBJECT) else {
            return;
        };

        remove_keys(env, previously_managed, |_| true);

        if env.is_empty() {
            self.root.shift_remove(ENV_OBJECT);
        }
    }

    pub fn to_json_string(&self) -> SwapResult<String> {
        let content = serde_json::to_string_pretty(&self.root)
            .map_err(|e| SwapError::json(Path::new("settings.json"), e))?;
        Ok(format!("{content}\n"))
    }

    /// Atomically replace the live file with this document
    pub fn write(&self, path: &Path) -> SwapResult<()> {
        let content = self.to_json_string()?;
        write_atomic(path, content.as_bytes(), Mode::Private)?;
        debug!(path = %path.display(), "wrote live settings");
        Ok(())
    }
}

/// Drop reserved and previously managed keys accepted by `filter`, keeping
/// the order of what remains
fn remove_keys(
    env: &mut Map<String, Value>,
    previously_managed: &[String],
    filter: impl Fn(&str) -> bool,
) {
    let reserved = reserved_env_keys();
    let managed = reserved
        .iter()
        .copied()
        .chain(previously_managed.iter().map(String::as_str));
    for key in managed.filter(|key| filter(key)) {
        env.shift_remove(key);
    }
}
