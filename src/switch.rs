//! Profile switching logic.
//!
//! This module is the only writer of Claude Code's live `settings.json`:
//! - [`activate`] installs a profile's env entries.
//! - [`deactivate`] removes every entry claudeswap manages.
//! - [`restore_backup`] puts a previous copy of the file back.
//!
//! Each writer holds the advisory lock, backs up the old file when its
//! contents change, replaces it atomically, and only then updates the pointer
//! in `state.json`.

use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::backup::{backup_contents, find_backup};
use crate::error::{FieldError, SwapError, SwapResult};
use crate::fs_utils::{Mode, read_optional, write_atomic};
use crate::paths::Paths;
use crate::profiles::load_profile;
use crate::settings::LiveSettings;
use crate::state::{State, SwapLock};
use crate::validate::ensure_valid;

/// Outcome of a successful [`activate`]
#[derive(Debug)]
pub struct Activation {
    pub profile: String,
    pub previous: Option<String>,
    /// Whether the live file's contents changed
    pub changed: bool,
    pub backup: Option<PathBuf>,
}

/// Outcome of a successful [`deactivate`]
#[derive(Debug)]
pub struct Deactivation {
    pub previous: Option<String>,
    pub changed: bool,
    pub backup: Option<PathBuf>,
    /// The pointer was corrupt, so extra env keys of the last profile are unknown
    pub state_unreadable: bool,
}

/// Install profile `name` into the live settings
///
/// Fails with `NotFound` or `Validation` before anything is written; in that
/// case the live file and the pointer are untouched.
pub fn activate(paths: &Paths, name: &str) -> SwapResult<Activation> {
    let profile = load_profile(paths, name)?;
    ensure_valid(&profile)?;
    let token = profile
        .credential
        .resolve()
        .map_err(|message| SwapError::Validation {
            name: name.to_string(),
            errors: vec![FieldError::new("credential", message)],
        })?;
    let entries = profile.env_entries(&token);

    let _lock = SwapLock::acquire(&paths.lock_file)?;
    let state = read_state_lenient(paths).unwrap_or_default();

    let live_path = &paths.claude_settings;
    let current = read_optional(live_path)?;
    let mut settings = match &current {
        Some(content) => LiveSettings::parse(live_path, content)?,
        None => LiveSettings::default(),
    };
    settings.apply(&entries, &state.managed_env);
    let rendered = settings.to_json_string()?;

    let changed = current.as_deref() != Some(rendered.as_str());
    let mut backup = None;
    if changed {
        backup = backup_if_present(paths, current.as_deref())?;
        write_atomic(live_path, rendered.as_bytes(), Mode::Private)?;
    } else {
        debug!(profile = name, "live settings already up to date");
    }

    State::activated(name, entries.keys().cloned().collect()).write(&paths.state_file)?;
    info!(profile = name, changed, "activated profile");

    Ok(Activation {
        profile: name.to_string(),
        previous: state.active_profile,
        changed,
        backup,
    })
}

/// Remove every managed env entry from the live settings and clear the pointer
///
/// A missing live file stays missing.
pub fn deactivate(paths: &Paths) -> SwapResult<Deactivation> {
    let _lock = SwapLock::acquire(&paths.lock_file)?;
    let recorded = read_state_lenient(paths);
    let state_unreadable = recorded.is_none();
    let state = recorded.unwrap_or_default();

    let live_path = &paths.claude_settings;
    let mut changed = false;
    let mut backup = None;
    if let Some(content) = read_optional(live_path)? {
        let mut settings = LiveSettings::parse(live_path, &content)?;
        settings.strip_managed(&state.managed_env);
        let rendered = settings.to_json_string()?;
        if rendered != content {
            backup = backup_if_present(paths, Some(&content))?;
            write_atomic(live_path, rendered.as_bytes(), Mode::Private)?;
            changed = true;
        }
    }

    State::cleared().write(&paths.state_file)?;
    info!(previous = ?state.active_profile, changed, "deactivated");

    Ok(Deactivation {
        previous: state.active_profile,
        changed,
        backup,
        state_unreadable,
    })
}

/// Replace the live settings with backup `id`; the pointer is cleared since
/// the restored file no longer corresponds to a known profile
pub fn restore_backup(paths: &Paths, id: &str) -> SwapResult<Option<PathBuf>> {
    let backup_path = find_backup(paths, id)?;
    let restored = read_optional(&backup_path)?.unwrap_or_default();
    LiveSettings::parse(&backup_path, &restored)?;

    let _lock = SwapLock::acquire(&paths.lock_file)?;
    let live_path = &paths.claude_settings;
    let current = read_optional(live_path)?;

    let mut safety_copy = None;
    if current.as_deref() != Some(restored.as_str()) {
        safety_copy = backup_if_present(paths, current.as_deref())?;
        write_atomic(live_path, restored.as_bytes(), Mode::Private)?;
    }

    State::cleared().write(&paths.state_file)?;
    info!(backup = id, "restored live settings from backup");
    Ok(safety_copy)
}

fn backup_if_present(paths: &Paths, current: Option<&str>) -> SwapResult<Option<PathBuf>> {
    match current {
        Some(content) if !content.trim().is_empty() => Ok(Some(backup_contents(paths, content)?)),
        _ => Ok(None),
    }
}

/// A corrupt pointer must not block a writer that is about to rewrite it
fn read_state_lenient(paths: &Paths) -> Option<State> {
    match State::read(&paths.state_file) {
        Ok(state) => Some(state),
        Err(err) => {
            warn!(error = %err.with_causes(), "ignoring unreadable state file");
            None
        }
    }
}

/// How the live settings relate to the active pointer
#[derive(Debug, PartialEq, Eq)]
pub enum LiveStatus {
    /// No settings file yet
    Missing,
    /// Settings file is not a JSON object
    Unreadable(String),
    /// No active profile recorded
    Unconfigured,
    /// The active profile no longer exists in the store
    ProfileMissing(String),
    /// Every env entry of the active profile is in place
    InSync(String),
    /// The listed env keys differ from what the active profile would write
    Drifted { profile: String, keys: Vec<String> },
}

impl LiveStatus {
    pub fn detect(paths: &Paths, state: &State) -> Self {
        let settings = match read_optional(&paths.claude_settings) {
            Ok(None) => return Self::Missing,
            Ok(Some(content)) => match LiveSettings::parse(&paths.claude_settings, &content) {
                Ok(settings) => settings,
                Err(err) => return Self::Unreadable(err.with_causes()),
            },
            Err(err) => return Self::Unreadable(err.with_causes()),
        };

        let Some(name) = state.active_profile.clone() else {
            return Self::Unconfigured;
        };
        let Ok(profile) = load_profile(paths, &name) else {
            return Self::ProfileMissing(name);
        };

        // An unresolved env reference still lets us compare everything but the token
        let token = profile.credential.resolve().ok();
        let mut keys: Vec<String> = profile
            .env_entries(token.as_deref().unwrap_or_default())
            .into_iter()
            .filter(|(key, value)| {
                let is_token = key == crate::profile::AUTH_TOKEN_KEY;
                match settings.env_value(key) {
                    Some(_) if is_token && token.is_none() => false,
                    Some(live) => live != value,
                    None => true,
                }
            })
            .map(|(key, _)| key)
            .collect();
        keys.sort();

        if keys.is_empty() {
            Self::InSync(name)
        } else {
            Self::Drifted {
                profile: name,
                keys,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{AUTH_TOKEN_KEY, BASE_URL_KEY, Credential, ModelSlot, Profile};
    use crate::profiles::save_profile;
    use crate::test_utils::{sample_profile, setup_test_paths};
    use serde_json::Value;
    use std::fs;
    use tempfile::TempDir;

    fn seed(paths: &Paths) {
        save_profile(paths, &sample_profile("zai", "https://api.z.ai")).unwrap();
        save_profile(paths, &sample_profile("anthropic", "https://api.anthropic.com")).unwrap();
    }

    fn live_json(paths: &Paths) -> Value {
        serde_json::from_str(&fs::read_to_string(&paths.claude_settings).unwrap()).unwrap()
    }

    #[test]
    fn test_activate_writes_env_and_pointer() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        seed(&paths);

        let activation = activate(&paths, "zai").unwrap();
        assert!(activation.changed);
        assert!(activation.previous.is_none());
        assert!(activation.backup.is_none());

        let json = live_json(&paths);
        assert_eq!(json["env"][BASE_URL_KEY], "https://api.z.ai");
        assert_eq!(json["env"][AUTH_TOKEN_KEY], "zai-token-0123456789");

        let state = State::read(&paths.state_file).unwrap();
        assert_eq!(state.active_profile.as_deref(), Some("zai"));
        assert_eq!(
            LiveStatus::detect(&paths, &state),
            LiveStatus::InSync("zai".to_string())
        );
    }

    #[test]
    fn test_activate_unknown_leaves_everything_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        seed(&paths);
        activate(&paths, "zai").unwrap();
        let before = fs::read(&paths.claude_settings).unwrap();

        let err = activate(&paths, "unknown").unwrap_err();
        assert!(err.is_not_found());

        assert_eq!(fs::read(&paths.claude_settings).unwrap(), before);
        let state = State::read(&paths.state_file).unwrap();
        assert_eq!(state.active_profile.as_deref(), Some("zai"));
    }

    #[test]
    fn test_activate_invalid_profile_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        paths.ensure_dirs().unwrap();
        fs::create_dir_all(&paths.claude_dir).unwrap();
        fs::write(&paths.claude_settings, "{\"theme\": \"light\"}").unwrap();
        fs::write(
            paths.profile_file("broken"),
            r#"{"base_url": "https://api.z.ai"}"#,
        )
        .unwrap();

        let err = activate(&paths, "broken").unwrap_err();
        assert!(err.is_validation());
        assert_eq!(
            fs::read_to_string(&paths.claude_settings).unwrap(),
            "{\"theme\": \"light\"}"
        );
        assert!(!paths.state_file.exists());
    }

    #[test]
    fn test_activate_unresolved_env_reference_is_validation_error() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        let profile = Profile::new(
            "ref",
            "https://api.z.ai",
            Credential::new("env:CLAUDESWAP_SURELY_UNSET_VAR"),
        );
        save_profile(&paths, &profile).unwrap();

        assert!(activate(&paths, "ref").unwrap_err().is_validation());
        assert!(!paths.claude_settings.exists());
    }

    #[test]
    fn test_activate_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        seed(&paths);

        activate(&paths, "zai").unwrap();
        let once = fs::read(&paths.claude_settings).unwrap();
        let second = activate(&paths, "zai").unwrap();
        let twice = fs::read(&paths.claude_settings).unwrap();

        assert_eq!(once, twice);
        assert!(!second.changed);
        assert_eq!(second.previous.as_deref(), Some("zai"));
    }

    #[test]
    fn test_switch_replaces_models_and_backs_up() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        let glm = sample_profile("glm", "https://api.z.ai/api/anthropic")
            .with_model(ModelSlot::Sonnet, "glm-4.6");
        save_profile(&paths, &glm).unwrap();
        seed(&paths);

        activate(&paths, "glm").unwrap();
        assert_eq!(
            live_json(&paths)["env"]["ANTHROPIC_DEFAULT_SONNET_MODEL"],
            "glm-4.6"
        );

        let activation = activate(&paths, "anthropic").unwrap();
        assert_eq!(activation.previous.as_deref(), Some("glm"));
        assert!(activation.backup.is_some());
        assert!(
            live_json(&paths)["env"]
                .get("ANTHROPIC_DEFAULT_SONNET_MODEL")
                .is_none()
        );
    }

    #[test]
    fn test_extra_env_removed_on_next_switch() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        let mut special = sample_profile("special", "https://api.minimax.io/anthropic");
        special.env.insert("PROVIDER_REGION".to_string(), "eu".to_string());
        save_profile(&paths, &special).unwrap();
        seed(&paths);

        activate(&paths, "special").unwrap();
        assert_eq!(live_json(&paths)["env"]["PROVIDER_REGION"], "eu");

        activate(&paths, "zai").unwrap();
        assert!(live_json(&paths)["env"].get("PROVIDER_REGION").is_none());
    }

    #[test]
    fn test_activate_refuses_non_object_live_file() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        seed(&paths);
        fs::create_dir_all(&paths.claude_dir).unwrap();
        fs::write(&paths.claude_settings, "[]").unwrap();

        assert!(matches!(
            activate(&paths, "zai"),
            Err(SwapError::LiveConfig(_))
        ));
        assert_eq!(fs::read_to_string(&paths.claude_settings).unwrap(), "[]");
    }

    #[test]
    fn test_deactivate_keeps_unmanaged_keys() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        seed(&paths);
        fs::create_dir_all(&paths.claude_dir).unwrap();
        fs::write(
            &paths.claude_settings,
            r#"{"permissions": {"allow": []}, "env": {"HTTPS_PROXY": "http://p"}}"#,
        )
        .unwrap();

        activate(&paths, "zai").unwrap();
        let deactivation = deactivate(&paths).unwrap();
        assert!(deactivation.changed);
        assert!(!deactivation.state_unreadable);
        assert_eq!(deactivation.previous.as_deref(), Some("zai"));

        let json = live_json(&paths);
        assert_eq!(json["env"]["HTTPS_PROXY"], "http://p");
        assert!(json["env"].get(BASE_URL_KEY).is_none());
        assert!(json.get("permissions").is_some());

        let state = State::read(&paths.state_file).unwrap();
        assert!(state.active_profile.is_none());
        assert_eq!(LiveStatus::detect(&paths, &state), LiveStatus::Unconfigured);
    }

    #[test]
    fn test_deactivate_without_live_file() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);

        let deactivation = deactivate(&paths).unwrap();
        assert!(!deactivation.changed);
        assert!(!paths.claude_settings.exists());
    }

    #[test]
    fn test_restore_backup_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        seed(&paths);
        fs::create_dir_all(&paths.claude_dir).unwrap();
        fs::write(&paths.claude_settings, "{\"original\": true}\n").unwrap();

        let activation = activate(&paths, "zai").unwrap();
        let backup = activation.backup.unwrap();
        let id = backup.file_name().unwrap().to_str().unwrap().to_string();

        restore_backup(&paths, &id).unwrap();
        assert_eq!(
            fs::read_to_string(&paths.claude_settings).unwrap(),
            "{\"original\": true}\n"
        );
        let state = State::read(&paths.state_file).unwrap();
        assert!(state.active_profile.is_none());
    }

    #[test]
    fn test_live_status_reports_drift() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        seed(&paths);
        activate(&paths, "zai").unwrap();

        fs::write(
            &paths.claude_settings,
            r#"{"env": {"ANTHROPIC_BASE_URL": "https://elsewhere"}}"#,
        )
        .unwrap();

        let state = State::read(&paths.state_file).unwrap();
        assert_eq!(
            LiveStatus::detect(&paths, &state),
            LiveStatus::Drifted {
                profile: "zai".to_string(),
                keys: vec![AUTH_TOKEN_KEY.to_string(), BASE_URL_KEY.to_string()],
            }
        );
    }

    #[test]
    fn test_corrupt_state_does_not_block_switch() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        seed(&paths);
        fs::create_dir_all(&paths.base_dir).unwrap();
        fs::write(&paths.state_file, "{not json").unwrap();

        activate(&paths, "zai").unwrap();
        let state = State::read(&paths.state_file).unwrap();
        assert_eq!(state.active_profile.as_deref(), Some("zai"));
    }

    #[test]
    fn test_deactivate_with_corrupt_state_flags_unknown_extras() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        let mut special = sample_profile("special", "https://api.minimax.io/anthropic");
        special.env.insert("PROVIDER_FLAG".to_string(), "1".to_string());
        save_profile(&paths, &special).unwrap();
        activate(&paths, "special").unwrap();
        fs::write(&paths.state_file, "{not json").unwrap();

        let deactivation = deactivate(&paths).unwrap();
        assert!(deactivation.state_unreadable);
        assert!(deactivation.changed);

        let json = live_json(&paths);
        assert!(json["env"].get(BASE_URL_KEY).is_none());
        assert_eq!(json["env"]["PROVIDER_FLAG"], "1");
        assert!(State::read(&paths.state_file).unwrap().active_profile.is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_activate_through_symlinked_settings_updates_target() {
        use std::os::unix::fs::symlink;

        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        seed(&paths);
        let dotfiles = temp_dir.path().join("dotfiles");
        fs::create_dir_all(&dotfiles).unwrap();
        fs::create_dir_all(&paths.claude_dir).unwrap();
        let target = dotfiles.join("settings.json");
        fs::write(&target, r#"{"theme": "dark"}"#).unwrap();
        symlink(&target, &paths.claude_settings).unwrap();

        let activation = activate(&paths, "zai").unwrap();
        assert!(activation.changed);

        let meta = fs::symlink_metadata(&paths.claude_settings).unwrap();
        assert!(meta.file_type().is_symlink());
        let written: Value = serde_json::from_str(&fs::read_to_string(&target).unwrap()).unwrap();
        assert_eq!(written["theme"], "dark");
        assert_eq!(written["env"][BASE_URL_KEY], "https://api.z.ai");

        let backup = activation.backup.unwrap();
        assert_eq!(fs::read_to_string(backup).unwrap(), r#"{"theme": "dark"}"#);

        deactivate(&paths).unwrap();
        assert!(fs::symlink_metadata(&paths.claude_settings).unwrap().file_type().is_symlink());
        let reset: Value = serde_json::from_str(&fs::read_to_string(&target).unwrap()).unwrap();
        assert!(reset.get("env").is_none());
    }
}
