//! Profile Store.
//!
//! One JSON document per profile in `~/.claude-swap/profiles/<name>.json`.
//! The file stem is the profile's identifier. Nothing in this module touches
//! Claude Code's live settings.

use chrono::Utc;
use std::fs;
use tracing::debug;

use crate::error::{SwapError, SwapResult};
use crate::fs_utils::{Mode, read_optional, write_atomic};
use crate::paths::Paths;
use crate::profile::Profile;
use crate::validate::{check_name, ensure_valid, validate_profile_name};

/// List available profile names, sorted
pub fn list_profiles(paths: &Paths) -> SwapResult<Vec<String>> {
    let entries = match fs::read_dir(&paths.profiles_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(SwapError::io("read", &paths.profiles_dir, e)),
    };

    let mut profiles = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| SwapError::io("read", &paths.profiles_dir, e))?;
        let path = entry.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        if let Some(name) = path.file_stem().and_then(|n| n.to_str()) {
            if check_name(name).is_none() {
                profiles.push(name.to_string());
            }
        }
    }
    profiles.sort();
    Ok(profiles)
}

/// Check if a profile exists
pub fn profile_exists(paths: &Paths, name: &str) -> bool {
    check_name(name).is_none() && paths.profile_file(name).is_file()
}

/// Load a profile by name
///
/// The returned profile is not validated; callers that need a usable profile
/// should pass it through [`crate::validate::validate`].
pub fn load_profile(paths: &Paths, name: &str) -> SwapResult<Profile> {
    if check_name(name).is_some() {
        return Err(SwapError::NotFound(name.to_string()));
    }

    let path = paths.profile_file(name);
    let content = read_optional(&path)?.ok_or_else(|| SwapError::NotFound(name.to_string()))?;

    let mut profile: Profile =
        serde_json::from_str(&content).map_err(|e| SwapError::json(&path, e))?;
    profile.name = name.to_string();
    debug!(profile = name, path = %path.display(), "loaded profile");
    Ok(profile)
}

/// Validate and persist a profile, overwriting any existing one of the same name
pub fn save_profile(paths: &Paths, profile: &Profile) -> SwapResult<()> {
    ensure_valid(profile)?;

    let path = paths.profile_file(&profile.name);
    let content = serde_json::to_string_pretty(profile).map_err(|e| SwapError::json(&path, e))?;
    write_atomic(&path, format!("{content}\n").as_bytes(), Mode::Private)?;
    debug!(profile = %profile.name, path = %path.display(), "saved profile");
    Ok(())
}

/// Persist a new profile, failing if the name is already taken
pub fn create_profile(paths: &Paths, profile: &Profile) -> SwapResult<()> {
    if profile_exists(paths, &profile.name) {
        return Err(SwapError::AlreadyExists(profile.name.clone()));
    }
    save_profile(paths, profile)
}

/// Remove a profile
pub fn remove_profile(paths: &Paths, name: &str) -> SwapResult<()> {
    if !profile_exists(paths, name) {
        return Err(SwapError::NotFound(name.to_string()));
    }

    let path = paths.profile_file(name);
    fs::remove_file(&path).map_err(|e| SwapError::io("remove", &path, e))?;
    debug!(profile = name, "removed profile");
    Ok(())
}

/// Rename a profile
pub fn rename_profile(paths: &Paths, old_name: &str, new_name: &str) -> SwapResult<()> {
    if !profile_exists(paths, old_name) {
        return Err(SwapError::NotFound(old_name.to_string()));
    }
    validate_profile_name(new_name)?;
    if profile_exists(paths, new_name) {
        return Err(SwapError::AlreadyExists(new_name.to_string()));
    }

    let old_path = paths.profile_file(old_name);
    let new_path = paths.profile_file(new_name);
    fs::rename(&old_path, &new_path).map_err(|e| SwapError::io("rename", &old_path, e))?;
    debug!(from = old_name, to = new_name, "renamed profile");
    Ok(())
}

/// Stamp `updated_at` and save
pub fn touch_and_save(paths: &Paths, profile: &mut Profile) -> SwapResult<()> {
    profile.updated_at = Utc::now();
    save_profile(paths, profile)
}
