//! Structural validation of profiles.
//!
//! Pure checks only: nothing here touches the filesystem or resolves
//! environment references.

use url::Url;

use crate::error::{FieldError, SwapError, SwapResult};
use crate::profile::{CredentialSource, Profile, reserved_env_keys};

const MAX_NAME_LEN: usize = 64;

/// Validate profile name
///
/// Only allows alphanumeric characters, underscores, and hyphens.
pub fn check_name(name: &str) -> Option<FieldError> {
    if name.is_empty() {
        return Some(FieldError::new("name", "must not be empty"));
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Some(FieldError::new(
            "name",
            format!("must not be longer than {MAX_NAME_LEN} characters"),
        ));
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Some(FieldError::new(
            "name",
            format!(
                "'{name}' may only contain alphanumeric characters, hyphens (-), and underscores (_)"
            ),
        ));
    }

    None
}

/// Like [`check_name`], as a [`SwapError::Validation`]
pub fn validate_profile_name(name: &str) -> SwapResult<()> {
    match check_name(name) {
        Some(err) => Err(SwapError::Validation {
            name: name.to_string(),
            errors: vec![err],
        }),
        None => Ok(()),
    }
}

/// Collect every field-level problem with `profile`
pub fn validate(profile: &Profile) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();

    if let Some(err) = check_name(&profile.name) {
        errors.push(err);
    }

    if let Some(err) = check_base_url(&profile.base_url) {
        errors.push(err);
    }

    if profile.credential.is_blank() {
        errors.push(FieldError::new("credential", "must not be empty"));
    } else if let CredentialSource::Env(var) = profile.credential.source() {
        if !is_env_identifier(var) {
            errors.push(FieldError::new(
                "credential",
                format!("'{var}' is not a valid environment variable name"),
            ));
        }
    }

    for (slot, model) in &profile.models {
        let field = format!("models.{slot}");
        if model.trim().is_empty() {
            errors.push(FieldError::new(field, "model name must not be empty"));
        } else if model.trim().chars().any(char::is_whitespace) {
            errors.push(FieldError::new(field, "model name must not contain whitespace"));
        }
    }

    if profile.timeout_ms == Some(0) {
        errors.push(FieldError::new("timeout_ms", "must be greater than zero"));
    }

    let reserved = reserved_env_keys();
    for (key, value) in &profile.env {
        let field = format!("env.{key}");
        if !is_env_identifier(key) {
            errors.push(FieldError::new(field, "key must match [A-Z_][A-Z0-9_]*"));
        } else if reserved.contains(&key.as_str()) {
            errors.push(FieldError::new(field, "key is set from a dedicated profile field"));
        } else if value.contains('\n') || value.contains('\r') {
            errors.push(FieldError::new(field, "value must be a single line"));
        }
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// [`validate`] wrapped into the crate error type
pub fn ensure_valid(profile: &Profile) -> SwapResult<()> {
    validate(profile).map_err(|errors| SwapError::Validation {
        name: profile.name.clone(),
        errors,
    })
}

fn check_base_url(raw: &str) -> Option<FieldError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Some(FieldError::new("base_url", "must not be empty"));
    }

    match Url::parse(raw) {
        Ok(url) if !matches!(url.scheme(), "http" | "https") => Some(FieldError::new(
            "base_url",
            format!("scheme must be http or https, got '{}'", url.scheme()),
        )),
        Ok(url) if url.host_str().is_none_or(str::is_empty) => {
            Some(FieldError::new("base_url", "must include a host"))
        }
        Ok(_) => None,
        Err(e) => Some(FieldError::new("base_url", format!("'{raw}' is not a URL: {e}"))),
    }
}

fn is_env_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_uppercase() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}
