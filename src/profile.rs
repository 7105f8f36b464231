//! Profile data model.
//!
//! A profile is one provider endpoint: base URL, credential, and an optional
//! remapping of Claude Code's model slots onto provider model names. Profiles
//! translate into `env` entries of Claude Code's `settings.json`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const BASE_URL_KEY: &str = "ANTHROPIC_BASE_URL";
pub const AUTH_TOKEN_KEY: &str = "ANTHROPIC_AUTH_TOKEN";
pub const TIMEOUT_KEY: &str = "API_TIMEOUT_MS";

/// Prefix marking a credential that is read from the environment at switch time
pub const ENV_REFERENCE_PREFIX: &str = "env:";

/// Claude Code model roles a profile can remap
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelSlot {
    Default,
    SmallFast,
    Haiku,
    Sonnet,
    Opus,
}

impl ModelSlot {
    pub fn all() -> [ModelSlot; 5] {
        [
            ModelSlot::Default,
            ModelSlot::SmallFast,
            ModelSlot::Haiku,
            ModelSlot::Sonnet,
            ModelSlot::Opus,
        ]
    }

    /// The Claude Code environment variable this slot is written to
    pub fn env_key(&self) -> &'static str {
        match self {
            ModelSlot::Default => "ANTHROPIC_MODEL",
            ModelSlot::SmallFast => "ANTHROPIC_SMALL_FAST_MODEL",
            ModelSlot::Haiku => "ANTHROPIC_DEFAULT_HAIKU_MODEL",
            ModelSlot::Sonnet => "ANTHROPIC_DEFAULT_SONNET_MODEL",
            ModelSlot::Opus => "ANTHROPIC_DEFAULT_OPUS_MODEL",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelSlot::Default => "default",
            ModelSlot::SmallFast => "small-fast",
            ModelSlot::Haiku => "haiku",
            ModelSlot::Sonnet => "sonnet",
            ModelSlot::Opus => "opus",
        }
    }
}

impl fmt::Display for ModelSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelSlot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "default" | "model" => Ok(ModelSlot::Default),
            "small-fast" | "fast" => Ok(ModelSlot::SmallFast),
            "haiku" => Ok(ModelSlot::Haiku),
            "sonnet" => Ok(ModelSlot::Sonnet),
            "opus" => Ok(ModelSlot::Opus),
            _ => Err(format!(
                "Unknown model slot: {s} (expected default, small-fast, haiku, sonnet, opus)"
            )),
        }
    }
}

/// Every env key owned by a dedicated profile field
pub fn reserved_env_keys() -> Vec<&'static str> {
    let mut keys = vec![BASE_URL_KEY, AUTH_TOKEN_KEY, TIMEOUT_KEY];
    keys.extend(ModelSlot::all().iter().map(|s| s.env_key()));
    keys
}

/// Opaque API credential. Never printed in full.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

/// Where the actual token comes from
#[derive(Debug, PartialEq, Eq)]
pub enum CredentialSource<'a> {
    Literal(&'a str),
    Env(&'a str),
}

impl Credential {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn source(&self) -> CredentialSource<'_> {
        match self.0.strip_prefix(ENV_REFERENCE_PREFIX) {
            Some(var) => CredentialSource::Env(var.trim()),
            None => CredentialSource::Literal(self.0.trim()),
        }
    }

    /// Produce the token to write into the live settings
    pub fn resolve(&self) -> Result<String, String> {
        match self.source() {
            CredentialSource::Literal(token) => Ok(token.to_string()),
            CredentialSource::Env(var) => match std::env::var(var) {
                Ok(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
                _ => Err(format!("environment variable {var} is not set")),
            },
        }
    }

    /// Display form: env references verbatim, literal tokens with only the tail visible
    pub fn masked(&self) -> String {
        match self.source() {
            CredentialSource::Env(var) => format!("{ENV_REFERENCE_PREFIX}{var}"),
            CredentialSource::Literal(token) => mask_token(token),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Mask all but the last four characters of a token
pub fn mask_token(token: &str) -> String {
    let count = token.chars().count();
    if count <= 8 {
        return "****".to_string();
    }
    let tail: String = token.chars().skip(count - 4).collect();
    format!("****{tail}")
}

/// A stored provider profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Identifier, taken from the profile's file name
    #[serde(skip)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub base_url: String,

    #[serde(default)]
    pub credential: Credential,

    /// Model slot -> provider model name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub models: BTreeMap<ModelSlot, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    /// Extra env entries written verbatim
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        credential: Credential,
    ) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            description: None,
            base_url: base_url.into(),
            credential,
            models: BTreeMap::new(),
            timeout_ms: None,
            env: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_model(mut self, slot: ModelSlot, model: impl Into<String>) -> Self {
        self.models.insert(slot, model.into());
        self
    }

    /// The `env` entries this profile installs, given an already-resolved token
    pub fn env_entries(&self, token: &str) -> BTreeMap<String, String> {
        let mut entries = BTreeMap::new();
        entries.insert(BASE_URL_KEY.to_string(), self.base_url.trim().to_string());
        entries.insert(AUTH_TOKEN_KEY.to_string(), token.to_string());
        if let Some(timeout) = self.timeout_ms {
            entries.insert(TIMEOUT_KEY.to_string(), timeout.to_string());
        }
        for (slot, model) in &self.models {
            entries.insert(slot.env_key().to_string(), model.trim().to_string());
        }
        for (key, value) in &self.env {
            entries.insert(key.clone(), value.clone());
        }
        entries
    }

    /// Comma-separated `slot=model` summary for tables
    pub fn models_summary(&self) -> String {
        if self.models.is_empty() {
            return "-".to_string();
        }
        self.models
            .iter()
            .map(|(slot, model)| format!("{slot}={model}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Parse a `slot=model` CLI argument
pub fn parse_model_arg(arg: &str) -> Result<(ModelSlot, String), String> {
    let (slot, model) = arg
        .split_once('=')
        .ok_or_else(|| format!("Expected slot=model, got '{arg}'"))?;
    Ok((slot.trim().parse()?, model.trim().to_string()))
}

/// Parse a `KEY=VALUE` CLI argument
pub fn parse_env_arg(arg: &str) -> Result<(String, String), String> {
    let (key, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("Expected KEY=VALUE, got '{arg}'"))?;
    Ok((key.trim().to_string(), value.to_string()))
}
