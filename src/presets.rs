//! Built-in provider templates used by `claudeswap add --preset`.

use crate::profile::{Credential, ModelSlot, Profile};

/// A known provider with its Anthropic-compatible endpoint and model mapping
#[derive(Debug, Clone, Copy)]
pub struct Preset {
    pub id: &'static str,
    pub provider: &'static str,
    pub base_url: &'static str,
    pub timeout_ms: Option<u64>,
    pub models: &'static [(ModelSlot, &'static str)],
}

pub const PRESETS: &[Preset] = &[
    Preset {
        id: "zai",
        provider: "Z.ai (GLM)",
        base_url: "https://api.z.ai/api/anthropic",
        timeout_ms: Some(3_000_000),
        models: &[
            (ModelSlot::Haiku, "glm-4.5-air"),
            (ModelSlot::Sonnet, "glm-4.6"),
            (ModelSlot::Opus, "glm-4.6"),
        ],
    },
    Preset {
        id: "minimax",
        provider: "MiniMax",
        base_url: "https://api.minimax.io/anthropic",
        timeout_ms: Some(3_000_000),
        models: &[
            (ModelSlot::Default, "MiniMax-M2"),
            (ModelSlot::SmallFast, "MiniMax-M2"),
            (ModelSlot::Haiku, "MiniMax-M2"),
            (ModelSlot::Sonnet, "MiniMax-M2"),
            (ModelSlot::Opus, "MiniMax-M2"),
        ],
    },
    Preset {
        id: "anthropic",
        provider: "Anthropic",
        base_url: "https://api.anthropic.com",
        timeout_ms: None,
        models: &[],
    },
];

pub fn find_preset(id: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.id.eq_ignore_ascii_case(id))
}

pub fn preset_ids() -> Vec<&'static str> {
    PRESETS.iter().map(|p| p.id).collect()
}

impl Preset {
    /// Build a profile from this template
    pub fn to_profile(&self, name: &str, credential: Credential) -> Profile {
        let mut profile = Profile::new(name, self.base_url, credential);
        profile.timeout_ms = self.timeout_ms;
        profile.description = Some(self.provider.to_string());
        for (slot, model) in self.models {
            profile.models.insert(*slot, model.to_string());
        }
        profile
    }
}
