// src/core/profiles.rs — Character → model weights / prompt language mapping
//
// Loaded once at startup from models.json and read-only afterwards.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterProfile {
    /// GPT weights path on the backend host.
    #[serde(default)]
    pub gpt: Option<String>,
    /// SoVITS weights path on the backend host.
    #[serde(default)]
    pub sovits: Option<String>,
    #[serde(default)]
    pub prompt_lang: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CharacterProfiles {
    profiles: HashMap<String, CharacterProfile>,
}

impl CharacterProfiles {
    pub fn new(profiles: HashMap<String, CharacterProfile>) -> Self {
        Self { profiles }
    }

    /// Load from a JSON file. A missing or unreadable file yields an empty map.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            tracing::info!(
                "No character profiles at {}; using defaults for every character",
                path.display()
            );
            return Self::default();
        }

        match Self::load_from(path) {
            Ok(profiles) => {
                tracing::info!("Loaded {} character profiles", profiles.len());
                profiles
            }
            Err(e) => {
                tracing::error!("Failed to load {}: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let profiles: CharacterProfiles = serde_json::from_str(&content)?;
        Ok(profiles)
    }

    pub fn get(&self, character: &str) -> Option<&CharacterProfile> {
        self.profiles.get(character)
    }

    /// Prompt language for a character: profile override, else `default`.
    pub fn prompt_lang<'a>(&'a self, character: &str, default: &'a str) -> &'a str {
        self.get(character)
            .and_then(|p| p.prompt_lang.as_deref())
            .filter(|lang| !lang.is_empty())
            .unwrap_or(default)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}
