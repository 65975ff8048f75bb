//! `config.yaml` schema (spec §6 "Configuration file schema").

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

const KNOWN_TOP_LEVEL_KEYS: &[&str] = &[
    "default_provider",
    "providers",
    "security",
    "routing",
    "custom_models",
];

/// `security.profile` — one of the five capability/sandbox presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityProfile {
    /// `readonly` capability preset.
    Readonly,
    /// `developer` capability preset.
    Developer,
    /// `full` capability preset.
    Full,
    /// `autonomous` capability preset.
    Autonomous,
    /// `subagent` capability preset.
    Subagent,
}

impl SecurityProfile {
    /// Canonical wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Readonly => "readonly",
            Self::Developer => "developer",
            Self::Full => "full",
            Self::Autonomous => "autonomous",
            Self::Subagent => "subagent",
        }
    }
}

/// `routing.profile` — one of the four Smart Router profiles (spec §4.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingProfile {
    /// Cheapest model per tier, preferring a configured provider.
    Auto,
    /// Flat mapping: every tier gets the cheapest model overall.
    Eco,
    /// Flat mapping: every tier gets the highest-quality model.
    Premium,
    /// Only local/free-tagged models.
    Free,
}

impl RoutingProfile {
    /// Canonical wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Eco => "eco",
            Self::Premium => "premium",
            Self::Free => "free",
        }
    }
}

/// One entry of `providers` — the default model for that provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Default model ID for this provider.
    pub model: String,
}

/// `security` section of `config.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecuritySection {
    /// Active capability/sandbox profile.
    pub profile: SecurityProfile,
}

impl Default for SecuritySection {
    fn default() -> Self {
        Self {
            profile: SecurityProfile::Developer,
        }
    }
}

/// `routing` section of `config.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingSection {
    /// Active Smart Router profile.
    pub profile: RoutingProfile,
}

impl Default for RoutingSection {
    fn default() -> Self {
        Self {
            profile: RoutingProfile::Auto,
        }
    }
}

/// Typed `config.yaml` (spec §6 "recognized keys").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Default LLM provider name, used when a request carries no explicit
    /// provider.
    #[serde(default)]
    pub default_provider: Option<String>,
    /// Provider name -> its default model config.
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    /// Capability/sandbox profile selection.
    #[serde(default)]
    pub security: SecuritySection,
    /// Smart Router profile selection.
    #[serde(default)]
    pub routing: RoutingSection,
    /// Provider name -> extra model IDs available beyond the built-in
    /// catalog (spec §6 `custom_models`).
    #[serde(default)]
    pub custom_models: HashMap<String, Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_provider: None,
            providers: HashMap::new(),
            security: SecuritySection::default(),
            routing: RoutingSection::default(),
            custom_models: HashMap::new(),
        }
    }
}

impl Config {
    /// Load and validate `config.yaml` from `path`.
    ///
    /// Unrecognized top-level keys are logged as a warning (Design Note §9)
    /// rather than rejected — the file is still loaded.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Parse`] if it is not valid YAML for this schema.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path_ref = path.as_ref();
        let text = std::fs::read_to_string(path_ref).map_err(|e| ConfigError::Io {
            path: path_ref.display().to_string(),
            source: e,
        })?;
        Self::parse(&text, &path_ref.display().to_string())
    }

    /// Parse `text` as a `config.yaml` document, warning on unknown
    /// top-level keys (`source_label` is used only in the warning message).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if `text` is not valid YAML for this
    /// schema.
    pub fn parse(text: &str, source_label: &str) -> ConfigResult<Self> {
        if let Ok(serde_yaml::Value::Mapping(map)) = serde_yaml::from_str::<serde_yaml::Value>(text)
        {
            for key in map.keys() {
                if let Some(key) = key.as_str() {
                    if !KNOWN_TOP_LEVEL_KEYS.contains(&key) {
                        tracing::warn!(key, source = source_label, "unrecognized config.yaml key");
                    }
                }
            }
        }

        serde_yaml::from_str(text).map_err(|e| ConfigError::Parse {
            path: source_label.to_string(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_config() {
        let config = Config::parse(
            "default_provider: anthropic\nsecurity:\n  profile: autonomous\n",
            "test",
        )
        .unwrap();
        assert_eq!(config.default_provider.as_deref(), Some("anthropic"));
        assert_eq!(config.security.profile, SecurityProfile::Autonomous);
        assert_eq!(config.routing.profile, RoutingProfile::Auto);
    }

    #[test]
    fn defaults_when_sections_absent() {
        let config = Config::parse("default_provider: anthropic\n", "test").unwrap();
        assert_eq!(config.security.profile, SecurityProfile::Developer);
    }

    #[test]
    fn unknown_top_level_key_does_not_fail_load() {
        let config = Config::parse("totally_made_up_key: 1\n", "test").unwrap();
        assert!(config.default_provider.is_none());
    }

    #[test]
    fn custom_models_parse_as_provider_to_list() {
        let config = Config::parse(
            "custom_models:\n  ollama:\n    - llama3\n    - mixtral\n",
            "test",
        )
        .unwrap();
        assert_eq!(
            config.custom_models.get("ollama"),
            Some(&vec!["llama3".to_string(), "mixtral".to_string()])
        );
    }

    #[test]
    fn load_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "default_provider: anthropic\n").unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.default_provider.as_deref(), Some("anthropic"));
    }
}
