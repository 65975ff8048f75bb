//! `proactive.yaml` — the soul file (spec §4.8(e), §6).

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use unclaude_core::Priority;

use crate::error::{ConfigError, ConfigResult};

const KNOWN_TOP_LEVEL_KEYS: &[&str] = &["identity", "drives", "boundaries", "behaviors"];

/// Hardcoded safety rules, always merged into [`ProactiveConfig::boundaries`]
/// regardless of what the user-editable file specifies (spec §4.8(e):
/// "boundaries[] (always merged with hardcoded safety rules)").
pub const HARDCODED_SAFETY_BOUNDARIES: &[&str] = &[
    "never act outside the granted capability set",
    "never disable or bypass the sandbox policy",
    "never fabricate task completion",
];

/// `identity` section: who the daemon presents itself as in proactive tasks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SoulIdentity {
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// One-line self-description.
    #[serde(default)]
    pub tagline: String,
    /// Free-form personality traits, folded into the proactive task's soul
    /// context block.
    #[serde(default)]
    pub personality: Vec<String>,
}

/// A behavior's active-hours gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActiveHours {
    /// No time-of-day restriction.
    Always(AlwaysMarker),
    /// Restricted to a `[start, end]` local-time window.
    Range([String; 2]),
}

/// Serde helper so `"always"` round-trips as a unit-like string variant
/// inside the untagged [`ActiveHours`] enum.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AlwaysMarker;

impl TryFrom<String> for AlwaysMarker {
    type Error = String;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value == "always" {
            Ok(Self)
        } else {
            Err(format!("expected \"always\", got {value:?}"))
        }
    }
}

impl From<AlwaysMarker> for String {
    fn from(_: AlwaysMarker) -> Self {
        "always".to_string()
    }
}

impl ActiveHours {
    /// Whether `now` falls within this gate.
    #[must_use]
    pub fn contains(&self, now: NaiveTime) -> bool {
        match self {
            Self::Always(_) => true,
            Self::Range([start, end]) => match (parse_hm(start), parse_hm(end)) {
                (Some(start), Some(end)) => {
                    if start <= end {
                        now >= start && now <= end
                    } else {
                        // Wraps midnight, e.g. ["22:00", "06:00"].
                        now >= start || now <= end
                    }
                }
                _ => true,
            },
        }
    }
}

fn parse_hm(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M").ok()
}

/// One proactive behavior definition (spec §4.8(e)).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Behavior {
    /// Stable behavior name, used for `source = "proactive:<name>"` and the
    /// per-behavior `last_run` key.
    pub name: String,
    /// Whether the behavior is currently active.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Raw interval string (`"4h"`, `"30m"`, `"1d"`); parse with
    /// [`Behavior::interval_duration`].
    pub interval: String,
    /// Time-of-day gate.
    #[serde(default = "default_active_hours")]
    pub active_hours: ActiveHours,
    /// Task priority when this behavior fires.
    #[serde(default)]
    pub priority: Priority,
    /// Whether to notify the user via the configured messaging bridge when
    /// this behavior's task completes.
    #[serde(default)]
    pub notify: bool,
    /// Task description template (prefixed with the soul context block at
    /// enqueue time).
    pub task: String,
}

fn default_true() -> bool {
    true
}

fn default_active_hours() -> ActiveHours {
    ActiveHours::Always(AlwaysMarker)
}

impl Behavior {
    /// Parse [`Behavior::interval`] as `<N><unit>` (`s|m|h|d`) into a
    /// [`chrono::Duration`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the string doesn't parse as a
    /// number followed by one of `s`, `m`, `h`, `d`.
    pub fn interval_duration(&self) -> ConfigResult<chrono::Duration> {
        parse_interval(&self.interval)
    }
}

fn parse_interval(raw: &str) -> ConfigResult<chrono::Duration> {
    let raw = raw.trim();
    let (digits, unit) = raw.split_at(raw.len().saturating_sub(1));
    let n: i64 = digits
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("invalid interval {raw:?}")))?;
    match unit {
        "s" => Ok(chrono::Duration::seconds(n)),
        "m" => Ok(chrono::Duration::minutes(n)),
        "h" => Ok(chrono::Duration::hours(n)),
        "d" => Ok(chrono::Duration::days(n)),
        _ => Err(ConfigError::Invalid(format!(
            "invalid interval unit in {raw:?}, expected one of s|m|h|d"
        ))),
    }
}

/// Typed `proactive.yaml` (spec §4.8(e)).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProactiveConfig {
    /// The daemon's self-presentation.
    #[serde(default)]
    pub identity: SoulIdentity,
    /// Drives — free-form motivations folded into the soul context block.
    #[serde(default)]
    pub drives: Vec<String>,
    /// User-authored boundaries; merged with
    /// [`HARDCODED_SAFETY_BOUNDARIES`] at load time, never replacing them.
    #[serde(default)]
    pub boundaries: Vec<String>,
    /// Self-scheduled behaviors.
    #[serde(default)]
    pub behaviors: Vec<Behavior>,
}

impl ProactiveConfig {
    /// Load and validate `proactive.yaml` from `path`, merging in the
    /// hardcoded safety boundaries.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Parse`] if it is not valid YAML for this schema.
    pub fn load(path: impl AsRef<std::path::Path>) -> ConfigResult<Self> {
        let path_ref = path.as_ref();
        let text = std::fs::read_to_string(path_ref).map_err(|e| ConfigError::Io {
            path: path_ref.display().to_string(),
            source: e,
        })?;
        Self::parse(&text, &path_ref.display().to_string())
    }

    /// Parse `text` as a `proactive.yaml` document.
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
                        tracing::warn!(key, source = source_label, "unrecognized proactive.yaml key");
                    }
                }
            }
        }

        let mut parsed: Self = serde_yaml::from_str(text).map_err(|e| ConfigError::Parse {
            path: source_label.to_string(),
            source: e,
        })?;

        for rule in HARDCODED_SAFETY_BOUNDARIES {
            if !parsed.boundaries.iter().any(|b| b == rule) {
                parsed.boundaries.push((*rule).to_string());
            }
        }

        Ok(parsed)
    }

    /// Render the soul context block prefixed to every proactive task
    /// description (spec §4.8(e): "synthesize a task description
    /// (behavior.task prefixed with a soul context block)").
    #[must_use]
    pub fn soul_context_block(&self) -> String {
        let mut lines = Vec::new();
        if !self.identity.name.is_empty() {
            lines.push(format!("You are {}.", self.identity.name));
        }
        if !self.identity.tagline.is_empty() {
            lines.push(self.identity.tagline.clone());
        }
        if !self.drives.is_empty() {
            lines.push(format!("Drives: {}", self.drives.join("; ")));
        }
        if !self.boundaries.is_empty() {
            lines.push(format!("Boundaries: {}", self.boundaries.join("; ")));
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
identity:
  name: Unclaude
  tagline: a careful autonomous agent
  personality:
    - curious
    - terse
drives:
  - keep the project healthy
boundaries:
  - never touch production credentials
behaviors:
  - name: morning-digest
    enabled: true
    interval: 1d
    active_hours: ["07:00", "09:00"]
    priority: low
    notify: true
    task: Summarize overnight activity.
  - name: health-check
    enabled: true
    interval: 30m
    task: Check for failing tests.
"#;

    #[test]
    fn parses_behaviors_and_merges_safety_boundaries() {
        let config = ProactiveConfig::parse(SAMPLE, "test").unwrap();
        assert_eq!(config.behaviors.len(), 2);
        assert_eq!(config.behaviors[0].priority, Priority::Low);
        for rule in HARDCODED_SAFETY_BOUNDARIES {
            assert!(config.boundaries.contains(&(*rule).to_string()));
        }
        assert!(config.boundaries.contains(&"never touch production credentials".to_string()));
    }

    #[test]
    fn defaults_active_hours_to_always() {
        let config = ProactiveConfig::parse(SAMPLE, "test").unwrap();
        let health_check = &config.behaviors[1];
        assert!(health_check.active_hours.contains(NaiveTime::from_hms_opt(3, 0, 0).unwrap()));
    }

    #[test]
    fn interval_parses_unit_suffix() {
        let config = ProactiveConfig::parse(SAMPLE, "test").unwrap();
        assert_eq!(
            config.behaviors[0].interval_duration().unwrap(),
            chrono::Duration::days(1)
        );
        assert_eq!(
            config.behaviors[1].interval_duration().unwrap(),
            chrono::Duration::minutes(30)
        );
    }

    #[test]
    fn range_active_hours_respects_window() {
        let hours = ActiveHours::Range(["07:00".to_string(), "09:00".to_string()]);
        assert!(hours.contains(NaiveTime::from_hms_opt(8, 0, 0).unwrap()));
        assert!(!hours.contains(NaiveTime::from_hms_opt(12, 0, 0).unwrap()));
    }

    #[test]
    fn range_active_hours_wraps_midnight() {
        let hours = ActiveHours::Range(["22:00".to_string(), "06:00".to_string()]);
        assert!(hours.contains(NaiveTime::from_hms_opt(23, 30, 0).unwrap()));
        assert!(hours.contains(NaiveTime::from_hms_opt(2, 0, 0).unwrap()));
        assert!(!hours.contains(NaiveTime::from_hms_opt(12, 0, 0).unwrap()));
    }

    #[test]
    fn soul_context_block_includes_identity_and_drives() {
        let config = ProactiveConfig::parse(SAMPLE, "test").unwrap();
        let block = config.soul_context_block();
        assert!(block.contains("Unclaude"));
        assert!(block.contains("keep the project healthy"));
    }
}
