//! TOML-based application configuration.
//!
//! Stores:
//! - Planner working hours and tuning (`[planner]`)
//! - Sync preferences (`[sync]`)
//!
//! Configuration is stored at `~/.config/secretary/config.toml`.

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::{ConfigError, ValidationError};
use crate::planner::{ClockTime, PlanOptions, PlannerConfig};
use crate::sync::{PayloadFormat, Provider};

/// Planner section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannerSection {
    #[serde(default = "default_work_start")]
    pub work_start: ClockTime,
    #[serde(default = "default_work_end")]
    pub work_end: ClockTime,
    #[serde(default = "default_buffer_minutes")]
    pub buffer_minutes: u32,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_granularity")]
    pub cursor_granularity_minutes: u32,
    #[serde(default = "default_duration")]
    pub default_duration_minutes: u32,
    /// Offset of the user's local clock from UTC
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

/// Sync section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSection {
    #[serde(default = "default_providers")]
    pub enabled_providers: Vec<Provider>,
    #[serde(default)]
    pub default_format: PayloadFormat,
}

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub planner: PlannerSection,
    #[serde(default)]
    pub sync: SyncSection,
}

fn default_work_start() -> ClockTime {
    PlanOptions::default().work_start
}
fn default_work_end() -> ClockTime {
    PlanOptions::default().work_end
}
fn default_buffer_minutes() -> u32 {
    PlannerConfig::default().buffer_minutes
}
fn default_max_attempts() -> u32 {
    PlannerConfig::default().max_attempts
}
fn default_granularity() -> u32 {
    PlannerConfig::default().cursor_granularity_minutes
}
fn default_duration() -> u32 {
    PlannerConfig::default().default_duration_minutes
}
fn default_providers() -> Vec<Provider> {
    vec![Provider::Google, Provider::Outlook, Provider::Apple]
}

impl Default for PlannerSection {
    fn default() -> Self {
        Self {
            work_start: default_work_start(),
            work_end: default_work_end(),
            buffer_minutes: default_buffer_minutes(),
            max_attempts: default_max_attempts(),
            cursor_granularity_minutes: default_granularity(),
            default_duration_minutes: default_duration(),
            utc_offset_minutes: 0,
        }
    }
}

impl Default for SyncSection {
    fn default() -> Self {
        Self {
            enabled_providers: default_providers(),
            default_format: PayloadFormat::default(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').filter(|p| !p.is_empty()).peekable();
        if parts.peek().is_none() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<i64>() {
                            serde_json::Value::Number(n.into())
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as integer")));
                        }
                    }
                    serde_json::Value::Array(_) => {
                        // Comma lists are accepted alongside JSON arrays.
                        match serde_json::from_str(value) {
                            Ok(v @ serde_json::Value::Array(_)) => v,
                            _ => serde_json::Value::Array(
                                value
                                    .split(',')
                                    .map(str::trim)
                                    .filter(|s| !s.is_empty())
                                    .map(|s| serde_json::Value::String(s.to_string()))
                                    .collect(),
                            ),
                        }
                    }
                    serde_json::Value::Object(_) => return Err(unknown()),
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing the default config on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path.
    ///
    /// # Errors
    ///
    /// See [`Config::load`].
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config =
                    toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                        path: path.to_path_buf(),
                        message: e.to_string(),
                    })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to an explicit path.
    ///
    /// # Errors
    ///
    /// See [`Config::save`].
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Update a value in memory by dot-separated key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not fit the
    /// field. On error the config is unchanged.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Every leaf as `(dot.key, value)`, sorted by key.
    pub fn entries(&self) -> Vec<(String, String)> {
        fn walk(prefix: &str, value: &serde_json::Value, out: &mut Vec<(String, String)>) {
            match value {
                serde_json::Value::Object(map) => {
                    for (k, v) in map {
                        let key = if prefix.is_empty() {
                            k.clone()
                        } else {
                            format!("{prefix}.{k}")
                        };
                        walk(&key, v, out);
                    }
                }
                serde_json::Value::String(s) => out.push((prefix.to_string(), s.clone())),
                other => out.push((prefix.to_string(), other.to_string())),
            }
        }

        let mut out = Vec::new();
        if let Ok(json) = serde_json::to_value(self) {
            walk("", &json, &mut out);
        }
        out
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.plan_options().map(|_| ()).map_err(|e| ConfigError::InvalidValue {
            key: "planner".to_string(),
            message: e.to_string(),
        })
    }

    /// Working hours and offset as planning options.
    ///
    /// # Errors
    ///
    /// Returns an error when the working window is empty or the offset is out
    /// of range.
    pub fn plan_options(&self) -> Result<PlanOptions, ValidationError> {
        let offset = FixedOffset::east_opt(self.planner.utc_offset_minutes.saturating_mul(60))
            .ok_or_else(|| ValidationError::InvalidValue {
                field: "planner.utc_offset_minutes".to_string(),
                message: format!("{} is out of range", self.planner.utc_offset_minutes),
            })?;
        Ok(PlanOptions::new(self.planner.work_start, self.planner.work_end)?.with_offset(offset))
    }

    pub fn planner_config(&self) -> PlannerConfig {
        PlannerConfig {
            buffer_minutes: self.planner.buffer_minutes,
            max_attempts: self.planner.max_attempts,
            cursor_granularity_minutes: self.planner.cursor_granularity_minutes,
            default_duration_minutes: self.planner.default_duration_minutes,
        }
    }

    pub fn is_enabled(&self, provider: Provider) -> bool {
        self.sync.enabled_providers.contains(&provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
        assert!(toml_str.contains("work_start = \"09:00\""));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[planner]\nbuffer_minutes = 5\n").unwrap();
        assert_eq!(parsed.planner.buffer_minutes, 5);
        assert_eq!(parsed.planner.max_attempts, 50);
        assert_eq!(parsed.sync.default_format, PayloadFormat::Normalized);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("planner.work_start").as_deref(), Some("09:00"));
        assert_eq!(cfg.get("planner.buffer_minutes").as_deref(), Some("15"));
        assert_eq!(cfg.get("sync.default_format").as_deref(), Some("normalized"));
        assert!(cfg.get("planner.missing_key").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn set_updates_number_and_clock_time() {
        let mut cfg = Config::default();
        cfg.set("planner.max_attempts", "10").unwrap();
        cfg.set("planner.work_end", "18:30").unwrap();
        assert_eq!(cfg.planner.max_attempts, 10);
        assert_eq!(cfg.planner.work_end, ClockTime::new(18, 30).unwrap());
    }

    #[test]
    fn set_accepts_comma_list_for_providers() {
        let mut cfg = Config::default();
        cfg.set("sync.enabled_providers", "google, apple").unwrap();
        assert_eq!(
            cfg.sync.enabled_providers,
            vec![Provider::Google, Provider::Apple]
        );
        assert!(!cfg.is_enabled(Provider::Outlook));
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("planner.nonexistent", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(
            cfg.set("planner", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    fn set_rejects_invalid_values_and_keeps_config() {
        let mut cfg = Config::default();
        assert!(cfg.set("planner.buffer_minutes", "soon").is_err());
        assert!(cfg.set("planner.work_start", "9am").is_err());
        assert!(cfg.set("planner.work_start", "18:00").is_err());
        assert!(cfg.set("sync.default_format", "yaml").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn plan_options_follow_config() {
        let mut cfg = Config::default();
        cfg.set("planner.utc_offset_minutes", "-300").unwrap();
        let options = cfg.plan_options().unwrap();
        assert_eq!(options.utc_offset.local_minus_utc(), -300 * 60);
        assert_eq!(options.work_start, ClockTime::new(9, 0).unwrap());
        assert_eq!(cfg.planner_config(), PlannerConfig::default());
    }

    #[test]
    fn entries_list_every_leaf() {
        let entries = Config::default().entries();
        assert!(entries.contains(&("planner.work_end".to_string(), "17:00".to_string())));
        assert!(entries
            .iter()
            .any(|(k, _)| k == "sync.enabled_providers"));
    }

    #[test]
    fn load_from_writes_default_then_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let first = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(first, Config::default());

        let mut changed = first.clone();
        changed.set("planner.buffer_minutes", "0").unwrap();
        changed.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().planner.buffer_minutes, 0);
    }

    #[test]
    fn load_from_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "planner = 3").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::LoadFailed { .. })
        ));
    }
}
