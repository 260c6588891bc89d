//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - SRS profile and concert safety margin
//! - Readiness band thresholds
//! - Session planning defaults (target length, interleave, microbreaks)
//!
//! Configuration is stored at `~/.config/woodshed/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::error::{ConfigError, Result};
use crate::planner::{PlannerConfig, SessionStrategy};
use crate::readiness::{ReadinessScorer, ReadinessThresholds};
use crate::srs::{SrsProfile, SrsScheduler};

/// SRS scheduling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SrsConfig {
    #[serde(default)]
    pub profile: SrsProfile,
    /// Hours kept clear between the last scheduled review and a concert
    #[serde(default = "default_safety_margin_hours")]
    pub safety_margin_hours: i64,
}

/// Readiness band thresholds (0-100 scores).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessConfig {
    #[serde(default = "default_developing")]
    pub developing: f64,
    #[serde(default = "default_nearly_ready")]
    pub nearly_ready: f64,
    #[serde(default = "default_performance_ready")]
    pub performance_ready: f64,
}

/// Session planning defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_target_minutes")]
    pub default_target_minutes: i64,
    #[serde(default)]
    pub interleave: bool,
    #[serde(default = "default_true")]
    pub microbreaks: bool,
    #[serde(default = "default_microbreak_interval")]
    pub microbreak_interval_minutes: i64,
    #[serde(default = "default_microbreak_minutes")]
    pub microbreak_minutes: i64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/woodshed/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub srs: SrsConfig,
    #[serde(default)]
    pub readiness: ReadinessConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

// Default functions
fn default_safety_margin_hours() -> i64 {
    24
}
fn default_developing() -> f64 {
    40.0
}
fn default_nearly_ready() -> f64 {
    70.0
}
fn default_performance_ready() -> f64 {
    90.0
}
fn default_target_minutes() -> i64 {
    30
}
fn default_true() -> bool {
    true
}
fn default_microbreak_interval() -> i64 {
    20
}
fn default_microbreak_minutes() -> i64 {
    3
}

impl Default for SrsConfig {
    fn default() -> Self {
        Self {
            profile: SrsProfile::default(),
            safety_margin_hours: default_safety_margin_hours(),
        }
    }
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            developing: default_developing(),
            nearly_ready: default_nearly_ready(),
            performance_ready: default_performance_ready(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_target_minutes: default_target_minutes(),
            interleave: false,
            microbreaks: default_true(),
            microbreak_interval_minutes: default_microbreak_interval(),
            microbreak_minutes: default_microbreak_minutes(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            srs: SrsConfig::default(),
            readiness: ReadinessConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

impl Config {
    fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path,
                    message: e.to_string(),
                })?;
                Ok(cfg)
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to
    /// disk.
    pub fn save(&self) -> Result<()> {
        let path = Self::path()?;
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Load from disk, falling back to defaults on any error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
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

    /// Set a config value by key. Returns an error if the key is unknown
    /// or the value does not parse as the key's type.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownKey`] or [`ConfigError::InvalidValue`].
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| {
            ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            }
        })?;
        *self = updated;
        Ok(())
    }

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
        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() {
            return Err(ConfigError::UnknownKey(key.to_string()));
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
                let existing = obj
                    .get(part)
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

                let invalid = |message: String| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message,
                };

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<i64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| {
                                    invalid(format!("cannot parse '{value}' as number"))
                                })?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current
                .get_mut(part)
                .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        }

        Err(ConfigError::UnknownKey(key.to_string()))
    }

    /// Build an [`SrsScheduler`] from the configured profile and margin.
    pub fn scheduler(&self) -> SrsScheduler {
        SrsScheduler::with_profile(self.srs.profile)
            .with_safety_margin(chrono::Duration::hours(self.srs.safety_margin_hours))
    }

    /// Build a [`ReadinessScorer`] from the configured thresholds.
    pub fn scorer(&self) -> ReadinessScorer {
        ReadinessScorer::with_thresholds(ReadinessThresholds {
            developing: self.readiness.developing,
            nearly_ready: self.readiness.nearly_ready,
            performance_ready: self.readiness.performance_ready,
        })
    }

    /// Planner timing from the session section.
    pub fn planner_config(&self) -> PlannerConfig {
        PlannerConfig {
            microbreak_interval_minutes: self.session.microbreak_interval_minutes,
            microbreak_minutes: self.session.microbreak_minutes,
        }
    }

    /// Default session strategy from the session section.
    pub fn strategy(&self) -> SessionStrategy {
        SessionStrategy {
            interleave: self.session.interleave,
            microbreaks: self.session.microbreaks,
        }
    }
}
