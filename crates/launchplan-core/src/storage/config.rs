//! TOML-based application configuration.
//!
//! Stores planning preferences including:
//! - Phase lengths per duration category
//! - Workload rates per intensity
//! - The low-energy cycle and its risk window
//!
//! Configuration is stored at `~/.config/launchplan/config.toml`.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::data_dir;
use crate::error::ConfigError;
use crate::phases::{PhaseRules, WorkloadRates};
use crate::planner::PlanningRules;
use crate::risk::{Cycle, RiskWindow};

/// Recurring low-energy cycle settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleConfig {
    /// First day of the current cycle. No cycle is tracked when unset.
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default = "default_cycle_length")]
    pub length_days: u32,
    #[serde(default = "default_risk_window")]
    pub risk_window: RiskWindow,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/launchplan/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub phases: PhaseRules,
    #[serde(default)]
    pub workload: WorkloadRates,
    #[serde(default)]
    pub cycle: CycleConfig,
}

fn default_cycle_length() -> u32 {
    90
}
fn default_risk_window() -> RiskWindow {
    RiskWindow::new("low-energy", 76, 90)
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            start_date: None,
            length_days: default_cycle_length(),
            risk_window: default_risk_window(),
        }
    }
}

impl CycleConfig {
    /// The configured cycle, if a start date is set.
    pub fn cycle(&self) -> Option<Cycle> {
        self.start_date.map(|start_date| Cycle {
            start_date,
            length_days: self.length_days,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            phases: PhaseRules::default(),
            workload: WorkloadRates::default(),
            cycle: CycleConfig::default(),
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

        if key.is_empty() {
            return Err(unknown());
        }

        let mut parts = key.split('.').peekable();
        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;

            let new_value = match existing {
                serde_json::Value::Bool(_) => serde_json::Value::Bool(
                    value
                        .parse::<bool>()
                        .map_err(|e| invalid(e.to_string()))?,
                ),
                serde_json::Value::Number(_) => {
                    if let Ok(n) = value.parse::<u64>() {
                        serde_json::Value::Number(n.into())
                    } else if let Ok(n) = value.parse::<f64>() {
                        serde_json::Number::from_f64(n)
                            .map(serde_json::Value::Number)
                            .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                    } else {
                        return Err(invalid(format!("cannot parse '{value}' as number")));
                    }
                }
                serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                    serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                }
                _ => serde_json::Value::String(value.into()),
            };

            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    fn collect_entries(prefix: &str, value: &serde_json::Value, out: &mut Vec<(String, String)>) {
        match value {
            serde_json::Value::Object(map) => {
                for (k, v) in map {
                    let key = if prefix.is_empty() {
                        k.clone()
                    } else {
                        format!("{prefix}.{k}")
                    };
                    Self::collect_entries(&key, v, out);
                }
            }
            serde_json::Value::String(s) => out.push((prefix.to_string(), s.clone())),
            other => out.push((prefix.to_string(), other.to_string())),
        }
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing defaults there if it is missing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                Ok(cfg)
            }
            Err(_) => {
                debug!(path = %path.display(), "config missing, writing defaults");
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

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
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

    /// All leaf keys with their values, in dot-path form.
    pub fn entries(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        if let Ok(json) = serde_json::to_value(self) {
            Self::collect_entries("", &json, &mut out);
        }
        out
    }

    /// Set a config value by key without saving.
    ///
    /// The updated config is validated as a whole; on error `self` is left
    /// unchanged.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
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

    /// Set a config value by key. Returns error if key is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// the result fails validation, or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
    }

    /// Check every section for values the planners would reject.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let as_config = |err: crate::error::ValidationError| ConfigError::InvalidValue {
            key: err.field().to_string(),
            message: err.to_string(),
        };

        self.phases.validate().map_err(as_config)?;
        self.workload.validate().map_err(as_config)?;

        let reference = Cycle {
            start_date: self.cycle.start_date.unwrap_or(NaiveDate::MIN),
            length_days: self.cycle.length_days,
        };
        reference.validate().map_err(as_config)?;
        self.cycle.risk_window.validate(&reference).map_err(as_config)
    }

    /// Phase and workload tables for the planner.
    pub fn planning_rules(&self) -> PlanningRules {
        PlanningRules {
            phases: self.phases.clone(),
            workload: self.workload,
        }
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
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
        assert_eq!(parsed.cycle.length_days, 90);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[cycle]\nstart_date = \"2024-01-01\"\n").unwrap();
        assert_eq!(parsed.cycle.length_days, 90);
        assert_eq!(parsed.cycle.risk_window.id, "low-energy");
        assert_eq!(parsed.phases, PhaseRules::default());
        assert!(parsed.cycle.cycle().is_some());
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("phases.standard.runway_days").as_deref(), Some("21"));
        assert_eq!(cfg.get("cycle.risk_window.id").as_deref(), Some("low-energy"));
        assert!(cfg.get("phases.missing_key").is_none());
    }

    #[test]
    fn set_json_value_by_path_updates_nested_number() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        Config::set_json_value_by_path(&mut json, "phases.short.runway_days", "10").unwrap();
        assert_eq!(
            Config::get_json_value_by_path(&json, "phases.short.runway_days").unwrap(),
            &serde_json::Value::Number(10.into())
        );
    }

    #[test]
    fn set_json_value_by_path_updates_nested_string() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        Config::set_json_value_by_path(&mut json, "cycle.risk_window.id", "dip").unwrap();
        assert_eq!(
            Config::get_json_value_by_path(&json, "cycle.risk_window.id").unwrap(),
            &serde_json::Value::String("dip".to_string())
        );
    }

    #[test]
    fn set_json_value_by_path_rejects_unknown_key() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        let result = Config::set_json_value_by_path(&mut json, "workload.nonexistent", "1");
        assert!(matches!(result, Err(ConfigError::UnknownKey(_))));
    }

    #[test]
    fn apply_accepts_fractional_rates() {
        let mut cfg = Config::default();
        cfg.apply("workload.high_hours_per_day", "5.5").unwrap();
        assert_eq!(cfg.workload.high_hours_per_day, 5.5);
    }

    #[test]
    fn apply_sets_optional_start_date() {
        let mut cfg = Config::default();
        cfg.apply("cycle.start_date", "2024-01-01").unwrap();
        let cycle = cfg.cycle.cycle().unwrap();
        assert_eq!(cycle.start_date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }

    #[test]
    fn apply_rejects_window_outside_cycle_and_keeps_old_value() {
        let mut cfg = Config::default();
        let result = cfg.apply("cycle.risk_window.offset_end_day", "120");
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
        assert_eq!(cfg.cycle.risk_window.offset_end_day, 90);
    }

    #[test]
    fn apply_rejects_negative_length() {
        let mut cfg = Config::default();
        assert!(cfg.apply("phases.standard.runway_days", "-3").is_err());
    }

    #[test]
    fn entries_list_leaf_keys() {
        let entries = Config::default().entries();
        assert!(entries
            .iter()
            .any(|(k, v)| k == "cycle.length_days" && v == "90"));
        assert!(entries.iter().all(|(k, _)| !k.is_empty()));
    }

    #[test]
    fn load_from_writes_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());
    }

    #[test]
    fn load_from_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "phases = 3").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::LoadFailed { .. })
        ));
    }
}
