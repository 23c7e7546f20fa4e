// =============================================================================
// Runtime Configuration: file-backed settings with atomic save
// =============================================================================
//
// Where the instrument feed and the candle payloads live, which underlyings
// are analysed, how much history to request, and the exchange holidays the
// trading calendar should know about.
//
// Persistence uses an atomic tmp + rename pattern.  All fields carry
// `#[serde(default)]` so that adding new fields never breaks loading an
// older config file.
//
// =============================================================================

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::instruments::default_underlyings;
use crate::market_data::HistoryWindows;

pub const ENV_CONFIG_PATH: &str = "AURORA_CONFIG";
pub const ENV_INSTRUMENTS: &str = "AURORA_INSTRUMENTS";
pub const ENV_HISTORY_DIR: &str = "AURORA_HISTORY_DIR";
pub const ENV_UNDERLYINGS: &str = "AURORA_UNDERLYINGS";

pub const DEFAULT_CONFIG_PATH: &str = "runtime_config.json";

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_true() -> bool {
    true
}

fn default_instruments_file() -> PathBuf {
    PathBuf::from("instruments.csv")
}

fn default_history_dir() -> PathBuf {
    PathBuf::from("history")
}

fn default_export_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_daily_days() -> i64 {
    HistoryWindows::default().daily_days
}

fn default_intraday_days() -> i64 {
    HistoryWindows::default().intraday_days
}

// =============================================================================
// HistoryWindowConfig
// =============================================================================

/// Calendar days of history to request per interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryWindowConfig {
    #[serde(default = "default_daily_days")]
    pub daily_days: i64,

    #[serde(default = "default_intraday_days")]
    pub intraday_days: i64,
}

impl Default for HistoryWindowConfig {
    fn default() -> Self {
        Self {
            daily_days: default_daily_days(),
            intraday_days: default_intraday_days(),
        }
    }
}

impl From<&HistoryWindowConfig> for HistoryWindows {
    fn from(cfg: &HistoryWindowConfig) -> Self {
        Self {
            daily_days: cfg.daily_days.max(1),
            intraday_days: cfg.intraday_days.max(1),
        }
    }
}

// =============================================================================
// RuntimeConfig
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    // --- Universe ------------------------------------------------------------

    /// Underlyings whose derivatives are kept by the instrument load.
    #[serde(default = "default_underlyings")]
    pub underlyings: Vec<String>,

    // --- Inputs --------------------------------------------------------------

    /// Instrument feed CSV.
    #[serde(default = "default_instruments_file")]
    pub instruments_file: PathBuf,

    /// Directory of `<token>_<interval>.json` candle payloads.
    #[serde(default = "default_history_dir")]
    pub history_dir: PathBuf,

    // --- Outputs -------------------------------------------------------------

    /// Where `parsed_instruments_YYYYMMDD.csv` is written.
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,

    #[serde(default = "default_true")]
    pub export_parsed_instruments: bool,

    // --- Calendar & history --------------------------------------------------

    /// Exchange holidays (weekends are always closed).
    #[serde(default)]
    pub holidays: Vec<NaiveDate>,

    #[serde(default)]
    pub history: HistoryWindowConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            underlyings: default_underlyings(),
            instruments_file: default_instruments_file(),
            history_dir: default_history_dir(),
            export_dir: default_export_dir(),
            export_parsed_instruments: true,
            holidays: Vec::new(),
            history: HistoryWindowConfig::default(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;

        info!(
            path = %path.display(),
            underlyings = ?config.underlyings,
            holidays = config.holidays.len(),
            "runtime config loaded"
        );

        Ok(config)
    }

    /// [`load`](Self::load), falling back to defaults with a warning.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            warn!(error = %e, "failed to load config, using defaults");
            Self::default()
        })
    }

    /// Persist the current configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise runtime config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "runtime config saved (atomic)");
        Ok(())
    }

    /// Apply `AURORA_*` environment overrides.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup; empty values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(path) = lookup(ENV_INSTRUMENTS) {
            self.instruments_file = PathBuf::from(path.trim());
        }
        if let Some(dir) = lookup(ENV_HISTORY_DIR) {
            self.history_dir = PathBuf::from(dir.trim());
        }
        if let Some(list) = lookup(ENV_UNDERLYINGS) {
            let underlyings: Vec<String> = list
                .split(',')
                .map(|s| s.trim().to_uppercase())
                .filter(|s| !s.is_empty())
                .collect();
            if !underlyings.is_empty() {
                self.underlyings = underlyings;
            }
        }
        if self.underlyings.is_empty() {
            self.underlyings = default_underlyings();
        }
    }

    pub fn history_windows(&self) -> HistoryWindows {
        HistoryWindows::from(&self.history)
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config_has_expected_values() {
        let cfg = RuntimeConfig::default();
        assert_eq!(cfg.underlyings, vec!["NIFTY", "BANKNIFTY"]);
        assert_eq!(cfg.instruments_file, PathBuf::from("instruments.csv"));
        assert!(cfg.export_parsed_instruments);
        assert!(cfg.holidays.is_empty());
        assert_eq!(cfg.history.daily_days, 400);
        assert_eq!(cfg.history.intraday_days, 7);
    }

    #[test]
    fn deserialise_empty_json_uses_defaults() {
        let cfg: RuntimeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, RuntimeConfig::default());
    }

    #[test]
    fn deserialise_partial_json_fills_defaults() {
        let json = r#"{ "underlyings": ["FINNIFTY"], "holidays": ["2024-03-25"], "history": { "intraday_days": 3 } }"#;
        let cfg: RuntimeConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.underlyings, vec!["FINNIFTY"]);
        assert_eq!(cfg.holidays, vec![NaiveDate::from_ymd_opt(2024, 3, 25).unwrap()]);
        assert_eq!(cfg.history.intraday_days, 3);
        assert_eq!(cfg.history.daily_days, 400);
        assert_eq!(cfg.history_dir, PathBuf::from("history"));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runtime_config.json");

        let mut cfg = RuntimeConfig::default();
        cfg.export_parsed_instruments = false;
        cfg.save(&path).unwrap();

        assert!(!path.with_extension("json.tmp").exists());
        assert_eq!(RuntimeConfig::load(&path).unwrap(), cfg);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg = RuntimeConfig::load_or_default("/nonexistent/runtime_config.json");
        assert_eq!(cfg, RuntimeConfig::default());
    }

    #[test]
    fn overrides_replace_paths_and_underlyings() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_INSTRUMENTS, "/data/instruments.csv"),
            (ENV_UNDERLYINGS, " nifty , , finnifty "),
            (ENV_HISTORY_DIR, "   "),
        ]);
        let mut cfg = RuntimeConfig::default();
        cfg.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(cfg.instruments_file, PathBuf::from("/data/instruments.csv"));
        assert_eq!(cfg.underlyings, vec!["NIFTY", "FINNIFTY"]);
        assert_eq!(cfg.history_dir, PathBuf::from("history"));
    }

    #[test]
    fn empty_underlyings_restored() {
        let mut cfg: RuntimeConfig = serde_json::from_str(r#"{ "underlyings": [] }"#).unwrap();
        cfg.apply_overrides(|_| None);
        assert_eq!(cfg.underlyings, default_underlyings());
    }

    #[test]
    fn history_windows_are_at_least_one_day() {
        let mut cfg = RuntimeConfig::default();
        cfg.history.intraday_days = 0;
        assert_eq!(cfg.history_windows().intraday_days, 1);
    }
}
