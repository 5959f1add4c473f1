//! Configuration management
//!
//! Settings live in `settings.json` in the data directory:
//! ```json
//! {
//!   "timelock": { "minDelaySecs": 86400, "maxDelaySecs": 172800 },
//!   "units": { "decimals": 18, "symbol": "ETH" }
//! }
//! ```
//! Keys this crate does not manage are preserved on save.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::amount::MAX_DECIMALS;
use crate::domain::result::{Error, Result};
use crate::domain::TimelockPolicy;

pub const SETTINGS_FILE: &str = "settings.json";

pub const ENV_MIN_DELAY: &str = "STRONGBOX_MIN_DELAY_SECS";
pub const ENV_MAX_DELAY: &str = "STRONGBOX_MAX_DELAY_SECS";

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    timelock: TimelockPolicy,
    #[serde(default)]
    units: UnitSettings,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// How base-unit amounts are shown to humans
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UnitSettings {
    pub decimals: u32,
    pub symbol: String,
}

impl Default for UnitSettings {
    fn default() -> Self {
        Self {
            decimals: 18,
            symbol: "ETH".to_string(),
        }
    }
}

/// Strongbox configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub timelock: TimelockPolicy,
    pub units: UnitSettings,
    // Keep the raw settings for preservation when saving
    _raw_settings: SettingsFile,
}

impl Config {
    /// Load config from the data directory, then apply environment overrides
    pub fn load(data_dir: &Path) -> Result<Self> {
        let mut config = Self::load_file(data_dir)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load settings.json only; a missing file yields defaults
    pub fn load_file(data_dir: &Path) -> Result<Self> {
        let settings_path = data_dir.join(SETTINGS_FILE);

        let raw: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str(&content)
                .map_err(|e| Error::config(format!("{}: {}", settings_path.display(), e)))?
        } else {
            SettingsFile::default()
        };

        Ok(Self {
            timelock: raw.timelock,
            units: raw.units.clone(),
            _raw_settings: raw,
        })
    }

    /// Apply `STRONGBOX_*` overrides from `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_MIN_DELAY) {
            self.timelock.min_delay_secs = parse_secs(ENV_MIN_DELAY, &value)?;
        }
        if let Some(value) = lookup(ENV_MAX_DELAY) {
            self.timelock.max_delay_secs = parse_secs(ENV_MAX_DELAY, &value)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.timelock.validate()?;
        if self.units.decimals > MAX_DECIMALS {
            return Err(Error::config(format!(
                "units.decimals must be at most {}, got {}",
                MAX_DECIMALS, self.units.decimals
            )));
        }
        if self.timelock != TimelockPolicy::default() {
            warn!(
                min = self.timelock.min_delay_secs,
                max = self.timelock.max_delay_secs,
                "using non-default timelock window"
            );
        }
        Ok(())
    }

    /// Save config to the data directory, preserving unmanaged keys
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        let settings_path = data_dir.join(SETTINGS_FILE);

        let mut settings = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str::<SettingsFile>(&content)
                .unwrap_or_else(|_| self._raw_settings.clone())
        } else {
            self._raw_settings.clone()
        };

        settings.timelock = self.timelock;
        settings.units = self.units.clone();

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)?;
        Ok(())
    }
}

fn parse_secs(key: &str, value: &str) -> Result<i64> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| Error::config(format!("{} must be an integer number of seconds", key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_without_file() {
        let dir = tempdir().unwrap();
        let config = Config::load_file(dir.path()).unwrap();
        assert_eq!(config.timelock, TimelockPolicy::default());
        assert_eq!(config.units.decimals, 18);
        assert_eq!(config.units.symbol, "ETH");
    }

    #[test]
    fn test_partial_sections_fill_defaults() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(SETTINGS_FILE),
            r#"{"timelock":{"maxDelaySecs":259200},"units":{"symbol":"WEI"}}"#,
        )
        .unwrap();
        let config = Config::load_file(dir.path()).unwrap();
        assert_eq!(config.timelock.min_delay_secs, 86_400);
        assert_eq!(config.timelock.max_delay_secs, 259_200);
        assert_eq!(config.units.decimals, 18);
        assert_eq!(config.units.symbol, "WEI");
    }

    #[test]
    fn test_save_preserves_unknown_keys() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(SETTINGS_FILE),
            r#"{"units":{"decimals":6,"symbol":"USDC"},"theme":"dark"}"#,
        )
        .unwrap();

        let mut config = Config::load_file(dir.path()).unwrap();
        assert_eq!(config.units.decimals, 6);
        config.timelock = TimelockPolicy::new(60, 120).unwrap();
        config.save(dir.path()).unwrap();

        let saved: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join(SETTINGS_FILE)).unwrap())
                .unwrap();
        assert_eq!(saved["theme"], "dark");
        assert_eq!(saved["timelock"]["minDelaySecs"], 60);
        assert_eq!(saved["units"]["symbol"], "USDC");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_overrides(|key| match key {
                ENV_MIN_DELAY => Some("10".to_string()),
                ENV_MAX_DELAY => Some(" 20 ".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.timelock, TimelockPolicy::new(10, 20).unwrap());

        let bad = config.apply_overrides(|key| (key == ENV_MIN_DELAY).then(|| "soon".to_string()));
        assert!(matches!(bad, Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_inverted_window() {
        let mut config = Config::default();
        config.timelock.min_delay_secs = 100;
        config.timelock.max_delay_secs = 50;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = Config::default();
        config.units.decimals = 40;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(SETTINGS_FILE), "{not json").unwrap();
        assert!(matches!(Config::load_file(dir.path()), Err(Error::Config(_))));
    }
}
