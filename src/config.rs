//! Configuration module
//!
//! Reads `~/.config/bunk-booking/config.toml` (or the path in `BUNK_CONFIG`).
//! Every section and field has a default, so a missing file or a partial
//! file both produce a usable configuration.

use std::path::{Path, PathBuf};

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::domain::{DomainResult, OperatingHours, SlotDuration, SlotGenerator};
use crate::shared::errors::InfraError;

/// Environment variable that overrides the config file location
pub const CONFIG_PATH_ENV: &str = "BUNK_CONFIG";

/// Default config path: `~/.config/bunk-booking/config.toml`
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("bunk-booking")
        .join("config.toml")
}

/// Root application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseSettings,
    pub logging: LoggingConfig,
    pub booking: BookingConfig,
}

/// `[server]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub api_host: String,
    pub api_port: u16,
    /// Seconds to wait for in-flight work on shutdown
    pub shutdown_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_host: "0.0.0.0".to_string(),
            api_port: 8080,
            shutdown_timeout: 30,
        }
    }
}

impl ServerConfig {
    pub fn api_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }
}

/// `[database]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: "sqlite://./bunk-booking.db?mode=rwc".to_string(),
            max_connections: 10,
        }
    }
}

impl DatabaseSettings {
    /// Connection URL. `DATABASE_URL` wins over the file.
    pub fn connection_url(&self) -> String {
        std::env::var("DATABASE_URL").unwrap_or_else(|_| self.url.clone())
    }
}

/// `[logging]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// trace, debug, info, warn, error (or any `EnvFilter` directive)
    pub level: String,
    /// "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// `[booking]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingConfig {
    /// Length of every slot, shared by all stations
    pub slot_duration_minutes: u32,
    pub completion_sweep_interval_secs: u64,
    /// Leave slots that already started out of availability listings
    pub hide_elapsed_slots: bool,
    /// Opening time (`HH:MM`, UTC) for stations created without hours
    pub default_open: String,
    /// Closing time (`HH:MM`, UTC) for stations created without hours
    pub default_close: String,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            slot_duration_minutes: 30,
            completion_sweep_interval_secs: 60,
            hide_elapsed_slots: true,
            default_open: "06:00".to_string(),
            default_close: "22:00".to_string(),
        }
    }
}

impl BookingConfig {
    pub fn slot_duration(&self) -> DomainResult<SlotDuration> {
        SlotDuration::from_minutes(self.slot_duration_minutes)
    }

    pub fn slot_generator(&self) -> DomainResult<SlotGenerator> {
        Ok(SlotGenerator::new(self.slot_duration()?))
    }

    pub fn default_hours(&self) -> Result<OperatingHours, InfraError> {
        let open = parse_hhmm("booking.default_open", &self.default_open)?;
        let close = parse_hhmm("booking.default_close", &self.default_close)?;
        OperatingHours::new(open, close).map_err(|e| InfraError::InvalidConfig(e.to_string()))
    }
}

fn parse_hhmm(field: &str, value: &str) -> Result<NaiveTime, InfraError> {
    NaiveTime::parse_from_str(value, "%H:%M").map_err(|_| {
        InfraError::InvalidConfig(format!("{} must be HH:MM, got '{}'", field, value))
    })
}

impl AppConfig {
    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, InfraError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, InfraError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration as TOML, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), InfraError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = toml::to_string_pretty(self)
            .map_err(|e| InfraError::InvalidConfig(e.to_string()))?;
        std::fs::write(path, raw)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), InfraError> {
        self.booking
            .slot_duration()
            .map_err(|e| InfraError::InvalidConfig(e.to_string()))?;
        if self.booking.completion_sweep_interval_secs == 0 {
            return Err(InfraError::InvalidConfig(
                "booking.completion_sweep_interval_secs must be greater than 0".to_string(),
            ));
        }
        self.booking.default_hours()?;
        if self.database.max_connections == 0 {
            return Err(InfraError::InvalidConfig(
                "database.max_connections must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = AppConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.server.api_port, 8080);
        assert_eq!(cfg.booking.slot_duration().unwrap().minutes(), 30);
        let hours = cfg.booking.default_hours().unwrap();
        assert_eq!(hours.open(), NaiveTime::from_hms_opt(6, 0, 0).unwrap());
        assert_eq!(hours.close(), NaiveTime::from_hms_opt(22, 0, 0).unwrap());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let cfg = AppConfig::from_toml(
            r#"
            [server]
            api_port = 9090

            [booking]
            slot_duration_minutes = 45
            "#,
        )
        .unwrap();
        assert_eq!(cfg.server.api_port, 9090);
        assert_eq!(cfg.server.api_host, "0.0.0.0");
        assert_eq!(cfg.booking.slot_duration_minutes, 45);
        assert_eq!(cfg.booking.completion_sweep_interval_secs, 60);
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn rejects_zero_slot_duration() {
        let err = AppConfig::from_toml("[booking]\nslot_duration_minutes = 0").unwrap_err();
        assert!(matches!(err, InfraError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_inverted_default_hours() {
        let err = AppConfig::from_toml(
            "[booking]\ndefault_open = \"20:00\"\ndefault_close = \"08:00\"",
        )
        .unwrap_err();
        assert!(matches!(err, InfraError::InvalidConfig(_)));

        let err = AppConfig::from_toml("[booking]\ndefault_open = \"8am\"").unwrap_err();
        assert!(err.to_string().contains("booking.default_open"));
    }

    #[test]
    fn rejects_zero_sweep_interval() {
        let err =
            AppConfig::from_toml("[booking]\ncompletion_sweep_interval_secs = 0").unwrap_err();
        assert!(matches!(err, InfraError::InvalidConfig(_)));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = AppConfig::from_toml("[server\napi_port = 1").unwrap_err();
        assert!(matches!(err, InfraError::ConfigParse(_)));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let path = std::env::temp_dir().join("bunk-booking-missing").join("nope.toml");
        let cfg = AppConfig::load(&path).unwrap();
        assert_eq!(cfg.booking.default_open, "06:00");
    }

    #[test]
    fn save_then_load() {
        let dir = std::env::temp_dir().join(format!("bunk-booking-{}", uuid::Uuid::new_v4()));
        let path = dir.join("config.toml");
        let mut cfg = AppConfig::default();
        cfg.booking.slot_duration_minutes = 20;
        cfg.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded.booking.slot_duration_minutes, 20);
        std::fs::remove_dir_all(dir).ok();
    }
}
