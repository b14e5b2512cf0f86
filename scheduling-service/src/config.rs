use std::path::Path;

use chrono_tz::Tz;
use serde::Deserialize;
use thiserror::Error;

use crate::domain::circuit_breaker::CircuitBreakerConfig;
use crate::infrastructure::health_check::HealthCheckSettings;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
}

/// Process-wide scheduling configuration, loaded once at startup.
///
/// Every labor threshold the engines enforce lives here; nothing is inlined
/// at the call sites.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulingConfig {
    pub max_hours_per_week: f64,
    pub max_hours_per_day: f64,
    pub days_on_per_week: u32,
    pub break_minutes_8hr_shift: i32,
    pub break_minutes_9hr_shift: i32,
    pub store_open_hour: i16,
    pub store_close_hour: i16,
    pub default_orders_per_picker_hour: f64,
    pub default_min_shift_hours: i32,
    pub default_max_shift_hours: i32,
    pub lookback_weeks: u32,
    pub solve_timeout_secs: u64,
    pub preview_timeout_secs: u64,
    pub solver_workers: usize,
    pub min_coverage_percent: f64,
    pub timezone: String,
    pub circuit_breaker: CircuitBreakerConfig,
    pub health_check: HealthCheckSettings,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            max_hours_per_week: 44.0,
            max_hours_per_day: 8.0,
            days_on_per_week: 6,
            break_minutes_8hr_shift: 30,
            break_minutes_9hr_shift: 60,
            store_open_hour: 8,
            store_close_hour: 22,
            default_orders_per_picker_hour: 10.0,
            default_min_shift_hours: 4,
            default_max_shift_hours: 8,
            lookback_weeks: 8,
            solve_timeout_secs: 60,
            preview_timeout_secs: 30,
            solver_workers: 4,
            min_coverage_percent: 0.9,
            timezone: "UTC".to_string(),
            circuit_breaker: CircuitBreakerConfig::default(),
            health_check: HealthCheckSettings::default(),
        }
    }
}

impl SchedulingConfig {
    /// Loads configuration from a TOML file. A missing file yields defaults;
    /// a present but malformed file is an error.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        if !Path::new(path).exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;

        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }

    /// Parsed timezone, falling back to UTC on an unknown name.
    pub fn timezone(&self) -> Tz {
        self.timezone.parse().unwrap_or(Tz::UTC)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_labor_policy() {
        let config = SchedulingConfig::default();
        assert_eq!(config.max_hours_per_week, 44.0);
        assert_eq!(config.max_hours_per_day, 8.0);
        assert_eq!(config.days_on_per_week, 6);
        assert_eq!(config.break_minutes_8hr_shift, 30);
        assert_eq!(config.break_minutes_9hr_shift, 60);
        assert_eq!(config.default_orders_per_picker_hour, 10.0);
    }

    #[test]
    fn parses_partial_toml_with_defaults() {
        let config: SchedulingConfig =
            toml::from_str("max_hours_per_week = 40.0\ntimezone = \"America/New_York\"").unwrap();
        assert_eq!(config.max_hours_per_week, 40.0);
        assert_eq!(config.days_on_per_week, 6);
        assert_eq!(config.timezone(), chrono_tz::America::New_York);
    }

    #[test]
    fn unknown_timezone_falls_back_to_utc() {
        let config = SchedulingConfig {
            timezone: "Mars/Olympus_Mons".into(),
            ..SchedulingConfig::default()
        };
        assert_eq!(config.timezone(), Tz::UTC);
    }
}
