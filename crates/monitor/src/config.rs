//! Service configuration
//!
//! Loaded once at startup from an optional `incubator-monitor.toml` and
//! `INCUBATOR__*` environment variables, e.g.
//! `INCUBATOR__THRESHOLDS__CO2__HIGH=650`.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use config::builder::{ConfigBuilder, DefaultState};
use monitor_lib::config::{AlertThresholds, MonitorConfig};
use monitor_lib::MetricKind;
use serde::{Deserialize, Serialize};

/// Simulated sensor settings
#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    /// Probability that a reading cycle carries a fault scenario
    #[serde(default = "default_critical_probability")]
    pub critical_probability: f64,

    /// Fixed RNG seed for reproducible runs
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            critical_probability: default_critical_probability(),
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Device label attached to logs and metrics
    #[serde(default = "default_device_name")]
    pub device_name: String,

    /// API server port
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    #[serde(default = "default_evaluation_interval")]
    pub evaluation_interval_secs: u64,

    #[serde(default = "default_readings_per_tick")]
    pub readings_per_tick: usize,

    /// Consecutive failed reads before a system failure alert
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    #[serde(default)]
    pub simulation: SimulationConfig,

    #[serde(default)]
    pub thresholds: AlertThresholds,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            device_name: default_device_name(),
            api_port: default_api_port(),
            evaluation_interval_secs: default_evaluation_interval(),
            readings_per_tick: default_readings_per_tick(),
            failure_threshold: default_failure_threshold(),
            simulation: SimulationConfig::default(),
            thresholds: AlertThresholds::default(),
        }
    }
}

/// Lowest-priority source: overriding one bound keeps the other defaults
#[derive(Serialize)]
struct ThresholdDefaults {
    thresholds: AlertThresholds,
}

fn default_device_name() -> String {
    "incubator-1".to_string()
}

fn default_api_port() -> u16 {
    8080
}

fn default_evaluation_interval() -> u64 {
    5
}

fn default_readings_per_tick() -> usize {
    3
}

fn default_failure_threshold() -> u32 {
    3
}

fn default_critical_probability() -> f64 {
    0.2
}

impl AppConfig {
    /// Load configuration from the config file and environment
    pub fn load() -> Result<Self> {
        let config = Self::builder()?
            .add_source(config::File::with_name("incubator-monitor").required(false))
            .add_source(
                config::Environment::with_prefix("INCUBATOR")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read configuration")?;

        let config: Self = config
            .try_deserialize()
            .context("Invalid monitor configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the monitor loop cannot run with
    pub fn validate(&self) -> Result<()> {
        let probability = self.simulation.critical_probability;
        if !(0.0..=1.0).contains(&probability) {
            bail!("simulation.critical_probability must be within [0, 1], got {probability}");
        }
        if self.readings_per_tick == 0 || self.readings_per_tick > MetricKind::ALL.len() {
            bail!(
                "readings_per_tick must be between 1 and {}, got {}",
                MetricKind::ALL.len(),
                self.readings_per_tick
            );
        }
        if self.evaluation_interval_secs == 0 {
            bail!("evaluation_interval_secs must be greater than zero");
        }
        Ok(())
    }

    fn builder() -> Result<ConfigBuilder<DefaultState>> {
        let defaults = ThresholdDefaults {
            thresholds: AlertThresholds::default(),
        };
        let defaults =
            config::Config::try_from(&defaults).context("Failed to build default thresholds")?;

        Ok(config::Config::builder().add_source(defaults))
    }

    pub fn evaluation_interval(&self) -> Duration {
        Duration::from_secs(self.evaluation_interval_secs)
    }

    /// Alerting configuration for the monitor library
    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            thresholds: self.thresholds,
            evaluation_interval: self.evaluation_interval(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_monitor_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.api_port, 8080);
        assert_eq!(config.monitor_config(), MonitorConfig::default());
        assert!(config.simulation.seed.is_none());
    }

    #[test]
    fn test_single_override_keeps_other_defaults() {
        let config: AppConfig = AppConfig::builder()
            .unwrap()
            .set_override("device_name", "bench-incubator")
            .unwrap()
            .set_override("thresholds.co2.high", 650.0)
            .unwrap()
            .set_override("thresholds.temperature.sustained_minutes", 45)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.device_name, "bench-incubator");
        assert_eq!(config.thresholds.co2.high, Some(650.0));
        assert_eq!(config.thresholds.co2.sustained_minutes, 30);
        assert_eq!(config.thresholds.co2.low, None);
        assert_eq!(config.thresholds.temperature.high, Some(40.0));
        assert_eq!(config.thresholds.temperature.low, Some(35.0));
        assert_eq!(config.thresholds.temperature.sustained_minutes, 45);
        assert_eq!(config.readings_per_tick, 3);
        assert!(config.monitor_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_simulation_settings() {
        assert!(AppConfig::default().validate().is_ok());

        for probability in [f64::NAN, f64::INFINITY, -0.1, 1.5] {
            let mut config = AppConfig::default();
            config.simulation.critical_probability = probability;
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains("critical_probability"), "{probability}");
        }

        let mut config = AppConfig::default();
        config.readings_per_tick = 6;
        assert!(config.validate().unwrap_err().to_string().contains("readings_per_tick"));
    }

    #[test]
    fn test_nan_probability_from_source_rejected() {
        let config: AppConfig = AppConfig::builder()
            .unwrap()
            .set_override("simulation.critical_probability", "NaN")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert!(config.simulation.critical_probability.is_nan());
        assert!(config.validate().is_err());
    }
}
