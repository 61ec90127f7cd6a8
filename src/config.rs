//! Configuration module
//!
//! Settings are read from a TOML file (default
//! `~/.config/zetdc-topup/config.toml`). Every section has defaults, so a
//! partial file, or none at all, still yields a usable configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::application::services::PricingService;
use crate::domain::{ExchangeRate, TariffSchedule, TariffTier};
use crate::shared::{ConfigError, PollConfig};

/// Default config location under the user's config directory.
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("zetdc-topup")
        .join("config.toml")
}

/// Full application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub pricing: PricingConfig,
    pub backend: BackendConfig,
    pub polling: PollingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Seconds to wait for in-flight requests on shutdown
    pub shutdown_timeout: u64,
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_timeout: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `trace`, `debug`, `info`, `warn` or `error` (or any `EnvFilter` directive)
    pub level: String,
    /// `plain` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "plain".to_string(),
        }
    }
}

/// One cumulative tier as written in the config file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TierConfig {
    #[serde(with = "rust_decimal::serde::float")]
    pub units: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub cumulative_cost: Decimal,
}

impl From<&TierConfig> for TariffTier {
    fn from(t: &TierConfig) -> Self {
        TariffTier::new(t.units, t.cumulative_cost)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PricingConfig {
    /// Currency customers pay in (ISO 4217)
    pub input_currency: String,
    /// Currency the tariff is billed in (ISO 4217)
    pub billing_currency: String,
    /// Billing currency per one unit of input currency
    #[serde(with = "rust_decimal::serde::float")]
    pub exchange_rate: Decimal,
    /// Whole input-currency amounts offered as one-click purchases
    pub quick_amounts: Vec<u32>,
    pub tiers: Vec<TierConfig>,
}

impl PricingConfig {
    pub fn schedule(&self) -> Result<TariffSchedule, ConfigError> {
        let tiers = self.tiers.iter().map(TariffTier::from).collect();
        Ok(TariffSchedule::new(tiers)?)
    }

    pub fn rate(&self) -> Result<ExchangeRate, ConfigError> {
        Ok(ExchangeRate::new(self.exchange_rate)?)
    }

    pub fn quick_amounts(&self) -> Result<Vec<Decimal>, ConfigError> {
        self.quick_amounts
            .iter()
            .map(|&a| {
                if a == 0 {
                    Err(ConfigError::QuickAmount(Decimal::ZERO))
                } else {
                    Ok(Decimal::from(a))
                }
            })
            .collect()
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        // ZETDC domestic tariff, cumulative ZWG cost per kWh band
        let table: [(i64, i64); 14] = [
            (50, 10700),
            (100, 22750),
            (150, 44150),
            (200, 65550),
            (250, 96300),
            (300, 127050),
            (350, 160500),
            (400, 193950),
            (450, 243298),
            (500, 280266),
            (600, 354202),
            (700, 428138),
            (800, 502074),
            (900, 576011),
        ];

        Self {
            input_currency: "USD".to_string(),
            billing_currency: "ZWG".to_string(),
            exchange_rate: Decimal::new(923, 2),
            quick_amounts: vec![5, 10, 20, 50, 100],
            tiers: table
                .iter()
                .map(|&(units, cents)| TierConfig {
                    units: Decimal::from(units),
                    cumulative_cost: Decimal::new(cents, 2),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the top-up REST API, e.g. `https://api.example.com/api`
    pub base_url: String,
    /// Bearer token for authenticated calls
    pub token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".to_string(),
            token: None,
            timeout_secs: 15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PollingConfig {
    pub manual_interval_ms: u64,
    pub manual_max_attempts: u32,
    pub auto_interval_ms: u64,
    pub auto_max_attempts: u32,
}

impl PollingConfig {
    pub fn manual(&self) -> PollConfig {
        PollConfig::new(
            Duration::from_millis(self.manual_interval_ms),
            self.manual_max_attempts,
        )
    }

    pub fn auto(&self) -> PollConfig {
        PollConfig::new(
            Duration::from_millis(self.auto_interval_ms),
            self.auto_max_attempts,
        )
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            manual_interval_ms: 2000,
            manual_max_attempts: 10,
            auto_interval_ms: 1000,
            auto_max_attempts: 20,
        }
    }
}

impl AppConfig {
    /// Load configuration from `path`, writing the defaults there if the
    /// file does not exist yet.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let config = Self::default();
            match config.save(path) {
                Ok(()) => info!("Wrote default configuration to {}", path.display()),
                Err(e) => warn!("Could not write default configuration: {}", e),
            }
            return Ok(config);
        }

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let body = toml::to_string_pretty(self)?;
        std::fs::write(path, body).map_err(io_err)
    }

    /// Validate the pricing section and build the service around it.
    pub fn pricing_service(&self) -> Result<PricingService, ConfigError> {
        Ok(PricingService::new(
            self.pricing.schedule()?,
            self.pricing.rate()?,
            self.pricing.quick_amounts()?,
            &self.pricing.input_currency,
            &self.pricing.billing_currency,
        ))
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ScheduleError;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("zetdc-topup-{}-{}", name, std::process::id()))
            .join("config.toml")
    }

    #[test]
    fn default_config_builds_pricing_service() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.pricing.tiers.len(), 14);
        let service = cfg.pricing_service().unwrap();
        assert_eq!(service.estimate(Decimal::new(2000, 2)), Some(82));
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let cfg = AppConfig::from_toml(
            r#"
            [server]
            port = 9100

            [logging]
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.server.port, 9100);
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.logging.format, "json");
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.pricing, PricingConfig::default());
    }

    #[test]
    fn custom_tiers_are_parsed() {
        let cfg = AppConfig::from_toml(
            r#"
            [pricing]
            exchange_rate = 10
            quick_amounts = [1, 2]

            [[pricing.tiers]]
            units = 10
            cumulative_cost = 20.5

            [[pricing.tiers]]
            units = 20
            cumulative_cost = 45.0
            "#,
        )
        .unwrap();

        assert_eq!(cfg.pricing.exchange_rate, Decimal::from(10));
        assert_eq!(cfg.pricing.tiers[0].cumulative_cost, Decimal::new(205, 1));
        let schedule = cfg.pricing.schedule().unwrap();
        assert_eq!(schedule.tiers().len(), 2);
    }

    #[test]
    fn invalid_schedule_is_rejected_at_startup() {
        let mut cfg = AppConfig::default();
        cfg.pricing.tiers[1].units = cfg.pricing.tiers[0].units;

        match cfg.pricing_service() {
            Err(ConfigError::Schedule(ScheduleError::ZeroWidthTier { index })) => {
                assert_eq!(index, 1)
            }
            other => panic!("expected zero-width error, got {other:?}"),
        }
    }

    #[test]
    fn invalid_rate_and_quick_amounts_are_rejected() {
        let mut cfg = AppConfig::default();
        cfg.pricing.exchange_rate = Decimal::ZERO;
        assert!(matches!(
            cfg.pricing_service(),
            Err(ConfigError::ExchangeRate(_))
        ));

        let mut cfg = AppConfig::default();
        cfg.pricing.quick_amounts = vec![5, 0];
        assert!(matches!(
            cfg.pricing_service(),
            Err(ConfigError::QuickAmount(_))
        ));
    }

    #[test]
    fn load_writes_defaults_then_round_trips() {
        let path = temp_path("roundtrip");
        let _ = std::fs::remove_file(&path);

        let first = AppConfig::load(&path).unwrap();
        assert!(path.exists());
        assert_eq!(first, AppConfig::default());

        let mut changed = first.clone();
        changed.server.port = 9999;
        changed.backend.token = Some("secret".into());
        changed.save(&path).unwrap();

        let reloaded = AppConfig::load(&path).unwrap();
        assert_eq!(reloaded, changed);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn polling_sections_convert_to_poll_configs() {
        let polling = PollingConfig::default();
        assert_eq!(polling.manual().max_attempts, 10);
        assert_eq!(polling.manual().interval, Duration::from_secs(2));
        assert_eq!(polling.auto().budget(), Duration::from_secs(20));
    }
}
