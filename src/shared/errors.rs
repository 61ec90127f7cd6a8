use thiserror::Error;

use crate::domain::{ExchangeRateError, ScheduleError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config syntax: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid tariff schedule: {0}")]
    Schedule(#[from] ScheduleError),

    #[error("Invalid exchange rate: {0}")]
    ExchangeRate(#[from] ExchangeRateError),

    #[error("Invalid quick amount {0}: must be positive")]
    QuickAmount(rust_decimal::Decimal),
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Backend rejected credentials (401)")]
    Unauthorized,

    #[error("Backend returned {status} for {url}")]
    Status { status: u16, url: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl BackendError {
    /// Errors that make further polling pointless.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
