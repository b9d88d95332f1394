use anyhow::{bail, Result};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::{net::SocketAddr, time::Duration};

use crate::forecast::{Bounds, ForecastError, NormalizationBounds, HORIZON_HOURS};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub db: DbConfig,
    pub predictor: PredictorConfig,
    pub forecast: ForecastConfig,
    pub normalization: NormalizationConfig,
    pub analytics: AnalyticsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub enable_cors: bool,
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5003,
            enable_cors: true,
            request_timeout_secs: 300,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Postgres settings; only read when built with the `db` feature.
/// An empty url keeps the in-memory store.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PredictorConfig {
    pub base_url: String,
    pub path: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    /// Upper bound of the backoff between retries.
    pub retry_backoff_secs: u64,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5005".to_string(),
            path: "/predict".to_string(),
            timeout_secs: 10,
            max_retries: 0,
            retry_backoff_secs: 1,
        }
    }
}

impl PredictorConfig {
    pub fn endpoint(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.path.trim_start_matches('/')
        )
    }

    /// Timeout of a single HTTP attempt.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_secs(self.retry_backoff_secs.max(1))
    }

    /// Budget for one forecast step: every attempt may run to its timeout,
    /// with a full backoff between attempts.
    pub fn step_timeout(&self) -> Duration {
        self.timeout() * (self.max_retries + 1) + self.retry_backoff() * self.max_retries
    }
}

/// What to do with a stored reading that lacks one of the load categories
/// when it is pulled into a forecast window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingCategoryPolicy {
    /// Treat the missing category as 0.0.
    #[default]
    Zero,
    /// Fail the forecast with `ForecastError::IncompleteReading`.
    Reject,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub missing_category: MissingCategoryPolicy,
}

/// Raw per-category bounds as written in config. Validated into
/// [`NormalizationBounds`] by [`Config::bounds`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NormalizationConfig {
    pub hvac: Bounds,
    pub lighting: Bounds,
    pub mels: Bounds,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            hvac: Bounds { min: 0.0, max: 500.0 },
            lighting: Bounds { min: 0.0, max: 250.0 },
            mels: Bounds { min: 0.0, max: 150.0 },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// A value is a peak when it exceeds `peak_factor` times the mean.
    pub peak_factor: f64,
    pub high_hvac_threshold: f64,
    pub recent_limit: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            peak_factor: 1.5,
            high_hvac_threshold: 100.0,
            recent_limit: 50,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let figment = Figment::new()
            .merge(Toml::file("config/default.toml"))
            .merge(Env::prefixed("IEM__").split("__"));
        let cfg: Config = figment.extract()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject settings that would only fail at request time: degenerate
    /// bounds, or a request timeout shorter than a full day-ahead chain.
    pub fn validate(&self) -> Result<()> {
        self.bounds()?;

        let chain_budget = self.predictor.step_timeout() * HORIZON_HOURS;
        if self.server.request_timeout() < chain_budget {
            bail!(
                "server.request_timeout_secs ({}) is shorter than a day-ahead chain can take \
                 ({} steps x {:?} = {:?}); raise it or lower predictor.timeout_secs",
                self.server.request_timeout_secs,
                HORIZON_HOURS,
                self.predictor.step_timeout(),
                chain_budget
            );
        }
        Ok(())
    }

    pub fn bounds(&self) -> Result<NormalizationBounds, ForecastError> {
        NormalizationBounds::new(
            self.normalization.hvac,
            self.normalization.lighting,
            self.normalization.mels,
        )
    }
}
