//! Storage for sensors and readings.
//!
//! Handlers and the forecaster only see the repository traits. The
//! in-memory store is always available; Postgres comes with the `db`
//! feature.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::{
    config::Config,
    domain::{Reading, ReadingUpdate, Sensor, SensorUpdate},
};

pub mod memory;
#[cfg(feature = "db")]
pub mod pg;

pub use memory::MemoryStore;
#[cfg(feature = "db")]
pub use pg::PgStore;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(String),
}

#[cfg(feature = "db")]
impl From<sqlx::Error> for RepoError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::RowNotFound => RepoError::NotFound("row".to_string()),
            other => RepoError::Database(other.to_string()),
        }
    }
}

pub type RepoResult<T> = Result<T, RepoError>;

#[async_trait]
pub trait ReadingRepository: Send + Sync {
    async fn insert_reading(&self, reading: Reading) -> RepoResult<Reading>;

    async fn get_reading(&self, id: Uuid) -> RepoResult<Option<Reading>>;

    /// Returns the updated reading, or `None` when `id` is unknown.
    async fn update_reading(&self, id: Uuid, update: &ReadingUpdate)
        -> RepoResult<Option<Reading>>;

    /// Returns whether a reading was removed.
    async fn delete_reading(&self, id: Uuid) -> RepoResult<bool>;

    /// The `limit` most recent readings, newest first.
    async fn latest(&self, limit: usize) -> RepoResult<Vec<Reading>>;

    /// Readings with `start <= timestamp <= end`, oldest first.
    async fn range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> RepoResult<Vec<Reading>>;
}

#[async_trait]
pub trait SensorRepository: Send + Sync {
    async fn insert_sensor(&self, sensor: Sensor) -> RepoResult<Sensor>;

    async fn get_sensor(&self, id: Uuid) -> RepoResult<Option<Sensor>>;

    async fn list_sensors(&self) -> RepoResult<Vec<Sensor>>;

    async fn update_sensor(&self, id: Uuid, update: &SensorUpdate) -> RepoResult<Option<Sensor>>;

    async fn delete_sensor(&self, id: Uuid) -> RepoResult<bool>;
}

/// The store handles shared by the HTTP layer.
#[derive(Clone)]
pub struct Repositories {
    pub readings: Arc<dyn ReadingRepository>,
    pub sensors: Arc<dyn SensorRepository>,
}

impl Repositories {
    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            readings: store.clone(),
            sensors: store,
        }
    }

    pub async fn new(cfg: &Config) -> anyhow::Result<Self> {
        #[cfg(feature = "db")]
        {
            if !cfg.db.url.is_empty() {
                let store = Arc::new(PgStore::connect(&cfg.db).await?);
                info!("using postgres store");
                return Ok(Self {
                    readings: store.clone(),
                    sensors: store,
                });
            }
        }

        let _ = cfg;
        info!("using in-memory store");
        Ok(Self::in_memory())
    }
}
