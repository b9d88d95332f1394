use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use super::{ReadingRepository, RepoResult, SensorRepository};
use crate::{
    config::DbConfig,
    domain::{LoadBreakdown, Reading, ReadingUpdate, Sensor, SensorUpdate},
};

const SCHEMA: [&str; 3] = [
    r#"
    CREATE TABLE IF NOT EXISTS sensors (
        id UUID PRIMARY KEY,
        sensor_type TEXT NOT NULL,
        location TEXT NOT NULL,
        installed_at TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS energy_data (
        id UUID PRIMARY KEY,
        sensor_id BIGINT NOT NULL,
        timestamp TIMESTAMPTZ NOT NULL,
        total_hvac DOUBLE PRECISION,
        total_lighting DOUBLE PRECISION,
        total_mels DOUBLE PRECISION
    )
    "#,
    "CREATE INDEX IF NOT EXISTS energy_data_timestamp_idx ON energy_data (timestamp DESC)",
];

const READING_COLUMNS: &str = "id, sensor_id, timestamp, total_hvac, total_lighting, total_mels";
const SENSOR_COLUMNS: &str = "id, sensor_type, location, installed_at";

#[derive(Debug, FromRow)]
struct ReadingRow {
    id: Uuid,
    sensor_id: i64,
    timestamp: DateTime<Utc>,
    total_hvac: Option<f64>,
    total_lighting: Option<f64>,
    total_mels: Option<f64>,
}

impl From<ReadingRow> for Reading {
    fn from(row: ReadingRow) -> Self {
        Reading {
            id: row.id,
            sensor_id: row.sensor_id,
            timestamp: row.timestamp,
            loads: LoadBreakdown {
                hvac: row.total_hvac,
                lighting: row.total_lighting,
                mels: row.total_mels,
            },
        }
    }
}

#[derive(Debug, FromRow)]
struct SensorRow {
    id: Uuid,
    sensor_type: String,
    location: String,
    installed_at: DateTime<Utc>,
}

impl From<SensorRow> for Sensor {
    fn from(row: SensorRow) -> Self {
        Sensor {
            id: row.id,
            sensor_type: row.sensor_type,
            location: row.location,
            installed_at: row.installed_at,
        }
    }
}

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect with exponential backoff and make sure the tables exist.
    pub async fn connect(cfg: &DbConfig) -> Result<Self> {
        let max_attempts = 5;
        let mut attempt = 0;
        let mut delay = Duration::from_secs(1);

        let pool = loop {
            attempt += 1;
            let result = PgPoolOptions::new()
                .max_connections(cfg.max_connections)
                .acquire_timeout(Duration::from_secs(30))
                .connect(&cfg.url)
                .await;
            match result {
                Ok(pool) => break pool,
                Err(e) if attempt >= max_attempts => {
                    return Err(e).context(format!(
                        "failed to connect to database after {} attempts",
                        max_attempts
                    ));
                }
                Err(e) => {
                    warn!(attempt, max_attempts, error = %e, ?delay, "database connection failed, retrying");
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
            }
        };

        let store = Self { pool };
        store.ensure_schema().await?;
        info!("database connection pool initialized");
        Ok(store)
    }

    async fn ensure_schema(&self) -> Result<()> {
        for stmt in SCHEMA {
            sqlx::query(stmt)
                .execute(&self.pool)
                .await
                .context("failed to create schema")?;
        }
        Ok(())
    }

    async fn write_reading(&self, reading: &Reading) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO energy_data (id, sensor_id, timestamp, total_hvac, total_lighting, total_mels)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                sensor_id = EXCLUDED.sensor_id,
                timestamp = EXCLUDED.timestamp,
                total_hvac = EXCLUDED.total_hvac,
                total_lighting = EXCLUDED.total_lighting,
                total_mels = EXCLUDED.total_mels
            "#,
        )
        .bind(reading.id)
        .bind(reading.sensor_id)
        .bind(reading.timestamp)
        .bind(reading.loads.hvac)
        .bind(reading.loads.lighting)
        .bind(reading.loads.mels)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ReadingRepository for PgStore {
    async fn insert_reading(&self, reading: Reading) -> RepoResult<Reading> {
        self.write_reading(&reading).await?;
        Ok(reading)
    }

    async fn get_reading(&self, id: Uuid) -> RepoResult<Option<Reading>> {
        let row = sqlx::query_as::<_, ReadingRow>(&format!(
            "SELECT {READING_COLUMNS} FROM energy_data WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Reading::from))
    }

    async fn update_reading(
        &self,
        id: Uuid,
        update: &ReadingUpdate,
    ) -> RepoResult<Option<Reading>> {
        let Some(mut reading) = self.get_reading(id).await? else {
            return Ok(None);
        };
        update.apply(&mut reading);
        self.write_reading(&reading).await?;
        Ok(Some(reading))
    }

    async fn delete_reading(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM energy_data WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn latest(&self, limit: usize) -> RepoResult<Vec<Reading>> {
        let rows = sqlx::query_as::<_, ReadingRow>(&format!(
            "SELECT {READING_COLUMNS} FROM energy_data ORDER BY timestamp DESC, id DESC LIMIT $1"
        ))
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Reading::from).collect())
    }

    async fn range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> RepoResult<Vec<Reading>> {
        let rows = sqlx::query_as::<_, ReadingRow>(&format!(
            "SELECT {READING_COLUMNS} FROM energy_data \
             WHERE timestamp >= $1 AND timestamp <= $2 ORDER BY timestamp ASC, id ASC"
        ))
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Reading::from).collect())
    }
}

#[async_trait]
impl SensorRepository for PgStore {
    async fn insert_sensor(&self, sensor: Sensor) -> RepoResult<Sensor> {
        sqlx::query(
            "INSERT INTO sensors (id, sensor_type, location, installed_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(sensor.id)
        .bind(&sensor.sensor_type)
        .bind(&sensor.location)
        .bind(sensor.installed_at)
        .execute(&self.pool)
        .await?;
        Ok(sensor)
    }

    async fn get_sensor(&self, id: Uuid) -> RepoResult<Option<Sensor>> {
        let row = sqlx::query_as::<_, SensorRow>(&format!(
            "SELECT {SENSOR_COLUMNS} FROM sensors WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Sensor::from))
    }

    async fn list_sensors(&self) -> RepoResult<Vec<Sensor>> {
        let rows = sqlx::query_as::<_, SensorRow>(&format!(
            "SELECT {SENSOR_COLUMNS} FROM sensors ORDER BY installed_at ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Sensor::from).collect())
    }

    async fn update_sensor(&self, id: Uuid, update: &SensorUpdate) -> RepoResult<Option<Sensor>> {
        let row = sqlx::query_as::<_, SensorRow>(&format!(
            "UPDATE sensors SET sensor_type = COALESCE($2, sensor_type), \
             location = COALESCE($3, location) WHERE id = $1 RETURNING {SENSOR_COLUMNS}"
        ))
        .bind(id)
        .bind(update.sensor_type.as_deref())
        .bind(update.location.as_deref())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Sensor::from))
    }

    async fn delete_sensor(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM sensors WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
