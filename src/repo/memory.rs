use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ReadingRepository, RepoResult, SensorRepository};
use crate::domain::{Reading, ReadingUpdate, Sensor, SensorUpdate};

/// Readings keyed by id, with a `(timestamp, id)` index so "N most recent"
/// is a reverse walk over an ordered set.
#[derive(Default)]
struct ReadingTable {
    by_id: HashMap<Uuid, Reading>,
    by_time: BTreeSet<(DateTime<Utc>, Uuid)>,
}

impl ReadingTable {
    fn insert(&mut self, reading: Reading) {
        if let Some(old) = self.by_id.remove(&reading.id) {
            self.by_time.remove(&(old.timestamp, old.id));
        }
        self.by_time.insert((reading.timestamp, reading.id));
        self.by_id.insert(reading.id, reading);
    }

    fn remove(&mut self, id: Uuid) -> Option<Reading> {
        let old = self.by_id.remove(&id)?;
        self.by_time.remove(&(old.timestamp, old.id));
        Some(old)
    }
}

/// Process-local store. Backs tests and database-less runs.
#[derive(Default)]
pub struct MemoryStore {
    readings: RwLock<ReadingTable>,
    sensors: RwLock<HashMap<Uuid, Sensor>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReadingRepository for MemoryStore {
    async fn insert_reading(&self, reading: Reading) -> RepoResult<Reading> {
        self.readings.write().await.insert(reading.clone());
        Ok(reading)
    }

    async fn get_reading(&self, id: Uuid) -> RepoResult<Option<Reading>> {
        Ok(self.readings.read().await.by_id.get(&id).cloned())
    }

    async fn update_reading(
        &self,
        id: Uuid,
        update: &ReadingUpdate,
    ) -> RepoResult<Option<Reading>> {
        let mut table = self.readings.write().await;
        let Some(mut reading) = table.remove(id) else {
            return Ok(None);
        };
        update.apply(&mut reading);
        table.insert(reading.clone());
        Ok(Some(reading))
    }

    async fn delete_reading(&self, id: Uuid) -> RepoResult<bool> {
        Ok(self.readings.write().await.remove(id).is_some())
    }

    async fn latest(&self, limit: usize) -> RepoResult<Vec<Reading>> {
        let table = self.readings.read().await;
        Ok(table
            .by_time
            .iter()
            .rev()
            .take(limit)
            .filter_map(|(_, id)| table.by_id.get(id).cloned())
            .collect())
    }

    async fn range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> RepoResult<Vec<Reading>> {
        if end < start {
            return Ok(Vec::new());
        }
        let table = self.readings.read().await;
        let lo = (start, Uuid::nil());
        let hi = (end, Uuid::from_u128(u128::MAX));
        Ok(table
            .by_time
            .range(lo..=hi)
            .filter_map(|(_, id)| table.by_id.get(id).cloned())
            .collect())
    }
}

#[async_trait]
impl SensorRepository for MemoryStore {
    async fn insert_sensor(&self, sensor: Sensor) -> RepoResult<Sensor> {
        self.sensors.write().await.insert(sensor.id, sensor.clone());
        Ok(sensor)
    }

    async fn get_sensor(&self, id: Uuid) -> RepoResult<Option<Sensor>> {
        Ok(self.sensors.read().await.get(&id).cloned())
    }

    async fn list_sensors(&self) -> RepoResult<Vec<Sensor>> {
        let mut sensors: Vec<Sensor> = self.sensors.read().await.values().cloned().collect();
        sensors.sort_by_key(|s| (s.installed_at, s.id));
        Ok(sensors)
    }

    async fn update_sensor(&self, id: Uuid, update: &SensorUpdate) -> RepoResult<Option<Sensor>> {
        let mut sensors = self.sensors.write().await;
        Ok(sensors.get_mut(&id).map(|sensor| {
            update.apply(sensor);
            sensor.clone()
        }))
    }

    async fn delete_sensor(&self, id: Uuid) -> RepoResult<bool> {
        Ok(self.sensors.write().await.remove(&id).is_some())
    }
}
