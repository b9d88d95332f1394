use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A registered IoT sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sensor {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub sensor_type: String,
    pub location: String,
    pub installed_at: DateTime<Utc>,
}

/// Body of `POST /api/sensors`
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewSensor {
    #[serde(rename = "type")]
    #[validate(length(min = 1, message = "type is required"))]
    pub sensor_type: String,
    #[validate(length(min = 1, message = "location is required"))]
    pub location: String,
}

impl NewSensor {
    pub fn into_sensor(self, now: DateTime<Utc>) -> Sensor {
        Sensor {
            id: Uuid::new_v4(),
            sensor_type: self.sensor_type,
            location: self.location,
            installed_at: now,
        }
    }
}

/// Body of `PUT /api/sensors/:id`
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct SensorUpdate {
    #[serde(rename = "type")]
    #[validate(length(min = 1))]
    pub sensor_type: Option<String>,
    #[validate(length(min = 1))]
    pub location: Option<String>,
}

impl SensorUpdate {
    pub fn apply(&self, sensor: &mut Sensor) {
        if let Some(t) = &self.sensor_type {
            sensor.sensor_type = t.clone();
        }
        if let Some(l) = &self.location {
            sensor.location = l.clone();
        }
    }
}
