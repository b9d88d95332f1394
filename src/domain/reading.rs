use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// Load category tracked per reading.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LoadCategory {
    Hvac,
    Lighting,
    /// Miscellaneous electric loads
    Mels,
}

impl LoadCategory {
    /// Feature order used by the prediction service: (hvac, lighting, mels).
    pub const ALL: [LoadCategory; 3] = [Self::Hvac, Self::Lighting, Self::Mels];

    pub fn index(self) -> usize {
        match self {
            Self::Hvac => 0,
            Self::Lighting => 1,
            Self::Mels => 2,
        }
    }
}

/// Per-category usage of one reading. A category the sensor did not
/// report stays `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadBreakdown {
    #[serde(rename = "total_hvac", alias = "hvac", default)]
    pub hvac: Option<f64>,
    #[serde(rename = "total_lighting", alias = "lighting", default)]
    pub lighting: Option<f64>,
    #[serde(rename = "total_mels", alias = "mels", default)]
    pub mels: Option<f64>,
}

impl LoadBreakdown {
    pub fn new(hvac: f64, lighting: f64, mels: f64) -> Self {
        Self {
            hvac: Some(hvac),
            lighting: Some(lighting),
            mels: Some(mels),
        }
    }

    pub fn get(&self, category: LoadCategory) -> Option<f64> {
        match category {
            LoadCategory::Hvac => self.hvac,
            LoadCategory::Lighting => self.lighting,
            LoadCategory::Mels => self.mels,
        }
    }

    /// Sum of the reported categories.
    pub fn total(&self) -> f64 {
        LoadCategory::ALL
            .iter()
            .filter_map(|c| self.get(*c))
            .sum()
    }

    pub fn is_complete(&self) -> bool {
        LoadCategory::ALL.iter().all(|c| self.get(*c).is_some())
    }

    /// Overlay the categories present in `patch`.
    pub fn merge(&mut self, patch: &LoadBreakdown) {
        if patch.hvac.is_some() {
            self.hvac = patch.hvac;
        }
        if patch.lighting.is_some() {
            self.lighting = patch.lighting;
        }
        if patch.mels.is_some() {
            self.mels = patch.mels;
        }
    }
}

/// A time-stamped energy reading. Stored append-only, read newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub id: Uuid,
    pub sensor_id: i64,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub loads: LoadBreakdown,
}

/// Body of `POST /api/energy_data`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewReading {
    pub sensor_id: i64,
    /// Defaults to the time of insertion.
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub loads: LoadBreakdown,
}

impl NewReading {
    pub fn into_reading(self, now: DateTime<Utc>) -> Reading {
        Reading {
            id: Uuid::new_v4(),
            sensor_id: self.sensor_id,
            timestamp: self.timestamp.unwrap_or(now),
            loads: self.loads,
        }
    }
}

/// Body of `PUT /api/energy_data/:id`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReadingUpdate {
    pub sensor_id: Option<i64>,
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub loads: LoadBreakdown,
}

impl ReadingUpdate {
    pub fn apply(&self, reading: &mut Reading) {
        if let Some(sensor_id) = self.sensor_id {
            reading.sensor_id = sensor_id;
        }
        if let Some(ts) = self.timestamp {
            reading.timestamp = ts;
        }
        reading.loads.merge(&self.loads);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_reading_json_uses_total_fields() {
        let reading = Reading {
            id: Uuid::nil(),
            sensor_id: 3,
            timestamp: Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap(),
            loads: LoadBreakdown::new(200.0, 100.0, 40.0),
        };
        let json = serde_json::to_value(&reading).unwrap();
        assert_eq!(json["sensor_id"], 3);
        assert_eq!(json["total_hvac"], 200.0);
        assert_eq!(json["total_lighting"], 100.0);
        assert_eq!(json["total_mels"], 40.0);
    }

    #[test]
    fn test_new_reading_accepts_short_names_and_missing_fields() {
        let body = r#"{"sensor_id": 1, "hvac": 12.5, "total_mels": 3.0}"#;
        let new: NewReading = serde_json::from_str(body).unwrap();
        assert_eq!(new.loads.hvac, Some(12.5));
        assert_eq!(new.loads.lighting, None);
        assert_eq!(new.loads.mels, Some(3.0));

        let now = Utc::now();
        let reading = new.into_reading(now);
        assert_eq!(reading.timestamp, now);
        assert!(!reading.loads.is_complete());
        assert_eq!(reading.loads.total(), 15.5);
    }

    #[test]
    fn test_update_only_touches_present_fields() {
        let mut reading = Reading {
            id: Uuid::new_v4(),
            sensor_id: 1,
            timestamp: Utc::now(),
            loads: LoadBreakdown::new(1.0, 2.0, 3.0),
        };
        let update: ReadingUpdate = serde_json::from_str(r#"{"total_lighting": 9.0}"#).unwrap();
        update.apply(&mut reading);
        assert_eq!(reading.sensor_id, 1);
        assert_eq!(reading.loads, LoadBreakdown::new(1.0, 9.0, 3.0));
    }

    #[test]
    fn test_category_parse_and_order() {
        assert_eq!("HVAC".parse::<LoadCategory>().unwrap(), LoadCategory::Hvac);
        assert_eq!(LoadCategory::Mels.to_string(), "mels");
        for (i, c) in LoadCategory::ALL.iter().enumerate() {
            assert_eq!(c.index(), i);
        }
    }
}
