use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One hour of the day-ahead forecast, in real (denormalized) units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    /// Hour offset from now, 1..=24.
    pub hour: u32,
    #[serde(rename = "total_hvac")]
    pub hvac: f64,
    #[serde(rename = "total_lighting")]
    pub lighting: f64,
    #[serde(rename = "total_mels")]
    pub mels: f64,
}

impl ForecastEntry {
    pub fn from_triple(hour: u32, values: [f64; 3]) -> Self {
        Self {
            hour,
            hvac: values[0],
            lighting: values[1],
            mels: values[2],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayAheadForecast {
    pub generated_at: DateTime<Utc>,
    pub forecast: Vec<ForecastEntry>,
}
