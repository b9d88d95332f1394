//! Usage aggregation for the dashboard: per-category totals, peak readings
//! and hourly HVAC trends.

use chrono::{DateTime, Timelike, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::{
    config::AnalyticsConfig,
    domain::{LoadCategory, Reading},
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CategoryStat {
    pub total: f64,
    pub mean: f64,
}

impl CategoryStat {
    fn from_values(values: impl Iterator<Item = f64>) -> Self {
        let (total, count) = values.fold((0.0, 0usize), |(t, n), v| (t + v, n + 1));
        let mean = if count == 0 { 0.0 } else { total / count as f64 };
        Self { total, mean }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CategoryTotals {
    pub hvac: CategoryStat,
    pub lighting: CategoryStat,
    pub mels: CategoryStat,
    pub overall: CategoryStat,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UsagePoint {
    pub timestamp: DateTime<Utc>,
    pub usage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trend {
    pub title: String,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hour: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UsageSummary {
    pub reading_count: usize,
    pub categories: CategoryTotals,
    pub peaks: Vec<UsagePoint>,
    pub trends: Vec<Trend>,
}

/// Sum and mean per category. Missing categories count as zero.
pub fn category_totals(readings: &[Reading]) -> CategoryTotals {
    let stat = |c: LoadCategory| {
        CategoryStat::from_values(readings.iter().map(|r| r.loads.get(c).unwrap_or(0.0)))
    };
    CategoryTotals {
        hvac: stat(LoadCategory::Hvac),
        lighting: stat(LoadCategory::Lighting),
        mels: stat(LoadCategory::Mels),
        overall: CategoryStat::from_values(readings.iter().map(|r| r.loads.total())),
    }
}

/// Readings whose total usage exceeds `factor` times the mean, oldest first.
pub fn find_peaks(readings: &[Reading], factor: f64) -> Vec<UsagePoint> {
    if readings.is_empty() {
        return Vec::new();
    }
    let mean = category_totals(readings).overall.mean;
    let threshold = mean * factor;

    let mut peaks: Vec<UsagePoint> = readings
        .iter()
        .map(|r| UsagePoint {
            timestamp: r.timestamp,
            usage: r.loads.total(),
        })
        .filter(|p| p.usage > threshold)
        .collect();
    peaks.sort_by_key(|p| p.timestamp);
    peaks
}

/// HVAC usage grouped by UTC hour of day.
pub fn hvac_by_hour(readings: &[Reading]) -> BTreeMap<u32, f64> {
    let mut hourly = BTreeMap::new();
    for r in readings {
        *hourly.entry(r.timestamp.hour()).or_insert(0.0) += r.loads.hvac.unwrap_or(0.0);
    }
    hourly
}

/// Power-saving suggestions derived from HVAC usage.
pub fn hvac_trends(readings: &[Reading], cfg: &AnalyticsConfig) -> Vec<Trend> {
    let mut trends = Vec::new();

    let total_hvac = category_totals(readings).hvac.total;
    if total_hvac > cfg.high_hvac_threshold {
        trends.push(Trend {
            title: "High HVAC energy usage detected".to_string(),
            action: "Consider optimizing HVAC settings during off-peak hours.".to_string(),
            hour: None,
            usage: Some(total_hvac),
        });
    }

    let hourly = hvac_by_hour(readings);
    if hourly.is_empty() {
        return trends;
    }
    let mean = hourly.values().sum::<f64>() / hourly.len() as f64;
    let threshold = mean * cfg.peak_factor;

    trends.extend(
        hourly
            .into_iter()
            .filter(|(_, usage)| *usage > threshold)
            .map(|(hour, usage)| Trend {
                title: "High HVAC usage detected".to_string(),
                action: format!(
                    "Consider optimizing HVAC settings during peak hours (Hour: {:02}).",
                    hour
                ),
                hour: Some(hour),
                usage: Some(usage),
            }),
    );
    trends
}

pub fn summarize(readings: &[Reading], cfg: &AnalyticsConfig) -> UsageSummary {
    UsageSummary {
        reading_count: readings.len(),
        categories: category_totals(readings),
        peaks: find_peaks(readings, cfg.peak_factor),
        trends: hvac_trends(readings, cfg),
    }
}
