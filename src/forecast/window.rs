use std::collections::VecDeque;

use super::{ForecastError, LoadTriple, NormalizationBounds, WINDOW_LEN};
use crate::{
    config::MissingCategoryPolicy,
    domain::{LoadCategory, Reading},
    repo::ReadingRepository,
};

/// The sliding sequence of normalized rows sent to the prediction service,
/// oldest first. Always exactly [`WINDOW_LEN`] rows long.
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    rows: VecDeque<LoadTriple>,
}

impl Window {
    /// Build a window from normalized rows, oldest first. Only the newest
    /// [`WINDOW_LEN`] rows are kept.
    pub fn from_rows(rows: Vec<LoadTriple>) -> Result<Self, ForecastError> {
        if rows.len() < WINDOW_LEN {
            return Err(ForecastError::InsufficientData {
                required: WINDOW_LEN,
                available: rows.len(),
            });
        }
        let mut rows = VecDeque::from(rows);
        while rows.len() > WINDOW_LEN {
            rows.pop_front();
        }
        Ok(Self { rows })
    }

    /// Drop the oldest row and append `row` as the newest.
    pub fn slide(&mut self, row: LoadTriple) {
        self.rows.pop_front();
        self.rows.push_back(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = &LoadTriple> {
        self.rows.iter()
    }

    pub fn newest(&self) -> Option<&LoadTriple> {
        self.rows.back()
    }

    /// Shape `(1, WINDOW_LEN, 3)`, the single-batch tensor the model expects.
    pub fn to_batch(&self) -> [[LoadTriple; WINDOW_LEN]; 1] {
        let mut batch = [[0.0; 3]; WINDOW_LEN];
        for (slot, row) in batch.iter_mut().zip(self.rows.iter()) {
            *slot = *row;
        }
        [batch]
    }
}

/// Raw (unscaled) row for one reading under the missing-category policy.
pub fn reading_row(
    reading: &Reading,
    policy: MissingCategoryPolicy,
) -> Result<LoadTriple, ForecastError> {
    if policy == MissingCategoryPolicy::Reject && !reading.loads.is_complete() {
        return Err(ForecastError::IncompleteReading { id: reading.id });
    }
    Ok(LoadCategory::ALL.map(|c| reading.loads.get(c).unwrap_or(0.0)))
}

/// Load the current window from the store: newest readings first from the
/// store, reversed to oldest first, then scaled per category.
pub async fn load_window(
    store: &dyn ReadingRepository,
    bounds: &NormalizationBounds,
    policy: MissingCategoryPolicy,
) -> Result<Window, ForecastError> {
    let mut readings = store.latest(WINDOW_LEN).await?;
    if readings.len() < WINDOW_LEN {
        return Err(ForecastError::InsufficientData {
            required: WINDOW_LEN,
            available: readings.len(),
        });
    }
    readings.reverse();

    let rows = readings
        .iter()
        .map(|r| reading_row(r, policy).map(|row| bounds.scale_row(row)))
        .collect::<Result<Vec<_>, _>>()?;

    Window::from_rows(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LoadBreakdown;
    use crate::repo::MemoryStore;
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    fn reading(hour: i64, hvac: f64) -> Reading {
        Reading {
            id: Uuid::new_v4(),
            sensor_id: 1,
            timestamp: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap() + Duration::hours(hour),
            loads: LoadBreakdown::new(hvac, 25.0, 15.0),
        }
    }

    #[test]
    fn test_slide_keeps_length() {
        let mut w = Window::from_rows(vec![[0.1; 3]; WINDOW_LEN]).unwrap();
        w.slide([0.9, 0.8, 0.7]);
        assert_eq!(w.len(), WINDOW_LEN);
        assert_eq!(w.newest(), Some(&[0.9, 0.8, 0.7]));
        assert_eq!(w.to_batch()[0][WINDOW_LEN - 1], [0.9, 0.8, 0.7]);
    }

    #[test]
    fn test_from_rows_rejects_short_and_trims_long() {
        assert!(matches!(
            Window::from_rows(vec![[0.0; 3]; 7]),
            Err(ForecastError::InsufficientData { required: 8, available: 7 })
        ));
        let mut rows = vec![[0.0; 3]; 9];
        rows[8] = [1.0; 3];
        let w = Window::from_rows(rows).unwrap();
        assert_eq!(w.len(), WINDOW_LEN);
        assert_eq!(w.newest(), Some(&[1.0; 3]));
    }

    #[test]
    fn test_missing_category_policy() {
        let mut r = reading(0, 10.0);
        r.loads.lighting = None;
        assert_eq!(
            reading_row(&r, MissingCategoryPolicy::Zero).unwrap(),
            [10.0, 0.0, 15.0]
        );
        assert!(matches!(
            reading_row(&r, MissingCategoryPolicy::Reject),
            Err(ForecastError::IncompleteReading { id }) if id == r.id
        ));
    }

    #[tokio::test]
    async fn test_load_window_is_oldest_first_and_scaled() {
        let store = MemoryStore::new();
        // Inserted out of order; ten readings, only the newest eight are used.
        for h in [3, 0, 9, 1, 5, 2, 8, 4, 7, 6] {
            store.insert_reading(reading(h, h as f64 * 50.0)).await.unwrap();
        }

        let w = load_window(&store, &NormalizationBounds::default(), MissingCategoryPolicy::Zero)
            .await
            .unwrap();

        let hvac: Vec<f64> = w.rows().map(|r| r[0]).collect();
        let expected: Vec<f64> = (2..10).map(|h| h as f64 * 50.0 / 500.0).collect();
        assert_eq!(hvac, expected);
        assert!(w.rows().all(|r| (r[1] - 0.1).abs() < 1e-12 && (r[2] - 0.1).abs() < 1e-12));
    }

    #[tokio::test]
    async fn test_load_window_insufficient_data() {
        let store = MemoryStore::new();
        for h in 0..7 {
            store.insert_reading(reading(h, 10.0)).await.unwrap();
        }
        let err = load_window(&store, &NormalizationBounds::default(), MissingCategoryPolicy::Zero)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ForecastError::InsufficientData { required: 8, available: 7 }
        ));
    }
}
