use serde::{Deserialize, Serialize};

use super::{ForecastError, LoadTriple};
use crate::domain::LoadCategory;

/// Map `value` from `[min, max]` into `[0, 1]`. Caller guarantees `max > min`.
pub fn scale(value: f64, min: f64, max: f64) -> f64 {
    (value - min) / (max - min)
}

/// Inverse of [`scale`].
pub fn unscale(value: f64, min: f64, max: f64) -> f64 {
    value * (max - min) + min
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    fn validate(self, category: LoadCategory) -> Result<Self, ForecastError> {
        if self.min.is_finite() && self.max.is_finite() && self.max > self.min {
            Ok(self)
        } else {
            Err(ForecastError::DegenerateBounds {
                category,
                min: self.min,
                max: self.max,
            })
        }
    }
}

/// Validated per-category scaling bounds. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizationBounds {
    per_category: [Bounds; 3],
}

impl NormalizationBounds {
    pub fn new(hvac: Bounds, lighting: Bounds, mels: Bounds) -> Result<Self, ForecastError> {
        Ok(Self {
            per_category: [
                hvac.validate(LoadCategory::Hvac)?,
                lighting.validate(LoadCategory::Lighting)?,
                mels.validate(LoadCategory::Mels)?,
            ],
        })
    }

    pub fn get(&self, category: LoadCategory) -> Bounds {
        self.per_category[category.index()]
    }

    pub fn scale(&self, category: LoadCategory, value: f64) -> f64 {
        let b = self.get(category);
        scale(value, b.min, b.max)
    }

    pub fn unscale(&self, category: LoadCategory, value: f64) -> f64 {
        let b = self.get(category);
        unscale(value, b.min, b.max)
    }

    pub fn scale_row(&self, row: LoadTriple) -> LoadTriple {
        LoadCategory::ALL.map(|c| self.scale(c, row[c.index()]))
    }

    pub fn unscale_row(&self, row: LoadTriple) -> LoadTriple {
        LoadCategory::ALL.map(|c| self.unscale(c, row[c.index()]))
    }
}

impl Default for NormalizationBounds {
    fn default() -> Self {
        Self {
            per_category: [
                Bounds { min: 0.0, max: 500.0 },
                Bounds { min: 0.0, max: 250.0 },
                Bounds { min: 0.0, max: 150.0 },
            ],
        }
    }
}
