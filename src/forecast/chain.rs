use chrono::Utc;
use std::{sync::Arc, time::Duration};
use tracing::{debug, info, warn};

use super::{
    load_window, ForecastError, LoadTriple, NormalizationBounds, Predictor, Window, HORIZON_HOURS,
};
use crate::{
    config::MissingCategoryPolicy,
    domain::{DayAheadForecast, ForecastEntry},
    repo::ReadingRepository,
};

/// Chains single-step predictions into a day-ahead forecast.
pub struct ForecastChainer {
    predictor: Arc<dyn Predictor>,
    bounds: NormalizationBounds,
    policy: MissingCategoryPolicy,
    step_timeout: Duration,
}

impl ForecastChainer {
    pub fn new(
        predictor: Arc<dyn Predictor>,
        bounds: NormalizationBounds,
        policy: MissingCategoryPolicy,
        step_timeout: Duration,
    ) -> Self {
        Self {
            predictor,
            bounds,
            policy,
            step_timeout,
        }
    }

    /// One prediction call, bounded by the step timeout.
    async fn predict_step(&self, window: &Window) -> Result<LoadTriple, ForecastError> {
        match tokio::time::timeout(self.step_timeout, self.predictor.predict(window)).await {
            Ok(result) => result,
            Err(_) => Err(ForecastError::UpstreamUnavailable(format!(
                "prediction timed out after {:?}",
                self.step_timeout
            ))),
        }
    }

    /// Run the chain over `window`, consuming it.
    ///
    /// Any failed step aborts the whole chain: later hours depend on every
    /// earlier one, so no partial forecast is returned.
    pub async fn run(&self, mut window: Window) -> Result<Vec<ForecastEntry>, ForecastError> {
        let mut entries = Vec::with_capacity(HORIZON_HOURS as usize);

        for hour in 1..=HORIZON_HOURS {
            let predicted = match self.predict_step(&window).await {
                Ok(row) => row,
                Err(e) => {
                    warn!(step = hour, error = %e, "forecast chain aborted");
                    return Err(e);
                }
            };
            debug!(step = hour, ?predicted, "prediction step");

            entries.push(ForecastEntry::from_triple(
                hour,
                self.bounds.unscale_row(predicted),
            ));
            // Feed back the normalized row, never the denormalized output.
            window.slide(predicted);
        }

        Ok(entries)
    }

    /// Load the current window from `store` and run the full chain.
    pub async fn day_ahead(
        &self,
        store: &dyn ReadingRepository,
    ) -> Result<DayAheadForecast, ForecastError> {
        let window = load_window(store, &self.bounds, self.policy).await?;
        let forecast = self.run(window).await?;
        info!(hours = forecast.len(), "day-ahead forecast generated");
        Ok(DayAheadForecast {
            generated_at: Utc::now(),
            forecast,
        })
    }

    /// Predict only the next hour from the current window.
    pub async fn next_hour(
        &self,
        store: &dyn ReadingRepository,
    ) -> Result<ForecastEntry, ForecastError> {
        let window = load_window(store, &self.bounds, self.policy).await?;
        let predicted = self.predict_step(&window).await?;
        Ok(ForecastEntry::from_triple(1, self.bounds.unscale_row(predicted)))
    }
}
