use axum::{extract::State, Json};
use serde::Serialize;

use crate::{
    api::{error::ApiError, response::ApiResponse},
    domain::{DayAheadForecast, ForecastEntry},
    state::AppState,
};

/// Next-hour prediction
#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    pub prediction: ForecastEntry,
}

/// POST /api/energy_data/predict - Predict the next hour from the last 8 readings
pub async fn predict_next_hour(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<PredictionResponse>>, ApiError> {
    let prediction = state
        .chainer
        .next_hour(state.repos.readings.as_ref())
        .await?;
    Ok(Json(ApiResponse::success(PredictionResponse { prediction })))
}

/// GET /api/energy_data/day-ahead - 24-hour chained forecast
pub async fn get_day_ahead(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<DayAheadForecast>>, ApiError> {
    let forecast = state
        .chainer
        .day_ahead(state.repos.readings.as_ref())
        .await?;
    Ok(Json(ApiResponse::success(forecast)))
}
