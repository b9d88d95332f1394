use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    api::{error::ApiError, response::ApiResponse},
    domain::{NewReading, Reading, ReadingUpdate},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<usize>,
}

/// Inclusive time range. Accepts RFC 3339 timestamps or `YYYY-MM-DD`
/// (midnight UTC).
#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    pub start: Option<String>,
    pub end: Option<String>,
}

impl RangeQuery {
    /// `Ok(None)` when neither bound is given.
    pub fn parse(&self) -> Result<Option<(DateTime<Utc>, DateTime<Utc>)>, ApiError> {
        let (start, end) = match (&self.start, &self.end) {
            (None, None) => return Ok(None),
            (Some(s), Some(e)) => (parse_time(s)?, parse_time(e)?),
            _ => {
                return Err(ApiError::BadRequest(
                    "Both start and end dates are required.".to_string(),
                ))
            }
        };
        if end < start {
            return Err(ApiError::BadRequest(
                "End date must be after start date.".to_string(),
            ));
        }
        Ok(Some((start, end)))
    }
}

fn parse_time(raw: &str) -> Result<DateTime<Utc>, ApiError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid date: {}", raw)))
}

/// GET /api/energy_data - Most recent readings, newest first
pub async fn list_readings(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<ApiResponse<Vec<Reading>>>, ApiError> {
    let limit = q.limit.unwrap_or(state.cfg.analytics.recent_limit);
    let readings = state.repos.readings.latest(limit).await?;
    let total = readings.len();
    Ok(Json(ApiResponse::success(readings).with_count(total)))
}

/// GET /api/energy_data/filter?start=&end= - Readings in a date range
pub async fn filter_readings(
    State(state): State<AppState>,
    Query(q): Query<RangeQuery>,
) -> Result<Json<ApiResponse<Vec<Reading>>>, ApiError> {
    let (start, end) = q.parse()?.ok_or_else(|| {
        ApiError::BadRequest("Both start and end dates are required.".to_string())
    })?;
    let readings = state.repos.readings.range(start, end).await?;
    let total = readings.len();
    Ok(Json(ApiResponse::success(readings).with_count(total)))
}

/// GET /api/energy_data/:id
pub async fn get_reading(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Reading>>, ApiError> {
    let reading = state
        .repos
        .readings
        .get_reading(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Energy data not found".to_string()))?;
    Ok(Json(ApiResponse::success(reading)))
}

/// POST /api/energy_data
pub async fn add_reading(
    State(state): State<AppState>,
    Json(request): Json<NewReading>,
) -> Result<(StatusCode, Json<ApiResponse<Reading>>), ApiError> {
    let reading = state
        .repos
        .readings
        .insert_reading(request.into_reading(Utc::now()))
        .await?;
    tracing::debug!(reading_id = %reading.id, sensor_id = reading.sensor_id, "reading stored");
    Ok((StatusCode::CREATED, Json(ApiResponse::success(reading))))
}

/// PUT /api/energy_data/:id
pub async fn update_reading(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ReadingUpdate>,
) -> Result<Json<ApiResponse<Reading>>, ApiError> {
    let reading = state
        .repos
        .readings
        .update_reading(id, &request)
        .await?
        .ok_or_else(|| ApiError::NotFound("Energy data not found".to_string()))?;
    Ok(Json(ApiResponse::success(reading)))
}

/// DELETE /api/energy_data/:id
pub async fn delete_reading(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    if !state.repos.readings.delete_reading(id).await? {
        return Err(ApiError::NotFound("Energy data not found".to_string()));
    }
    Ok(Json(ApiResponse::success(
        json!({ "message": "Energy data deleted successfully" }),
    )))
}
