use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;
use validator::Validate;

use crate::{
    api::{error::ApiError, response::ApiResponse},
    domain::{NewSensor, Sensor, SensorUpdate},
    state::AppState,
};

/// GET /api/sensors - List all sensors
pub async fn list_sensors(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Sensor>>>, ApiError> {
    let sensors = state.repos.sensors.list_sensors().await?;
    let total = sensors.len();
    Ok(Json(ApiResponse::success(sensors).with_count(total)))
}

/// GET /api/sensors/:id - Get a sensor by ID
pub async fn get_sensor(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Sensor>>, ApiError> {
    let sensor = state
        .repos
        .sensors
        .get_sensor(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Sensor with ID {} not found", id)))?;
    Ok(Json(ApiResponse::success(sensor)))
}

/// POST /api/sensors - Register a new sensor
pub async fn add_sensor(
    State(state): State<AppState>,
    Json(request): Json<NewSensor>,
) -> Result<(StatusCode, Json<ApiResponse<Sensor>>), ApiError> {
    request.validate()?;
    let sensor = state
        .repos
        .sensors
        .insert_sensor(request.into_sensor(Utc::now()))
        .await?;
    tracing::info!(sensor_id = %sensor.id, sensor_type = %sensor.sensor_type, "sensor added");
    Ok((StatusCode::CREATED, Json(ApiResponse::success(sensor))))
}

/// PUT /api/sensors/:id - Update a sensor
pub async fn update_sensor(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SensorUpdate>,
) -> Result<Json<ApiResponse<Sensor>>, ApiError> {
    request.validate()?;
    let sensor = state
        .repos
        .sensors
        .update_sensor(id, &request)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Sensor with ID {} not found", id)))?;
    Ok(Json(ApiResponse::success(sensor)))
}

/// DELETE /api/sensors/:id - Delete a sensor
pub async fn delete_sensor(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    if !state.repos.sensors.delete_sensor(id).await? {
        return Err(ApiError::NotFound(format!("Sensor with ID {} not found", id)));
    }
    Ok(Json(ApiResponse::success(
        json!({ "message": "Sensor deleted successfully" }),
    )))
}
