//! Router tests against the in-memory store and stub predictors.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, TimeZone, Utc};
use iot_energy_monitor::{
    api,
    config::Config,
    domain::{LoadBreakdown, Reading},
    forecast::{ForecastError, LoadTriple, Predictor, Window},
    repo::Repositories,
    state::AppState,
};
use serde_json::{json, Value};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use tower::ServiceExt;
use uuid::Uuid;

/// Returns the per-category mean of the (normalized) window.
struct AveragingPredictor;

#[async_trait]
impl Predictor for AveragingPredictor {
    async fn predict(&self, window: &Window) -> Result<LoadTriple, ForecastError> {
        let mut sum = [0.0; 3];
        for row in window.rows() {
            for (s, v) in sum.iter_mut().zip(row) {
                *s += v;
            }
        }
        let n = window.len() as f64;
        Ok(sum.map(|s| s / n))
    }
}

/// Succeeds until call `fail_at`, then reports the service as down.
struct FailingPredictor {
    calls: AtomicUsize,
    fail_at: usize,
}

#[async_trait]
impl Predictor for FailingPredictor {
    async fn predict(&self, _window: &Window) -> Result<LoadTriple, ForecastError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call >= self.fail_at {
            Err(ForecastError::UpstreamUnavailable("503 Service Unavailable".into()))
        } else {
            Ok([0.1, 0.1, 0.1])
        }
    }
}

/// Answers every step after `delay`.
struct SlowPredictor {
    delay: std::time::Duration,
}

#[async_trait]
impl Predictor for SlowPredictor {
    async fn predict(&self, _window: &Window) -> Result<LoadTriple, ForecastError> {
        tokio::time::sleep(self.delay).await;
        Ok([0.1, 0.1, 0.1])
    }
}

fn app(predictor: Arc<dyn Predictor>) -> (Router, Repositories) {
    let repos = Repositories::in_memory();
    let state = AppState::with_parts(Config::default(), repos.clone(), predictor).unwrap();
    (api::router(state), repos)
}

async fn seed(repos: &Repositories, count: i64, hvac: f64) {
    let base = Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap();
    for h in 0..count {
        repos
            .readings
            .insert_reading(Reading {
                id: Uuid::new_v4(),
                sensor_id: 1,
                timestamp: base + Duration::hours(h),
                loads: LoadBreakdown::new(hvac, 50.0, 30.0),
            })
            .await
            .unwrap();
    }
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(b) => builder
            .header("content-type", "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn test_health() {
    let (app, _) = app(Arc::new(AveragingPredictor));
    let (status, body) = send(&app, "GET", "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_sensor_crud_flow() {
    let (app, _) = app(Arc::new(AveragingPredictor));

    let (status, body) = send(
        &app,
        "POST",
        "/api/sensors",
        Some(json!({"type": "HVAC", "location": "Floor 3"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["type"], "HVAC");

    let (status, body) = send(&app, "GET", "/api/sensors", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["metadata"]["total_count"], 1);

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/sensors/{id}"),
        Some(json!({"location": "Floor 4"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["location"], "Floor 4");
    assert_eq!(body["data"]["type"], "HVAC");

    let (status, _) = send(&app, "DELETE", &format!("/api/sensors/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "GET", &format!("/api/sensors/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NotFound");
}

#[tokio::test]
async fn test_sensor_requires_type() {
    let (app, _) = app(Arc::new(AveragingPredictor));
    let (status, body) = send(
        &app,
        "POST",
        "/api/sensors",
        Some(json!({"type": "", "location": "Lobby"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "ValidationError");
}

#[tokio::test]
async fn test_energy_data_crud_and_filter() {
    let (app, repos) = app(Arc::new(AveragingPredictor));
    seed(&repos, 3, 10.0).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/energy_data",
        Some(json!({
            "sensor_id": 9,
            "timestamp": "2025-04-02T06:00:00Z",
            "total_hvac": 120.0,
            "total_lighting": 40.0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (_, body) = send(&app, "GET", "/api/energy_data", None).await;
    assert_eq!(body["metadata"]["total_count"], 4);
    assert_eq!(body["data"][0]["sensor_id"], 9);

    let (status, body) = send(
        &app,
        "GET",
        "/api/energy_data/filter?start=2025-04-01T01:00:00Z&end=2025-04-01T02:00:00Z",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (status, _) = send(&app, "GET", "/api/energy_data/filter?start=2025-04-01", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/energy_data/{id}"),
        Some(json!({"total_mels": 5.0})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_mels"], 5.0);
    assert_eq!(body["data"]["total_hvac"], 120.0);

    let (status, _) = send(&app, "DELETE", &format!("/api/energy_data/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "GET", &format!("/api/energy_data/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_day_ahead_with_seven_readings_is_insufficient() {
    let (app, repos) = app(Arc::new(AveragingPredictor));
    seed(&repos, 7, 10.0).await;

    let (status, body) = send(&app, "GET", "/api/energy_data/day-ahead", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "InsufficientData");
    assert!(body.get("data").is_none());
}

#[tokio::test]
async fn test_day_ahead_end_to_end() {
    let (app, repos) = app(Arc::new(AveragingPredictor));
    seed(&repos, 8, 10.0).await;

    let (status, body) = send(&app, "GET", "/api/energy_data/day-ahead", None).await;
    assert_eq!(status, StatusCode::OK);

    let forecast = body["data"]["forecast"].as_array().unwrap();
    assert_eq!(forecast.len(), 24);
    for (i, entry) in forecast.iter().enumerate() {
        assert_eq!(entry["hour"], (i + 1) as u64);
        let hvac = entry["total_hvac"].as_f64().unwrap();
        assert!((0.0..=500.0).contains(&hvac));
        assert!((hvac - 10.0).abs() < 1e-9);
    }
}

#[tokio::test]
async fn test_day_ahead_upstream_failure_returns_no_partial_forecast() {
    let predictor = Arc::new(FailingPredictor {
        calls: AtomicUsize::new(0),
        fail_at: 13,
    });
    let (app, repos) = app(predictor.clone());
    seed(&repos, 8, 10.0).await;

    let (status, body) = send(&app, "GET", "/api/energy_data/day-ahead", None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "UpstreamUnavailable");
    assert!(body.get("data").is_none());
    assert_eq!(predictor.calls.load(Ordering::SeqCst), 13);
}

#[tokio::test]
async fn test_predict_next_hour() {
    let (app, repos) = app(Arc::new(AveragingPredictor));
    seed(&repos, 8, 100.0).await;

    let (status, body) = send(&app, "POST", "/api/energy_data/predict", None).await;
    assert_eq!(status, StatusCode::OK);
    let prediction = &body["data"]["prediction"];
    assert_eq!(prediction["hour"], 1);
    assert!((prediction["total_hvac"].as_f64().unwrap() - 100.0).abs() < 1e-9);
    assert!((prediction["total_lighting"].as_f64().unwrap() - 50.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_summary_over_recent_readings() {
    let (app, repos) = app(Arc::new(AveragingPredictor));
    seed(&repos, 4, 20.0).await;

    let (status, body) = send(&app, "GET", "/api/energy_data/summary", None).await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["reading_count"], 4);
    assert_eq!(data["categories"]["hvac"]["total"], 80.0);
    assert_eq!(data["categories"]["overall"]["mean"], 100.0);
    assert!(data["peaks"].as_array().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_slow_day_ahead_chain_finishes_within_request_timeout() {
    // 24 steps at 6s each outlast 120s but stay inside every step timeout.
    let (app, repos) = app(Arc::new(SlowPredictor {
        delay: std::time::Duration::from_secs(6),
    }));
    seed(&repos, 8, 10.0).await;

    let (status, body) = send(&app, "GET", "/api/energy_data/day-ahead", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["forecast"].as_array().unwrap().len(), 24);
}

#[tokio::test(start_paused = true)]
async fn test_stalled_step_reports_upstream_error_not_request_timeout() {
    let (app, repos) = app(Arc::new(SlowPredictor {
        delay: std::time::Duration::from_secs(3600),
    }));
    seed(&repos, 8, 10.0).await;

    let (status, body) = send(&app, "GET", "/api/energy_data/day-ahead", None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "UpstreamUnavailable");
}
