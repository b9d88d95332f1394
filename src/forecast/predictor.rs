use anyhow::Result;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::{Deserialize, Serialize};

use super::{ForecastError, LoadTriple, Window, WINDOW_LEN};
use crate::config::PredictorConfig;

/// Single-step load predictor: given the current window, return the next
/// normalized (hvac, lighting, mels) row.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Predictor: Send + Sync {
    async fn predict(&self, window: &Window) -> Result<LoadTriple, ForecastError>;
}

/// `{ "features": [[[f64; 3]; 8]] }`
#[derive(Debug, Serialize)]
pub struct PredictRequest {
    pub features: [[LoadTriple; WINDOW_LEN]; 1],
}

/// `{ "prediction": [[f64; 3]] }`
#[derive(Debug, Deserialize)]
pub struct PredictResponse {
    pub prediction: Vec<Vec<f64>>,
}

impl PredictResponse {
    /// Extract the single predicted row. Any other shape is an error.
    pub fn into_row(self) -> Result<LoadTriple, ForecastError> {
        let [row]: [Vec<f64>; 1] = self.prediction.try_into().map_err(|rows: Vec<Vec<f64>>| {
            ForecastError::MalformedResponse(format!(
                "expected 1 predicted row, got {}",
                rows.len()
            ))
        })?;
        let triple: LoadTriple = row.try_into().map_err(|values: Vec<f64>| {
            ForecastError::MalformedResponse(format!(
                "expected 3 values in predicted row, got {}",
                values.len()
            ))
        })?;
        if triple.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::MalformedResponse(
                "non-finite value in predicted row".to_string(),
            ));
        }
        Ok(triple)
    }
}

/// Prediction service reached over HTTP.
#[derive(Clone)]
pub struct HttpPredictor {
    endpoint: String,
    client: ClientWithMiddleware,
}

impl HttpPredictor {
    pub fn new(cfg: &PredictorConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("iot-energy-monitor/0.1"));
        let client = reqwest::Client::builder()
            .timeout(cfg.timeout())
            .default_headers(headers)
            .build()?;

        let mut builder = ClientBuilder::new(client);
        if cfg.max_retries > 0 {
            let max_backoff = cfg.retry_backoff();
            let policy = ExponentialBackoff::builder()
                .retry_bounds(max_backoff / 4, max_backoff)
                .build_with_max_retries(cfg.max_retries);
            builder = builder.with(RetryTransientMiddleware::new_with_policy(policy));
        }

        Ok(Self {
            endpoint: cfg.endpoint(),
            client: builder.build(),
        })
    }
}

#[async_trait]
impl Predictor for HttpPredictor {
    async fn predict(&self, window: &Window) -> Result<LoadTriple, ForecastError> {
        let request = PredictRequest {
            features: window.to_batch(),
        };

        let resp = self
            .client
            .post(self.endpoint.as_str())
            .json(&request)
            .send()
            .await
            .map_err(|e| ForecastError::UpstreamUnavailable(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ForecastError::UpstreamUnavailable(format!(
                "{} returned {}",
                self.endpoint, status
            )));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| ForecastError::UpstreamUnavailable(e.to_string()))?;
        let parsed: PredictResponse = serde_json::from_slice(&body)
            .map_err(|e| ForecastError::MalformedResponse(e.to_string()))?;
        parsed.into_row()
    }
}
