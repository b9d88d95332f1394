use anyhow::Result;
use std::sync::Arc;

use crate::{
    config::Config,
    forecast::{ForecastChainer, HttpPredictor, Predictor},
    repo::Repositories,
};

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub repos: Repositories,
    pub chainer: Arc<ForecastChainer>,
}

impl AppState {
    /// Wire the configured store and the HTTP prediction client.
    pub async fn new(cfg: Config) -> Result<Self> {
        let repos = Repositories::new(&cfg).await?;
        let predictor = Arc::new(HttpPredictor::new(&cfg.predictor)?);
        Self::with_parts(cfg, repos, predictor)
    }

    /// Build from explicit parts; tests inject stores and stub predictors here.
    pub fn with_parts(
        cfg: Config,
        repos: Repositories,
        predictor: Arc<dyn Predictor>,
    ) -> Result<Self> {
        cfg.validate()?;
        let chainer = ForecastChainer::new(
            predictor,
            cfg.bounds()?,
            cfg.forecast.missing_category,
            cfg.predictor.step_timeout(),
        );
        Ok(Self {
            cfg: Arc::new(cfg),
            repos,
            chainer: Arc::new(chainer),
        })
    }
}
