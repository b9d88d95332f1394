use thiserror::Error;
use uuid::Uuid;

use crate::{domain::LoadCategory, repo::RepoError};

#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("insufficient data: need {required} readings, found {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("prediction service unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("malformed prediction response: {0}")]
    MalformedResponse(String),

    #[error("degenerate normalization bounds for {category}: min {min} must be below max {max}")]
    DegenerateBounds {
        category: LoadCategory,
        min: f64,
        max: f64,
    },

    #[error("reading {id} is missing a load category")]
    IncompleteReading { id: Uuid },

    #[error(transparent)]
    Store(#[from] RepoError),
}
