use axum::{
    extract::{Query, State},
    Json,
};

use crate::{
    analytics::{summarize, UsageSummary},
    api::{error::ApiError, readings::RangeQuery, response::ApiResponse},
    state::AppState,
};

/// GET /api/energy_data/summary - Category totals, peaks and trends
///
/// Covers `start..=end` when both are given, otherwise the most recent
/// `analytics.recent_limit` readings.
pub async fn get_summary(
    State(state): State<AppState>,
    Query(q): Query<RangeQuery>,
) -> Result<Json<ApiResponse<UsageSummary>>, ApiError> {
    let readings = match q.parse()? {
        Some((start, end)) => state.repos.readings.range(start, end).await?,
        None => {
            state
                .repos
                .readings
                .latest(state.cfg.analytics.recent_limit)
                .await?
        }
    };
    Ok(Json(ApiResponse::success(summarize(
        &readings,
        &state.cfg.analytics,
    ))))
}
