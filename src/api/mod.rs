pub mod analytics;
pub mod error;
pub mod forecast;
pub mod health;
pub mod readings;
pub mod response;
pub mod sensors;

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let server = state.cfg.server.clone();

    let api = Router::new()
        .route("/health", get(health::health_check))
        .route(
            "/sensors",
            get(sensors::list_sensors).post(sensors::add_sensor),
        )
        .route(
            "/sensors/:id",
            get(sensors::get_sensor)
                .put(sensors::update_sensor)
                .delete(sensors::delete_sensor),
        )
        .route(
            "/energy_data",
            get(readings::list_readings).post(readings::add_reading),
        )
        .route("/energy_data/filter", get(readings::filter_readings))
        .route("/energy_data/summary", get(analytics::get_summary))
        .route("/energy_data/predict", post(forecast::predict_next_hour))
        .route("/energy_data/day-ahead", get(forecast::get_day_ahead))
        .route(
            "/energy_data/:id",
            get(readings::get_reading)
                .put(readings::update_reading)
                .delete(readings::delete_reading),
        )
        .with_state(state);

    let mut router = Router::new().nest("/api", api);

    if server.enable_cors {
        use tower_http::cors::Any;
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::PUT,
                axum::http::Method::DELETE,
            ])
            .allow_headers([axum::http::header::CONTENT_TYPE]);
        router = router.layer(cors);
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(axum::extract::DefaultBodyLimit::max(1024 * 1024))
                .layer(TimeoutLayer::new(server.request_timeout())),
        )
        .layer(TraceLayer::new_for_http())
}
