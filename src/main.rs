use anyhow::Result;
use iot_energy_monitor::{api, config::Config, state::AppState, telemetry};
use telemetry::init_tracing;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cfg = Config::load()?;
    let addr = cfg.server.socket_addr()?;

    if cfg.server.host == "0.0.0.0" {
        warn!("binding to 0.0.0.0 - the API has no authentication and is reachable from the network");
    }

    let state = AppState::new(cfg.clone()).await?;
    let app = api::router(state);

    info!(%addr, predictor = %cfg.predictor.endpoint(), "starting IoT energy monitor");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(telemetry::shutdown_signal())
        .await?;

    warn!("shutdown complete");
    Ok(())
}
