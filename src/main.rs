use std::sync::Arc;

use ride_dispatch::api;
use ride_dispatch::config::Config;
use ride_dispatch::error::AppError;
use ride_dispatch::state::AppState;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false)
        .compact()
        .init();

    let shared_state = Arc::new(AppState::new(&config));
    let app = api::rest::router(shared_state);

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(
        http_port = config.http_port,
        default_radius_km = config.default_search_radius_km,
        base_fare = config.base_fare,
        "http server started"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::Internal(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
