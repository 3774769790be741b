use anyhow::Context;
use dotenvy::dotenv;
use registrar::logging::{init_tracing, shutdown_tracer};
use registrar::metrics::{init_metrics, metrics_app};
use registrar::router::init_router;
use registrar::state::AppState;
use registrar_config::ServerConfig;
use registrar_db::{init_db_pool, run_migrations};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing().context("Failed to initialize logging")?;

    let db = init_db_pool().await.context("Failed to connect to database")?;
    run_migrations(&db).await.context("Failed to run migrations")?;

    let state = AppState::from_pool(db);
    let mut app = init_router(state);

    match init_metrics() {
        Ok(Some(handle)) => app = app.merge(metrics_app(handle)),
        Ok(None) => info!("Observability disabled, /metrics not exposed"),
        Err(e) => warn!(error = %e, "Failed to install Prometheus recorder"),
    }

    let server = ServerConfig::from_env();
    let address = server.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    info!(%address, "Server running");
    info!("Swagger UI available at http://{}/swagger-ui", address);
    info!("Scalar UI available at http://{}/scalar", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    shutdown_tracer().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}
