use estate_api::database::DatabaseManager;
use estate_api::services::LocalImageStorage;
use estate_api::{app, AppConfig, AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("estate_api=info,tower_http=info")),
        )
        .init();

    let config = AppConfig::from_env()?;
    tracing::info!("Starting Estate API in {:?} mode", config.environment);

    let pool = DatabaseManager::connect(&config.database).await?;
    if config.database.run_migrations {
        DatabaseManager::migrate(&pool).await?;
    }

    LocalImageStorage::new(config.uploads.dir.clone()).ensure_root().await?;

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let state = AppState::new(pool.clone(), config);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Estate API listening on http://{}", bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    DatabaseManager::close(&pool).await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}
