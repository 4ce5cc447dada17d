use anyhow::Result;
use ttl_throttle::config::Settings;
use ttl_throttle::server::Server;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let settings = Settings::from_env();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("ttl_throttle={},tower_http=debug", settings.log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting ttl-throttle service");
    tracing::info!(
        "Configuration: bind_address={}, namespace={}, limit={}, ttl_ms={}",
        settings.bind_address,
        settings.namespace,
        settings.limit,
        settings.ttl_ms
    );

    let server = Server::new(&settings)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create server: {}", e))?;

    server
        .run()
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}
