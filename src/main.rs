use anyhow::{Context, Result};
use tracing::info;
use translation_gateway::{config::Config, server};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored when variables come from the host)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("translation_gateway=info".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .init();

    info!("Starting translation gateway");

    let config = Config::from_env()?;
    let state = server::state_from_config(&config)?;

    let listener = tokio::net::TcpListener::bind(config.bind_address())
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_address()))?;

    server::serve(listener, state).await
}
