use anyhow::{Context, Result};
use locale_gate::{config::Config, server};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored when the variables come from the environment)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("locale_gate=info".parse()?),
        )
        .init();

    let config = Config::from_env()?;

    info!(
        "Supported locales: {:?} (fallback '{}')",
        config.locales.list(),
        config.locales.fallback()
    );

    let app = server::router(&config);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("✓ Locale gate listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
