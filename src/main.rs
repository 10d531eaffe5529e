use std::sync::Arc;

use tracing::info;

use news_triage::config::Config;
use news_triage::routes::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    news_triage::init_tracing();

    // Load configuration
    let mut config = Config::load("feeds.toml")?;
    config.apply_env_overrides();
    info!(
        "Loaded {} feeds and {} categories from configuration",
        config.feeds.len(),
        config.categories.len()
    );

    let state = Arc::new(AppState::from_config(&config).await?);
    info!("Database initialized at {}", config.database_url);

    let app = routes::router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr.as_str()).await?;
    info!("Server starting on http://{}", config.listen_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
