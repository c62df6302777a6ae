use std::sync::Arc;

use play_review_crawler::api::{self, AppState};
use play_review_crawler::config::AppConfig;
use play_review_crawler::fetch::ReviewClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = AppConfig::from_env()?;
    let client = ReviewClient::new(&config.http)?;
    let app = api::router(AppState {
        client,
        settings: Arc::new(config.crawl),
    });

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
