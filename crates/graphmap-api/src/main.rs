//! graphmap REST API server.

use graphmap_api::config::ApiConfig;
use graphmap_api::server::{self, AppState};
use graphmap_store::InMemoryGraphStore;
use graphmap_template::GraphTemplate;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn build_template(
    config: &ApiConfig,
) -> Result<GraphTemplate, Box<dyn std::error::Error + Send + Sync>> {
    #[cfg(feature = "sqlite")]
    if let Some(path) = &config.sqlite_path {
        tracing::info!(path = %path.display(), "using SQLite graph store");
        let store = graphmap_store::SqliteGraphStore::new(path)?;
        return Ok(GraphTemplate::from_store(Arc::new(store)));
    }

    #[cfg(not(feature = "sqlite"))]
    if config.sqlite_path.is_some() {
        tracing::warn!("GRAPHMAP_SQLITE_PATH ignored: built without the sqlite feature");
    }

    tracing::info!("using in-memory graph store");
    Ok(GraphTemplate::from_store(Arc::new(InMemoryGraphStore::new())))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ApiConfig::from_env()?;
    let template = build_template(&config)?;
    let app = server::router(Arc::new(AppState { template }));

    tracing::info!("graphmap API listening on {}", config.listen);
    axum::serve(
        tokio::net::TcpListener::bind(config.listen).await?,
        app.into_make_service(),
    )
    .await?;
    Ok(())
}
