//! Example server: loads the API config from `CONFIG_PATH`, binds every referenced repository
//! (PostgreSQL when `DATABASE_URL` is set, in-memory otherwise), and mounts common and document routes.

use search_api::{
    common_routes_with_ready,
    document_routes,
    ensure_database_exists,
    from_path,
    AppState,
    DocumentRepository,
    MemoryRepository,
    PgRepository,
    RepositoryRegistry,
};
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("search_api=info".parse()?))
        .init();

    let config_path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "demos/search_api.yaml".into());
    let config = from_path(&config_path)?;

    let mut registry = RepositoryRegistry::new();
    match std::env::var("DATABASE_URL") {
        Ok(database_url) => {
            ensure_database_exists(&database_url).await?;
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(5)
                .connect(&database_url)
                .await?;
            for id in config.repository_ids() {
                let repository: Arc<dyn DocumentRepository> = Arc::new(PgRepository::connect(pool.clone(), id).await?);
                registry.register(id, repository);
            }
        }
        Err(_) => {
            tracing::warn!("DATABASE_URL not set, using in-memory repositories");
            for id in config.repository_ids() {
                registry.register(id, Arc::new(MemoryRepository::new()));
            }
        }
    }

    let state = AppState::new(config, registry)?;
    let app = Router::new()
        .merge(common_routes_with_ready(state.clone()))
        .nest("/api", document_routes(state))
        .layer(TraceLayer::new_for_http());

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
