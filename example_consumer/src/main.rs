//! Example consumer: a separate Rust project that uses search-api as a dependency.
//! The API config is embedded; documents live in memory.
//!
//! Run from repo root: `cargo run -p example-consumer`

use search_api::{common_routes_with_ready, document_routes, from_yaml_str, AppState, MemoryRepository, RepositoryRegistry};
use std::sync::Arc;
use tokio::net::TcpListener;

const API_CONFIG: &str = r#"
search_api:
  output_format: json
  versions:
    v1:
      endpoints:
        notes:
          repository: notes
          methods: [GET, POST, PUT, DELETE]
          allow_get_all: true
"#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("search_api=info")),
        )
        .init();

    let config = from_yaml_str(API_CONFIG)?;
    let registry = RepositoryRegistry::new().with("notes", Arc::new(MemoryRepository::new()));
    let state = AppState::new(config, registry)?;

    let app = common_routes_with_ready(state.clone()).merge(document_routes(state));
    let listener = TcpListener::bind("127.0.0.1:3000").await?;
    let port = listener.local_addr()?.port();
    tracing::info!("Example consumer listening on http://127.0.0.1:{}", port);
    axum::serve(listener, app).await?;
    Ok(())
}
