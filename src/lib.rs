//! Search API: configuration-driven REST CRUD endpoints over document repositories.

pub mod config;
pub mod error;
pub mod extractors;
pub mod response;
pub mod state;
pub mod store;
pub mod service;
pub mod handlers;
pub mod routes;

pub use config::{build, from_json_str, from_path, from_yaml_str, ApiConfig, EndpointConfig, HttpMethod, OutputFormat};
pub use error::{AppError, ConfigError, RepositoryError};
pub use response::{error_body, success_many, success_one};
pub use state::AppState;
pub use store::{ensure_database_exists, DocumentRepository, MemoryRepository, PgRepository, RepositoryRegistry};
pub use routes::{common_routes_with_ready, document_routes};
pub use service::CrudService;
