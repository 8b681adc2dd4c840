//! Document CRUD routes built from the API config.
//! Each configured endpoint gets a collection path and an item path (`/:id`); an
//! [`EndpointKey`] extension on the route tells handlers which endpoint they serve.
//! With `version_in_url` paths are `/{version}/{endpoint}`, otherwise `/{endpoint}`
//! and the version is negotiated from the Accept header.

use crate::config::{EndpointKey, HttpMethod};
use crate::handlers::document::{create, create_with_id, delete as delete_handler, read, read_all, update};
use crate::state::AppState;
use axum::{routing::MethodRouter, Extension, Router};
use tower_http::limit::RequestBodyLimitLayer;

/// Request bodies above this size are rejected before reaching a handler.
pub const BODY_LIMIT_BYTES: usize = 2 * 1024 * 1024;

pub fn document_routes(state: AppState) -> Router {
    let mut router: Router<AppState> = Router::new();
    for (path, (key, methods)) in state.config.route_table() {
        let mut collection: MethodRouter<AppState> = MethodRouter::new();
        let mut item: MethodRouter<AppState> = MethodRouter::new();
        for method in methods {
            match method {
                HttpMethod::Head => {
                    collection = collection.head(read_all);
                    item = item.head(read);
                }
                HttpMethod::Get => {
                    collection = collection.get(read_all);
                    item = item.get(read);
                }
                HttpMethod::Post => {
                    collection = collection.post(create);
                    item = item.post(create_with_id);
                }
                HttpMethod::Put => item = item.put(update),
                HttpMethod::Patch => item = item.patch(update),
                HttpMethod::Delete => item = item.delete(delete_handler),
            }
        }
        tracing::debug!(path = %path, version = ?key.version, endpoint = %key.endpoint, "mount endpoint");
        router = router
            .route(&path, collection.layer(Extension(key.clone())))
            .route(&format!("{}/:id", path), item.layer(Extension::<EndpointKey>(key)));
    }
    router
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
        .with_state(state)
}
