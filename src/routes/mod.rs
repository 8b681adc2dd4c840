pub mod common;
pub mod document;

pub use common::common_routes_with_ready;
pub use document::document_routes;
