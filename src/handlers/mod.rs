//! HTTP handlers for document CRUD.

pub mod document;
pub use document::*;
