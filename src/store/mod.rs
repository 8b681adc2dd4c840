//! Document repositories: the storage seam behind every endpoint.
//!
//! A repository holds documents keyed by string id. Mutations are sent as a bulk request
//! (the commit step); each item reports its own outcome, like a search engine bulk API.

mod memory;
mod postgres;
mod registry;

pub use memory::MemoryRepository;
pub use postgres::{ensure_database_exists, PgRepository};
pub use registry::RepositoryRegistry;

use crate::error::RepositoryError;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};

/// A stored document: id plus source fields.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub id: String,
    pub source: Map<String, Value>,
}

impl Document {
    /// Canonical API representation: source fields with `_id` set.
    pub fn to_value(&self) -> Value {
        let mut map = self.source.clone();
        map.insert("_id".into(), Value::String(self.id.clone()));
        Value::Object(map)
    }
}

impl Serialize for Document {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

/// One staged mutation.
#[derive(Clone, Debug, PartialEq)]
pub enum BulkOperation {
    /// Insert; fails with a conflict if the id exists.
    Create { id: String, source: Map<String, Value> },
    /// Shallow-merge `patch` into an existing document.
    Update { id: String, patch: Map<String, Value> },
    Delete { id: String },
}

impl BulkOperation {
    pub fn action(&self) -> BulkAction {
        match self {
            BulkOperation::Create { .. } => BulkAction::Create,
            BulkOperation::Update { .. } => BulkAction::Update,
            BulkOperation::Delete { .. } => BulkAction::Delete,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BulkAction {
    Create,
    Update,
    Delete,
}

/// Outcome of one bulk item. `error` is set when the item was not applied.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BulkItem {
    pub action: BulkAction,
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RepositoryError>,
}

impl BulkItem {
    pub fn ok(action: BulkAction, id: impl Into<String>) -> Self {
        BulkItem {
            action,
            id: id.into(),
            error: None,
        }
    }

    pub fn failed(action: BulkAction, id: impl Into<String>, error: RepositoryError) -> Self {
        BulkItem {
            action,
            id: id.into(),
            error: Some(error),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct BulkResponse {
    /// True when at least one item failed.
    pub errors: bool,
    pub items: Vec<BulkItem>,
}

impl BulkResponse {
    pub fn from_items(items: Vec<BulkItem>) -> Self {
        BulkResponse {
            errors: items.iter().any(|i| i.error.is_some()),
            items,
        }
    }

    pub fn first_error(&self) -> Option<&RepositoryError> {
        self.items.iter().find_map(|i| i.error.as_ref())
    }
}

impl Serialize for RepositoryError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let kind = match self {
            RepositoryError::NotFound(_) => "not_found",
            RepositoryError::Conflict(_) => "conflict",
            RepositoryError::Backend(_) => "backend",
        };
        serde_json::json!({ "type": kind, "reason": self.to_string() }).serialize(serializer)
    }
}

/// Storage behind one repository binding.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    async fn find(&self, id: &str) -> Result<Option<Document>, RepositoryError>;

    /// All documents, ordered by id.
    async fn find_all(&self) -> Result<Vec<Document>, RepositoryError>;

    /// Apply staged operations in order. Item failures are reported per item;
    /// `Err` means the request as a whole failed and nothing can be assumed applied.
    async fn bulk(&self, operations: Vec<BulkOperation>) -> Result<BulkResponse, RepositoryError>;

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}
