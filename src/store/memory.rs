//! In-process repository. A bulk request holds the write lock for its whole duration.

use super::{BulkAction, BulkItem, BulkOperation, BulkResponse, Document, DocumentRepository};
use crate::error::RepositoryError;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct MemoryRepository {
    documents: RwLock<BTreeMap<String, Map<String, Value>>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository pre-filled with documents.
    pub fn with_documents(documents: impl IntoIterator<Item = Document>) -> Self {
        MemoryRepository {
            documents: RwLock::new(documents.into_iter().map(|d| (d.id, d.source)).collect()),
        }
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

#[async_trait]
impl DocumentRepository for MemoryRepository {
    async fn find(&self, id: &str) -> Result<Option<Document>, RepositoryError> {
        let docs = self.documents.read().await;
        Ok(docs.get(id).map(|source| Document {
            id: id.to_string(),
            source: source.clone(),
        }))
    }

    async fn find_all(&self) -> Result<Vec<Document>, RepositoryError> {
        let docs = self.documents.read().await;
        Ok(docs
            .iter()
            .map(|(id, source)| Document {
                id: id.clone(),
                source: source.clone(),
            })
            .collect())
    }

    async fn bulk(&self, operations: Vec<BulkOperation>) -> Result<BulkResponse, RepositoryError> {
        let mut docs = self.documents.write().await;
        let mut items = Vec::with_capacity(operations.len());
        for op in operations {
            let item = match op {
                BulkOperation::Create { id, source } => {
                    if docs.contains_key(&id) {
                        let reason = format!("document '{}' already exists", id);
                        BulkItem::failed(BulkAction::Create, id, RepositoryError::Conflict(reason))
                    } else {
                        docs.insert(id.clone(), source);
                        BulkItem::ok(BulkAction::Create, id)
                    }
                }
                BulkOperation::Update { id, patch } => match docs.get_mut(&id) {
                    Some(source) => {
                        source.extend(patch);
                        BulkItem::ok(BulkAction::Update, id)
                    }
                    None => {
                        let reason = format!("document '{}' does not exist", id);
                        BulkItem::failed(BulkAction::Update, id, RepositoryError::NotFound(reason))
                    }
                },
                BulkOperation::Delete { id } => {
                    if docs.remove(&id).is_some() {
                        BulkItem::ok(BulkAction::Delete, id)
                    } else {
                        let reason = format!("document '{}' does not exist", id);
                        BulkItem::failed(BulkAction::Delete, id, RepositoryError::NotFound(reason))
                    }
                }
            };
            items.push(item);
        }
        Ok(BulkResponse::from_items(items))
    }
}
