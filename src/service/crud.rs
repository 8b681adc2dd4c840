//! Generic CRUD over one repository. Mutations are staged in the service and only reach
//! the repository on `commit`, so each request owns its own batch.

use crate::error::RepositoryError;
use crate::store::{BulkOperation, BulkResponse, Document, DocumentRepository};
use serde_json::{Map, Value};
use std::sync::Arc;

pub struct CrudService {
    repository: Arc<dyn DocumentRepository>,
    pending: Vec<BulkOperation>,
}

impl CrudService {
    pub fn new(repository: Arc<dyn DocumentRepository>) -> Self {
        CrudService {
            repository,
            pending: Vec::new(),
        }
    }

    /// Fetch one document. `Ok(None)` when it does not exist.
    pub async fn read(&self, id: &str) -> Result<Option<Document>, RepositoryError> {
        self.repository.find(id).await
    }

    pub async fn read_all(&self) -> Result<Vec<Document>, RepositoryError> {
        self.repository.find_all().await
    }

    /// Stage a create. The id comes from `_id` in the data, or a new UUID v4. Returns the id.
    pub fn create(&mut self, mut data: Map<String, Value>) -> Result<String, RepositoryError> {
        let id = match data.remove("_id") {
            Some(Value::String(s)) if !s.is_empty() => s,
            Some(Value::Number(n)) => n.to_string(),
            None | Some(Value::Null) => uuid::Uuid::new_v4().to_string(),
            Some(other) => {
                return Err(RepositoryError::Backend(format!("invalid _id: {}", other)));
            }
        };
        tracing::debug!(id = %id, "stage create");
        self.pending.push(BulkOperation::Create { id: id.clone(), source: data });
        Ok(id)
    }

    /// Stage a partial update. An `_id` in the data must match `id`.
    pub fn update(&mut self, id: &str, mut data: Map<String, Value>) -> Result<(), RepositoryError> {
        require_id(id)?;
        if let Some(body_id) = data.remove("_id") {
            let matches = match &body_id {
                Value::String(s) => s == id,
                Value::Number(n) => n.to_string() == id,
                _ => false,
            };
            if !matches {
                return Err(RepositoryError::Conflict(format!(
                    "document id {} does not match '{}'",
                    body_id, id
                )));
            }
        }
        tracing::debug!(id = %id, "stage update");
        self.pending.push(BulkOperation::Update {
            id: id.to_string(),
            patch: data,
        });
        Ok(())
    }

    pub fn delete(&mut self, id: &str) -> Result<(), RepositoryError> {
        require_id(id)?;
        tracing::debug!(id = %id, "stage delete");
        self.pending.push(BulkOperation::Delete { id: id.to_string() });
        Ok(())
    }

    pub fn pending(&self) -> &[BulkOperation] {
        &self.pending
    }

    /// Send staged operations as one bulk request. A failed item is returned as the
    /// error of that item, so callers see commit failures in the same classes as
    /// the operation that was staged.
    pub async fn commit(&mut self) -> Result<BulkResponse, RepositoryError> {
        let operations = std::mem::take(&mut self.pending);
        let count = operations.len();
        let response = self.repository.bulk(operations).await?;
        if let Some(err) = response.first_error() {
            tracing::info!(items = count, error = %err, "commit rejected");
            return Err(err.clone());
        }
        tracing::info!(items = count, "commit");
        Ok(response)
    }
}

fn require_id(id: &str) -> Result<(), RepositoryError> {
    if id.trim().is_empty() {
        return Err(RepositoryError::Conflict("missing _id".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryRepository;
    use serde_json::json;

    fn data(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => Map::new(),
        }
    }

    #[tokio::test]
    async fn nothing_is_visible_before_commit() {
        let repo = Arc::new(MemoryRepository::new());
        let mut crud = CrudService::new(repo.clone());
        let id = crud.create(data(json!({ "_id": "7", "name": "x" }))).unwrap();
        assert_eq!(id, "7");
        assert!(crud.read("7").await.unwrap().is_none());
        crud.commit().await.unwrap();
        assert!(crud.pending().is_empty());
        assert_eq!(crud.read("7").await.unwrap().unwrap().source, data(json!({ "name": "x" })));
    }

    #[tokio::test]
    async fn generates_id_when_absent() {
        let mut crud = CrudService::new(Arc::new(MemoryRepository::new()));
        let id = crud.create(Map::new()).unwrap();
        assert!(uuid::Uuid::parse_str(&id).is_ok());
    }

    #[test]
    fn update_rejects_mismatched_body_id() {
        let mut crud = CrudService::new(Arc::new(MemoryRepository::new()));
        let err = crud.update("1", data(json!({ "_id": "2" }))).unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
        assert!(crud.update("1", data(json!({ "_id": "1" }))).is_ok());
    }

    #[tokio::test]
    async fn commit_surfaces_item_failure_class() {
        let mut crud = CrudService::new(Arc::new(MemoryRepository::new()));
        crud.delete("missing").unwrap();
        let err = crud.commit().await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound(_)));
    }

    #[test]
    fn blank_id_is_a_runtime_failure() {
        let mut crud = CrudService::new(Arc::new(MemoryRepository::new()));
        assert!(matches!(crud.delete(" "), Err(RepositoryError::Conflict(_))));
    }
}
