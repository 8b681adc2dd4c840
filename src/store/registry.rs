//! Repository bindings keyed by the identifier endpoints reference.

use super::DocumentRepository;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct RepositoryRegistry {
    by_id: HashMap<String, Arc<dyn DocumentRepository>>,
}

impl RepositoryRegistry {
    pub fn new() -> Self {
        RepositoryRegistry {
            by_id: HashMap::new(),
        }
    }

    /// Bind `id` to a repository, replacing any previous binding.
    pub fn register(&mut self, id: impl Into<String>, repository: Arc<dyn DocumentRepository>) -> &mut Self {
        self.by_id.insert(id.into(), repository);
        self
    }

    pub fn with(mut self, id: impl Into<String>, repository: Arc<dyn DocumentRepository>) -> Self {
        self.register(id, repository);
        self
    }

    pub fn get(&self, id: &str) -> Option<&Arc<dyn DocumentRepository>> {
        self.by_id.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn DocumentRepository>)> {
        self.by_id.iter().map(|(k, v)| (k.as_str(), v))
    }
}
