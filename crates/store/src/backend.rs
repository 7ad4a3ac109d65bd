use crate::{Collection, Document, Filter, ObjectId, Record, StoreError, StoreResult};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::{Arc, RwLock};

/// Configuration for selecting and building a backend.
///
/// # Example
/// ```
/// use store::BackendConfig;
///
/// // In-memory (for testing)
/// let config = BackendConfig::in_memory();
///
/// // MongoDB, database taken from the URI path
/// let config = BackendConfig::mongo("mongodb://localhost:27017/dositio");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum BackendConfig {
    /// Process-local maps guarded by `RwLock`. Data is lost on restart.
    #[default]
    InMemory,
    /// MongoDB at `uri`. Requires the `backend-mongo` feature.
    Mongo { uri: String },
}

impl BackendConfig {
    pub fn in_memory() -> Self {
        BackendConfig::InMemory
    }

    pub fn mongo<U: Into<String>>(uri: U) -> Self {
        BackendConfig::Mongo { uri: uri.into() }
    }
}

pub(crate) enum Backend {
    InMemory(DashMap<String, Arc<InMemoryCollection>>),
    #[cfg(feature = "backend-mongo")]
    Mongo(mongodb::Database),
}

impl Backend {
    pub(crate) fn in_memory() -> Self {
        Backend::InMemory(DashMap::new())
    }

    pub(crate) async fn open(config: &BackendConfig) -> StoreResult<Self> {
        match config {
            BackendConfig::InMemory => Ok(Self::in_memory()),
            BackendConfig::Mongo { uri } => {
                #[cfg(feature = "backend-mongo")]
                {
                    Ok(Backend::Mongo(mongo::connect(uri).await?))
                }
                #[cfg(not(feature = "backend-mongo"))]
                {
                    let _ = uri;
                    Err(StoreError::backend("mongo backend disabled at compile time"))
                }
            }
        }
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Backend::InMemory(_) => "in_memory",
            #[cfg(feature = "backend-mongo")]
            Backend::Mongo(_) => "mongo",
        }
    }

    pub(crate) fn collection(&self, name: &str) -> Arc<dyn Collection> {
        match self {
            Backend::InMemory(collections) => collections
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(InMemoryCollection::new(name)))
                .clone(),
            #[cfg(feature = "backend-mongo")]
            Backend::Mongo(db) => Arc::new(mongo::MongoCollection::new(db, name)),
        }
    }
}

/// An in-memory collection using a `RwLock` around an insertion-ordered `Vec`.
pub struct InMemoryCollection {
    name: String,
    records: RwLock<Vec<Record>>,
}

impl InMemoryCollection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            records: RwLock::new(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Collection for InMemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn find_one(&self, filter: &Filter) -> StoreResult<Option<Record>> {
        let guard = self
            .records
            .read()
            .map_err(|_| StoreError::backend("poisoned lock"))?;
        Ok(guard.iter().find(|r| filter.matches(r)).cloned())
    }

    async fn find(&self, filter: &Filter) -> StoreResult<Vec<Record>> {
        let guard = self
            .records
            .read()
            .map_err(|_| StoreError::backend("poisoned lock"))?;
        Ok(guard.iter().filter(|r| filter.matches(r)).cloned().collect())
    }

    async fn insert_one(&self, doc: Document) -> StoreResult<ObjectId> {
        let id = ObjectId::new();
        self.records
            .write()
            .map_err(|_| StoreError::backend("poisoned lock"))?
            .push(Record::new(id, doc));
        Ok(id)
    }

    async fn update_one(&self, filter: &Filter, mut patch: Document) -> StoreResult<()> {
        patch.remove("_id");
        let mut guard = self
            .records
            .write()
            .map_err(|_| StoreError::backend("poisoned lock"))?;
        if let Some(record) = guard.iter_mut().find(|r| filter.matches(r)) {
            record.fields.extend(patch);
        }
        Ok(())
    }

    async fn delete_one(&self, filter: &Filter) -> StoreResult<()> {
        let mut guard = self
            .records
            .write()
            .map_err(|_| StoreError::backend("poisoned lock"))?;
        if let Some(pos) = guard.iter().position(|r| filter.matches(r)) {
            guard.remove(pos);
        }
        Ok(())
    }
}

#[cfg(feature = "backend-mongo")]
pub mod mongo;
