//! Document collections for the dositio catalog service.
//!
//! The service treats persistence as an opaque collaborator: every resource
//! (products, categories, registered users) lives in a named [`Collection`]
//! that supports find/insert/update/delete by filter. Backends are selected
//! at startup through [`BackendConfig`]; the in-memory backend is always
//! available and the MongoDB backend sits behind the `backend-mongo` feature.
//!
//! ```
//! use serde_json::json;
//! use store::{BackendConfig, Filter, Store};
//!
//! # tokio_test_block(async {
//! let store = Store::open(&BackendConfig::in_memory()).await.unwrap();
//! let products = store.collection("products");
//!
//! let doc = json!({ "name": "Coffee", "category": "Drinks" });
//! let id = products.insert_one(doc.as_object().unwrap().clone()).await.unwrap();
//!
//! let found = products.find_one(&Filter::by_id(id)).await.unwrap();
//! assert_eq!(found.unwrap().fields["name"], "Coffee");
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Runtime::new().unwrap().block_on(f)
//! # }
//! ```

pub mod backend;
mod filter;
mod id;

use async_trait::async_trait;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;

pub use backend::{BackendConfig, InMemoryCollection};
pub use filter::Filter;
pub use id::ObjectId;

#[cfg(feature = "backend-mongo")]
pub use backend::mongo::MongoCollection;

/// A schemaless document: the body of a stored record.
pub type Document = Map<String, Value>;

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by the persistence layer.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid object id: {0}")]
    InvalidId(String),
    #[error("backend error: {0}")]
    Backend(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    pub fn backend<E: std::fmt::Display>(err: E) -> Self {
        Self::Backend(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// A stored document together with its storage key.
///
/// Serializes flat, with the key under `_id`:
/// `{"_id": "65f0...", "name": "Coffee"}`.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: ObjectId,
    pub fields: Document,
}

impl Record {
    pub fn new(id: ObjectId, mut fields: Document) -> Self {
        fields.remove("_id");
        Self { id, fields }
    }

    /// Field lookup by name. `_id` is not a field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Drop a field, returning the record for chaining.
    pub fn without(mut self, field: &str) -> Self {
        self.fields.remove(field);
        self
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        map.serialize_entry("_id", &self.id)?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// A named collection of documents.
///
/// Implementations must be safe to share between concurrently running
/// requests. No operation takes application-level locks across calls, so
/// a `find_one` followed by an `insert_one` is not atomic.
#[async_trait]
pub trait Collection: Send + Sync {
    /// Collection name, e.g. `products`.
    fn name(&self) -> &str;
    /// First record matching `filter`, if any.
    async fn find_one(&self, filter: &Filter) -> StoreResult<Option<Record>>;
    /// All records matching `filter`.
    async fn find(&self, filter: &Filter) -> StoreResult<Vec<Record>>;
    /// Insert a document and return its freshly assigned id.
    async fn insert_one(&self, doc: Document) -> StoreResult<ObjectId>;
    /// Merge `patch` into the first record matching `filter`.
    async fn update_one(&self, filter: &Filter, patch: Document) -> StoreResult<()>;
    /// Remove the first record matching `filter`.
    async fn delete_one(&self, filter: &Filter) -> StoreResult<()>;
}

/// Handle to an opened backend; hands out collections by name.
#[derive(Clone)]
pub struct Store {
    inner: Arc<backend::Backend>,
}

impl Store {
    /// Open the backend described by `config`.
    pub async fn open(config: &BackendConfig) -> StoreResult<Self> {
        let inner = backend::Backend::open(config).await?;
        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Shortcut for an empty in-memory store.
    pub fn in_memory() -> Self {
        Self {
            inner: Arc::new(backend::Backend::in_memory()),
        }
    }

    /// Collection handle for `name`. Handles for the same name share data.
    pub fn collection(&self, name: &str) -> Arc<dyn Collection> {
        self.inner.collection(name)
    }

    /// Short backend name (`in_memory`, `mongo`).
    pub fn kind(&self) -> &'static str {
        self.inner.kind()
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("backend", &self.kind())
            .finish()
    }
}
