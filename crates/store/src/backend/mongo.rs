//! MongoDB backend.
//!
//! Records keep their storage key in `_id` as a native BSON object id, so
//! collections written by other tools remain readable. Field values cross
//! the BSON boundary through relaxed extended JSON.

use crate::{Collection, Document, Filter, ObjectId, Record, StoreError, StoreResult};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{self, doc, oid, Bson, Document as BsonDocument};
use mongodb::{Client, Database};

/// Connect and select the database named in the URI path.
pub(crate) async fn connect(uri: &str) -> StoreResult<Database> {
    let client = Client::with_uri_str(uri)
        .await
        .map_err(StoreError::backend)?;
    let db = client
        .default_database()
        .ok_or_else(|| StoreError::backend("mongo uri does not name a database"))?;
    tracing::info!(database = %db.name(), "connected to mongo");
    Ok(db)
}

pub struct MongoCollection {
    name: String,
    inner: mongodb::Collection<BsonDocument>,
}

impl MongoCollection {
    pub fn new(db: &Database, name: &str) -> Self {
        Self {
            name: name.to_string(),
            inner: db.collection::<BsonDocument>(name),
        }
    }
}

fn to_oid(id: ObjectId) -> Bson {
    Bson::ObjectId(oid::ObjectId::from_bytes(id.bytes()))
}

fn filter_to_bson(filter: &Filter) -> StoreResult<BsonDocument> {
    let mut out = BsonDocument::new();
    if let Some(id) = filter.id() {
        out.insert("_id", to_oid(id));
    }
    for (field, value) in filter.clauses() {
        let value = bson::to_bson(value).map_err(|e| StoreError::Serialization(e.to_string()))?;
        out.insert(field.clone(), value);
    }
    Ok(out)
}

fn document_to_bson(doc: &Document) -> StoreResult<BsonDocument> {
    bson::to_document(doc).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn record_from_bson(mut raw: BsonDocument) -> StoreResult<Record> {
    let id = match raw.remove("_id") {
        Some(Bson::ObjectId(oid)) => ObjectId::from_bytes(oid.bytes()),
        Some(Bson::String(s)) => s.parse()?,
        other => {
            return Err(StoreError::Serialization(format!(
                "unsupported _id value: {other:?}"
            )))
        }
    };
    let fields = match Bson::Document(raw).into_relaxed_extjson() {
        serde_json::Value::Object(map) => map,
        _ => Document::new(),
    };
    Ok(Record::new(id, fields))
}

#[async_trait]
impl Collection for MongoCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn find_one(&self, filter: &Filter) -> StoreResult<Option<Record>> {
        let found = self
            .inner
            .find_one(filter_to_bson(filter)?, None)
            .await
            .map_err(StoreError::backend)?;
        found.map(record_from_bson).transpose()
    }

    async fn find(&self, filter: &Filter) -> StoreResult<Vec<Record>> {
        let cursor = self
            .inner
            .find(filter_to_bson(filter)?, None)
            .await
            .map_err(StoreError::backend)?;
        let raw: Vec<BsonDocument> = cursor.try_collect().await.map_err(StoreError::backend)?;
        raw.into_iter().map(record_from_bson).collect()
    }

    async fn insert_one(&self, doc: Document) -> StoreResult<ObjectId> {
        let id = ObjectId::new();
        let mut raw = document_to_bson(&doc)?;
        raw.insert("_id", to_oid(id));
        self.inner
            .insert_one(raw, None)
            .await
            .map_err(StoreError::backend)?;
        Ok(id)
    }

    async fn update_one(&self, filter: &Filter, mut patch: Document) -> StoreResult<()> {
        patch.remove("_id");
        if patch.is_empty() {
            return Ok(());
        }
        let update = doc! { "$set": document_to_bson(&patch)? };
        self.inner
            .update_one(filter_to_bson(filter)?, update, None)
            .await
            .map_err(StoreError::backend)?;
        Ok(())
    }

    async fn delete_one(&self, filter: &Filter) -> StoreResult<()> {
        self.inner
            .delete_one(filter_to_bson(filter)?, None)
            .await
            .map_err(StoreError::backend)?;
        Ok(())
    }
}
