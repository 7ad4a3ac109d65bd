use crate::{ObjectId, Record};
use serde_json::Value;

/// Conjunction of equality clauses over record fields.
///
/// `_id` clauses compare against the record key; every other clause compares
/// the JSON value of the named field. A missing field never matches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    id: Option<ObjectId>,
    clauses: Vec<(String, Value)>,
}

impl Filter {
    /// Matches every record.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_id(id: ObjectId) -> Self {
        Self {
            id: Some(id),
            clauses: Vec::new(),
        }
    }

    /// Add an equality clause on `field`.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.push((field.into(), value.into()));
        self
    }

    pub fn id(&self) -> Option<ObjectId> {
        self.id
    }

    pub fn clauses(&self) -> &[(String, Value)] {
        &self.clauses
    }

    pub fn matches(&self, record: &Record) -> bool {
        if let Some(id) = self.id {
            if record.id != id {
                return false;
            }
        }
        self.clauses
            .iter()
            .all(|(field, value)| record.fields.get(field) == Some(value))
    }
}
