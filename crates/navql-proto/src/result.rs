//! Result types returned by query engines.

use crate::value::Value;
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

/// One materialized entity with its included relations.
#[derive(Debug, Clone, PartialEq, SerdeSerialize, SerdeDeserialize)]
pub struct Document {
    /// Entity type name.
    pub entity: String,
    /// Scalar fields in declaration order.
    pub fields: Vec<(String, Value)>,
    /// Materialized relations in include order.
    pub relations: Vec<(String, Related)>,
}

/// A materialized relation value.
#[derive(Debug, Clone, PartialEq, SerdeSerialize, SerdeDeserialize)]
pub enum Related {
    /// To-one relation; `None` when no target row exists.
    One(Option<Box<Document>>),
    /// To-many relation in materialization order.
    Many(Vec<Document>),
}

impl Document {
    /// Create a document without relations.
    pub fn new(entity: impl Into<String>, fields: Vec<(String, Value)>) -> Self {
        Self {
            entity: entity.into(),
            fields,
            relations: vec![],
        }
    }

    /// Get a scalar field value by name.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == field).map(|(_, v)| v)
    }

    /// Get a materialized relation by navigation name.
    pub fn relation(&self, name: &str) -> Option<&Related> {
        self.relations.iter().find(|(n, _)| n == name).map(|(_, r)| r)
    }

    /// Get a to-one relation target.
    pub fn one(&self, name: &str) -> Option<&Document> {
        match self.relation(name)? {
            Related::One(target) => target.as_deref(),
            Related::Many(_) => None,
        }
    }

    /// Get the members of a to-many relation.
    pub fn many(&self, name: &str) -> &[Document] {
        match self.relation(name) {
            Some(Related::Many(items)) => items,
            _ => &[],
        }
    }
}

/// One row of a flattened query.
#[derive(Debug, Clone, PartialEq, SerdeSerialize, SerdeDeserialize)]
pub struct FlatRow {
    /// Slot values in slot order.
    pub values: Vec<(String, Value)>,
}

impl FlatRow {
    /// Get a slot value by name.
    pub fn get(&self, slot: &str) -> Option<&Value> {
        self.values.iter().find(|(n, _)| n == slot).map(|(_, v)| v)
    }
}

/// The result of executing a composed query.
#[derive(Debug, Clone, PartialEq, SerdeSerialize, SerdeDeserialize)]
pub enum QueryResult {
    /// Object graph results (include / projection queries).
    Documents(Vec<Document>),
    /// Flat rows (flattened queries).
    Rows(Vec<FlatRow>),
}

impl QueryResult {
    /// Number of top-level results.
    pub fn len(&self) -> usize {
        match self {
            QueryResult::Documents(docs) => docs.len(),
            QueryResult::Rows(rows) => rows.len(),
        }
    }

    /// Check if the result is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Documents, or an empty slice for row results.
    pub fn documents(&self) -> &[Document] {
        match self {
            QueryResult::Documents(docs) => docs,
            QueryResult::Rows(_) => &[],
        }
    }

    /// Rows, or an empty slice for document results.
    pub fn rows(&self) -> &[FlatRow] {
        match self {
            QueryResult::Rows(rows) => rows,
            QueryResult::Documents(_) => &[],
        }
    }
}
