//! Navigation properties and their declarative decorations.

use navql_proto::{FilterExpr, OrderSpec};

/// Cardinality of a navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// To-one reference.
    Singular,
    /// To-many collection.
    Collection,
}

/// A navigation property as registered on its owner.
///
/// Rows are related when the target's `to_field` equals the source's
/// `from_field`.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationDef {
    /// Property name on the owning entity.
    pub name: String,
    /// Target entity name.
    pub target: String,
    /// Navigation cardinality.
    pub cardinality: Cardinality,
    /// Key field on the owning entity.
    pub from_field: String,
    /// Key field on the target entity.
    pub to_field: String,
}

impl NavigationDef {
    /// Create a to-one navigation.
    pub fn singular(
        name: impl Into<String>,
        target: impl Into<String>,
        from_field: impl Into<String>,
        to_field: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            cardinality: Cardinality::Singular,
            from_field: from_field.into(),
            to_field: to_field.into(),
        }
    }

    /// Create a to-many navigation.
    pub fn collection(
        name: impl Into<String>,
        target: impl Into<String>,
        from_field: impl Into<String>,
        to_field: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            cardinality: Cardinality::Collection,
            from_field: from_field.into(),
            to_field: to_field.into(),
        }
    }
}

/// Declarative decoration attached to `(owner, property)` in the catalog's
/// side-table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NavigationDecoration {
    /// Ordering keys applied when the collection is materialized.
    pub order_by: Vec<OrderSpec>,
    /// Predicate the materialized children must satisfy.
    pub filter: Option<FilterExpr>,
    /// Max recursion depth; `None` falls back to the catalog default.
    pub max_depth: Option<u32>,
}

impl NavigationDecoration {
    /// Create an empty decoration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an ordering key.
    pub fn order_by(mut self, order: OrderSpec) -> Self {
        self.order_by.push(order);
        self
    }

    /// Set the filter predicate.
    pub fn filter(mut self, filter: FilterExpr) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Set the max recursion depth.
    pub fn max_depth(mut self, depth: u32) -> Self {
        self.max_depth = Some(depth);
        self
    }
}

/// Resolved navigation: definition merged with its decoration.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationMetadata {
    /// Property name as declared.
    pub name: String,
    /// Owning entity name.
    pub source: String,
    /// Target entity name as declared on the target.
    pub target: String,
    /// Navigation cardinality.
    pub cardinality: Cardinality,
    /// Key field on the owning entity.
    pub from_field: String,
    /// Key field on the target entity.
    pub to_field: String,
    /// Declared ordering keys (empty if none).
    pub order_by: Vec<OrderSpec>,
    /// Declared filter predicate.
    pub filter: Option<FilterExpr>,
    /// Effective max recursion depth.
    pub max_depth: u32,
}

impl NavigationMetadata {
    /// Check if this navigation is to-many.
    pub fn is_collection(&self) -> bool {
        self.cardinality == Cardinality::Collection
    }
}
