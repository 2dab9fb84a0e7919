//! Entity metadata catalog.
//!
//! The catalog holds, per entity type, its scalar properties and navigation
//! properties, plus a typed side-table of navigation decorations (ordering
//! keys, filter predicate, max recursion depth) keyed by `(owner, property)`.

mod catalog;
mod entity;
mod navigation;
mod types;

pub use catalog::{Catalog, CatalogBuilder, EntityMetadata, Member};
pub use entity::{EntityDef, FieldDef};
pub use navigation::{Cardinality, NavigationDecoration, NavigationDef, NavigationMetadata};
pub use types::ScalarType;
