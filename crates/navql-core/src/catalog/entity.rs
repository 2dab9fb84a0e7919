//! Entity definitions.

use super::navigation::NavigationDef;
use super::types::ScalarType;

/// A scalar property of an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    /// Field name as declared.
    pub name: String,
    /// Field data type.
    pub scalar_type: ScalarType,
}

impl FieldDef {
    /// Create a new field definition.
    pub fn new(name: impl Into<String>, scalar_type: ScalarType) -> Self {
        Self {
            name: name.into(),
            scalar_type,
        }
    }
}

/// An entity registration: scalar fields plus navigation properties.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityDef {
    /// Entity name (unique within a catalog, case-insensitively).
    pub name: String,
    /// Name of the identity field.
    pub identity_field: String,
    /// Scalar properties in declaration order.
    pub fields: Vec<FieldDef>,
    /// Navigation properties in declaration order.
    pub navigations: Vec<NavigationDef>,
}

impl EntityDef {
    /// Create a new entity definition.
    pub fn new(name: impl Into<String>, identity_field: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identity_field: identity_field.into(),
            fields: Vec::new(),
            navigations: Vec::new(),
        }
    }

    /// Add a scalar field.
    pub fn with_field(mut self, name: impl Into<String>, scalar_type: ScalarType) -> Self {
        self.fields.push(FieldDef::new(name, scalar_type));
        self
    }

    /// Add a navigation property.
    pub fn with_navigation(mut self, navigation: NavigationDef) -> Self {
        self.navigations.push(navigation);
        self
    }

    /// Get a field by name (case-insensitive).
    pub fn get_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name.eq_ignore_ascii_case(name))
    }

    /// Get a navigation by name (case-insensitive).
    pub fn get_navigation(&self, name: &str) -> Option<&NavigationDef> {
        self.navigations
            .iter()
            .find(|n| n.name.eq_ignore_ascii_case(name))
    }
}
