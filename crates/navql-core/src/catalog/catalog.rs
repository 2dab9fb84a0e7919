//! Metadata catalog with a memoized, read-only view per entity type.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, trace};

use super::entity::{EntityDef, FieldDef};
use super::navigation::{NavigationDecoration, NavigationMetadata};
use crate::config::{CompilerConfig, DEFAULT_MAX_DEPTH};
use crate::error::Error;

/// Case-insensitive lookup key.
fn key(name: &str) -> String {
    name.to_ascii_lowercase()
}

/// Resolved, immutable metadata for one entity type.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityMetadata {
    /// Entity name as declared.
    pub name: String,
    /// Identity field name.
    pub identity_field: String,
    /// Scalar properties in declaration order.
    pub scalars: Vec<FieldDef>,
    /// Navigation properties in declaration order, decorations applied.
    pub navigations: Vec<NavigationMetadata>,
}

/// A member of an entity resolved by name.
#[derive(Debug, Clone, Copy)]
pub enum Member<'a> {
    /// A scalar property.
    Scalar(&'a FieldDef),
    /// A navigation property.
    Navigation(&'a NavigationMetadata),
}

impl EntityMetadata {
    /// Get a scalar property (case-insensitive).
    pub fn scalar(&self, name: &str) -> Option<&FieldDef> {
        self.scalars.iter().find(|f| f.name.eq_ignore_ascii_case(name))
    }

    /// Get a navigation property (case-insensitive).
    pub fn navigation(&self, name: &str) -> Option<&NavigationMetadata> {
        self.navigations
            .iter()
            .find(|n| n.name.eq_ignore_ascii_case(name))
    }

    /// Resolve any member by name.
    pub fn member(&self, name: &str) -> Option<Member<'_>> {
        if let Some(field) = self.scalar(name) {
            return Some(Member::Scalar(field));
        }
        self.navigation(name).map(Member::Navigation)
    }

    /// Names of all scalar properties.
    pub fn scalar_names(&self) -> impl Iterator<Item = &str> {
        self.scalars.iter().map(|f| f.name.as_str())
    }
}

/// Registration pass for a [`Catalog`].
///
/// Entities and decorations are collected here, validated once in
/// [`CatalogBuilder::build`], and never mutated afterwards.
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    entities: Vec<EntityDef>,
    decorations: Vec<(String, String, NavigationDecoration)>,
    default_max_depth: Option<u32>,
}

impl CatalogBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take defaults from a compiler configuration.
    pub fn with_config(mut self, config: &CompilerConfig) -> Self {
        self.default_max_depth = Some(config.default_max_depth);
        self
    }

    /// Set the recursion depth for undecorated navigations.
    pub fn default_max_depth(mut self, depth: u32) -> Self {
        self.default_max_depth = Some(depth);
        self
    }

    /// Register an entity.
    pub fn entity(mut self, entity: EntityDef) -> Self {
        self.entities.push(entity);
        self
    }

    /// Attach a decoration to `owner.property`.
    pub fn decorate(
        mut self,
        owner: impl Into<String>,
        property: impl Into<String>,
        decoration: NavigationDecoration,
    ) -> Self {
        self.decorations
            .push((owner.into(), property.into(), decoration));
        self
    }

    /// Validate the registrations and freeze them into a catalog.
    pub fn build(self) -> Result<Catalog, Error> {
        let mut entities: HashMap<String, EntityDef> = HashMap::new();
        for entity in self.entities {
            validate_members(&entity)?;
            if entities.insert(key(&entity.name), entity.clone()).is_some() {
                return Err(Error::InvalidSchema(format!(
                    "entity '{}' registered twice",
                    entity.name
                )));
            }
        }

        for entity in entities.values() {
            for nav in &entity.navigations {
                let target = entities.get(&key(&nav.target)).ok_or_else(|| {
                    Error::InvalidSchema(format!(
                        "navigation '{}.{}' targets unknown entity '{}'",
                        entity.name, nav.name, nav.target
                    ))
                })?;
                if entity.get_field(&nav.from_field).is_none() {
                    return Err(Error::InvalidSchema(format!(
                        "navigation '{}.{}' uses unknown key field '{}'",
                        entity.name, nav.name, nav.from_field
                    )));
                }
                if target.get_field(&nav.to_field).is_none() {
                    return Err(Error::InvalidSchema(format!(
                        "navigation '{}.{}' uses unknown target key field '{}.{}'",
                        entity.name, nav.name, target.name, nav.to_field
                    )));
                }
            }
        }

        let mut decorations = HashMap::new();
        for (owner, property, decoration) in self.decorations {
            let entity = entities.get(&key(&owner)).ok_or_else(|| {
                Error::InvalidSchema(format!("decoration on unknown entity '{}'", owner))
            })?;
            let nav = entity.get_navigation(&property).ok_or_else(|| {
                Error::InvalidSchema(format!(
                    "decoration on unknown navigation '{}.{}'",
                    owner, property
                ))
            })?;
            // Navigation targets were validated above.
            if let Some(target) = entities.get(&key(&nav.target)) {
                for order in &decoration.order_by {
                    if target.get_field(&order.field).is_none() {
                        return Err(Error::InvalidSchema(format!(
                            "ordering key '{}' is not a scalar of '{}'",
                            order.field, target.name
                        )));
                    }
                }
            }
            decorations.insert((key(&owner), key(&property)), decoration);
        }

        debug!(
            entities = entities.len(),
            decorations = decorations.len(),
            "catalog built"
        );

        Ok(Catalog {
            entities,
            decorations,
            default_max_depth: self.default_max_depth.unwrap_or(DEFAULT_MAX_DEPTH),
            resolved: DashMap::new(),
        })
    }
}

fn validate_members(entity: &EntityDef) -> Result<(), Error> {
    let mut seen = std::collections::HashSet::new();
    let names = entity
        .fields
        .iter()
        .map(|f| f.name.as_str())
        .chain(entity.navigations.iter().map(|n| n.name.as_str()));
    for name in names {
        if name.is_empty() || name == "*" || name.contains('.') {
            return Err(Error::InvalidSchema(format!(
                "invalid member name '{}' on '{}'",
                name, entity.name
            )));
        }
        if !seen.insert(key(name)) {
            return Err(Error::InvalidSchema(format!(
                "member '{}' declared twice on '{}'",
                name, entity.name
            )));
        }
    }
    if entity.get_field(&entity.identity_field).is_none() {
        return Err(Error::InvalidSchema(format!(
            "identity field '{}' is not a scalar of '{}'",
            entity.identity_field, entity.name
        )));
    }
    Ok(())
}

/// Entity metadata catalog.
///
/// Registrations are immutable after [`CatalogBuilder::build`]. The resolved
/// per-type view is computed on first use and memoized; concurrent first use
/// resolves each type exactly once.
#[derive(Debug)]
pub struct Catalog {
    entities: HashMap<String, EntityDef>,
    decorations: HashMap<(String, String), NavigationDecoration>,
    default_max_depth: u32,
    resolved: DashMap<String, Arc<EntityMetadata>>,
}

impl Catalog {
    /// Start a registration pass.
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::new()
    }

    /// Get the resolved metadata of an entity type.
    pub fn metadata(&self, entity: &str) -> Option<Arc<EntityMetadata>> {
        let k = key(entity);
        if let Some(hit) = self.resolved.get(&k) {
            return Some(Arc::clone(hit.value()));
        }
        let def = self.entities.get(&k)?;
        let entry = self
            .resolved
            .entry(k)
            .or_insert_with(|| {
                trace!(entity = %def.name, "resolving entity metadata");
                Arc::new(self.resolve(def))
            });
        Some(Arc::clone(entry.value()))
    }

    /// Scalar properties of a type (empty for unknown types).
    pub fn scalars_of(&self, entity: &str) -> Vec<FieldDef> {
        self.metadata(entity)
            .map(|m| m.scalars.clone())
            .unwrap_or_default()
    }

    /// Navigation properties of a type (empty for unknown types).
    pub fn navigations_of(&self, entity: &str) -> Vec<NavigationMetadata> {
        self.metadata(entity)
            .map(|m| m.navigations.clone())
            .unwrap_or_default()
    }

    /// Resolved decoration of `entity.property`.
    pub fn decoration_of(&self, entity: &str, property: &str) -> Option<NavigationMetadata> {
        self.metadata(entity)?.navigation(property).cloned()
    }

    /// Names of all registered entities.
    pub fn entity_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entities.values().map(|e| e.name.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Recursion depth applied to undecorated navigations.
    pub fn default_max_depth(&self) -> u32 {
        self.default_max_depth
    }

    /// Number of entity types resolved so far.
    pub fn resolved_count(&self) -> usize {
        self.resolved.len()
    }

    fn resolve(&self, def: &EntityDef) -> EntityMetadata {
        let navigations = def
            .navigations
            .iter()
            .map(|nav| {
                let decoration = self.decorations.get(&(key(&def.name), key(&nav.name)));
                let target = self
                    .entities
                    .get(&key(&nav.target))
                    .map(|t| t.name.clone())
                    .unwrap_or_else(|| nav.target.clone());
                NavigationMetadata {
                    name: nav.name.clone(),
                    source: def.name.clone(),
                    target,
                    cardinality: nav.cardinality,
                    from_field: nav.from_field.clone(),
                    to_field: nav.to_field.clone(),
                    order_by: decoration.map(|d| d.order_by.clone()).unwrap_or_default(),
                    filter: decoration.and_then(|d| d.filter.clone()),
                    max_depth: decoration
                        .and_then(|d| d.max_depth)
                        .unwrap_or(self.default_max_depth),
                }
            })
            .collect();

        EntityMetadata {
            name: def.name.clone(),
            identity_field: def.identity_field.clone(),
            scalars: def.fields.clone(),
            navigations,
        }
    }
}
