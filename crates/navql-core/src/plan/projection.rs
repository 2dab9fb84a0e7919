//! Field-limited projection over the include tree.

use navql_proto::{FieldSelection, Projection};
use tracing::{debug, instrument};

use crate::catalog::Catalog;
use crate::error::Error;
use crate::path::{expand_fields_to_scalars, split_includes};

use super::include::{build_query_from, QueryPlan};

/// Requested scalars of one materialized level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelSelection {
    /// Navigation path of the level, empty for the root.
    pub path: String,
    /// Entity materialized at this level.
    pub entity: String,
    /// Scalars that keep their stored value.
    pub fields: Vec<String>,
}

/// Per-level scalar selection for a projected object graph.
///
/// Every materialized level has an entry; scalars not listed are returned as
/// their type's default value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProjectionSpec {
    levels: Vec<LevelSelection>,
}

impl ProjectionSpec {
    /// Levels in root-first, parent-before-child order.
    pub fn levels(&self) -> &[LevelSelection] {
        &self.levels
    }

    /// Requested fields at a level (case-insensitive path match).
    pub fn fields_at(&self, path: &str) -> Option<&[String]> {
        self.levels
            .iter()
            .find(|l| l.path.eq_ignore_ascii_case(path))
            .map(|l| l.fields.as_slice())
    }

    /// Total number of requested scalars.
    pub fn field_count(&self) -> usize {
        self.levels.iter().map(|l| l.fields.len()).sum()
    }

    /// Lower into the IR projection.
    pub fn to_projection(&self) -> Projection {
        Projection {
            selections: self
                .levels
                .iter()
                .map(|l| FieldSelection {
                    path: l.path.clone(),
                    fields: l.fields.clone(),
                })
                .collect(),
        }
    }
}

/// Build an include plan that projects only the requested scalars.
///
/// Navigation entries are expanded to their scalar closure first (recursing
/// into nested navigations when `expand_nested` is set), then the minimal set
/// of navigations that reaches every leaf is materialized.
#[instrument(level = "debug", skip_all, fields(root = root, fields = fields.len()))]
pub fn build_projection_query<S: AsRef<str>>(
    catalog: &Catalog,
    root: &str,
    fields: &[S],
    expand_nested: bool,
) -> Result<QueryPlan, Error> {
    if fields.iter().all(|f| f.as_ref().trim().is_empty()) {
        return Err(Error::InvalidArgument(
            "projection requires at least one field path".to_string(),
        ));
    }

    let closure = expand_fields_to_scalars(catalog, root, fields, expand_nested);
    let set = split_includes(catalog, root, closure.as_slice());
    let mut plan = build_query_from(catalog, root, &set);

    let mut levels = vec![LevelSelection {
        path: String::new(),
        entity: plan.root_entity.clone(),
        fields: Vec::new(),
    }];
    plan.walk(|node| {
        levels.push(LevelSelection {
            path: node.path.clone(),
            entity: node.target_entity.clone(),
            fields: Vec::new(),
        });
    });

    for selector in set.selector_paths() {
        let level_path = selector
            .parent()
            .map(|p| p.to_string())
            .unwrap_or_default();
        let Some(field) = selector.last() else {
            continue;
        };
        if let Some(level) = levels
            .iter_mut()
            .find(|l| l.path.eq_ignore_ascii_case(&level_path))
        {
            level.fields.push(field.name.clone());
        }
    }

    let projection = ProjectionSpec { levels };
    debug!(
        levels = projection.levels.len(),
        fields = projection.field_count(),
        "projection built"
    );
    plan.projection = Some(projection);
    Ok(plan)
}
