//! Walking parsed paths against the catalog.

use std::sync::Arc;

use tracing::trace;

use crate::catalog::{Catalog, EntityMetadata, FieldDef, Member, NavigationMetadata};

use super::parser::{ParsedPath, PathSegment};

/// A path whose every segment matched the metadata.
#[derive(Debug, Clone)]
pub(crate) enum Resolved {
    /// Navigation chain ending in a scalar.
    Scalar {
        chain: Vec<NavigationMetadata>,
        field: FieldDef,
    },
    /// Non-empty navigation chain.
    Navigation {
        chain: Vec<NavigationMetadata>,
        target: Arc<EntityMetadata>,
    },
    /// Navigation chain (possibly empty) followed by `*`.
    Wildcard {
        chain: Vec<NavigationMetadata>,
        target: Arc<EntityMetadata>,
    },
}

/// Resolve `path` starting at `root`, case-insensitively.
///
/// Returns `None` if any segment fails to match, if `*` appears anywhere but
/// the last position, or if the path is empty.
pub(crate) fn resolve(
    catalog: &Catalog,
    root: &Arc<EntityMetadata>,
    path: &ParsedPath,
) -> Option<Resolved> {
    if path.is_empty() {
        return None;
    }

    let mut current = Arc::clone(root);
    let mut chain: Vec<NavigationMetadata> = Vec::new();
    let last = path.len() - 1;

    for (i, segment) in path.segments().iter().enumerate() {
        if segment.is_wildcard {
            return (i == last).then(|| Resolved::Wildcard {
                chain: chain.clone(),
                target: Arc::clone(&current),
            });
        }
        let nav = match current.member(&segment.name)? {
            Member::Scalar(field) => {
                return (i == last).then(|| Resolved::Scalar {
                    chain: chain.clone(),
                    field: field.clone(),
                });
            }
            Member::Navigation(nav) => nav.clone(),
        };
        current = catalog.metadata(&nav.target)?;
        chain.push(nav);
    }

    Some(Resolved::Navigation {
        chain,
        target: current,
    })
}

/// Canonical (declared-case) path for a navigation chain.
pub(crate) fn chain_path(chain: &[NavigationMetadata]) -> ParsedPath {
    ParsedPath::from_segments(
        chain
            .iter()
            .map(|nav| PathSegment::named(nav.name.clone()))
            .collect(),
    )
}

/// Canonical path for a navigation chain followed by a scalar.
pub(crate) fn scalar_path(chain: &[NavigationMetadata], field: &str) -> ParsedPath {
    chain_path(chain).child(PathSegment::named(field))
}

/// Direct navigations of `target` that a terminal `*` after `chain` reaches.
///
/// A navigation is skipped once the hop count from the root would exceed the
/// smaller of its own `max_depth` and the budget carried by `chain`.
pub(crate) fn wildcard_navigations(
    catalog: &Catalog,
    chain: &[NavigationMetadata],
    target: &EntityMetadata,
) -> Vec<(NavigationMetadata, Arc<EntityMetadata>)> {
    let budget = chain.iter().map(|n| n.max_depth).min().unwrap_or(u32::MAX);
    let depth = chain.len() as u32 + 1;
    target
        .navigations
        .iter()
        .filter(|nav| {
            let limit = budget.min(nav.max_depth);
            if depth > limit {
                trace!(
                    navigation = %nav.name,
                    depth,
                    limit,
                    "wildcard navigation out of budget"
                );
                return false;
            }
            true
        })
        .filter_map(|nav| Some((nav.clone(), catalog.metadata(&nav.target)?)))
        .collect()
}

/// Check if a chain crosses a to-many navigation.
pub(crate) fn crosses_collection(chain: &[NavigationMetadata]) -> bool {
    chain.iter().any(NavigationMetadata::is_collection)
}
