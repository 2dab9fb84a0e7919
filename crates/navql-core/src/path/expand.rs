//! Depth-bounded expansion of navigation paths into scalar leaves.
//!
//! Cycles in the metadata graph (Employee -> Department -> Organisation ->
//! Departments -> Employees -> ...) are bounded, not broken: every branch
//! carries the smallest `max_depth` of the navigations it went through, and a
//! navigation is only entered while the cumulative hop count from the root
//! stays within that budget. The same type may therefore reappear on
//! independent shallow branches.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, instrument, trace};

use crate::catalog::{Catalog, EntityMetadata, NavigationMetadata};

use super::parser::parse;
use super::resolve::{chain_path, resolve, scalar_path, wildcard_navigations, Resolved};

/// Deduplicated, insertion-ordered set of scalar paths.
///
/// Deduplication is case-insensitive; the first spelling wins.
#[derive(Debug, Clone, Default)]
pub struct ScalarClosure {
    paths: Vec<String>,
    seen: HashSet<String>,
}

impl ScalarClosure {
    /// Create an empty closure.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a path unless an equal one is already present.
    pub fn push(&mut self, path: impl Into<String>) -> bool {
        let path = path.into();
        if self.seen.insert(path.to_ascii_lowercase()) {
            self.paths.push(path);
            true
        } else {
            false
        }
    }

    /// Check for a path (case-insensitive).
    pub fn contains(&self, path: &str) -> bool {
        self.seen.contains(&path.to_ascii_lowercase())
    }

    /// Paths in insertion order.
    pub fn as_slice(&self) -> &[String] {
        &self.paths
    }

    /// Iterate over the paths.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }

    /// Number of paths.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Check if the closure is empty.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Consume into the ordered path list.
    pub fn into_vec(self) -> Vec<String> {
        self.paths
    }
}

impl PartialEq for ScalarClosure {
    fn eq(&self, other: &Self) -> bool {
        self.paths == other.paths
    }
}

impl Eq for ScalarClosure {}

impl<'a> IntoIterator for &'a ScalarClosure {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.iter()
    }
}

/// Expand field paths into their closure of scalar leaf paths.
///
/// - A resolved scalar path is kept as given.
/// - A resolved navigation path emits every scalar of its target and, when
///   `expand_nested` is set, recurses into the target's navigations within
///   their depth budget. A collection reached during recursion contributes
///   its own scalars only.
/// - A terminal `*` emits the scalars of its type plus the direct scalars of
///   each of the type's navigations that is still within its depth budget.
/// - An unresolvable path is passed through unchanged.
#[instrument(
    level = "debug",
    skip_all,
    fields(root = root, fields = fields.len(), expand_nested = expand_nested)
)]
pub fn expand_fields_to_scalars<S: AsRef<str>>(
    catalog: &Catalog,
    root: &str,
    fields: &[S],
    expand_nested: bool,
) -> ScalarClosure {
    let root_meta = catalog.metadata(root);
    let mut closure = ScalarClosure::new();

    for raw in fields {
        let raw = raw.as_ref().trim();
        if raw.is_empty() {
            continue;
        }
        let parsed = parse(raw);
        let resolved = root_meta
            .as_ref()
            .and_then(|meta| resolve(catalog, meta, &parsed));

        match resolved {
            None => {
                debug!(path = raw, "passing unresolvable path through");
                closure.push(raw);
            }
            Some(Resolved::Scalar { .. }) => {
                closure.push(parsed.to_string());
            }
            Some(Resolved::Navigation { chain, target }) => {
                let budget = chain.iter().map(|n| n.max_depth).min().unwrap_or(0);
                let mut expander = Expander {
                    catalog,
                    closure: &mut closure,
                    expand_nested,
                };
                let mut chain = chain;
                expander.navigation(&mut chain, &target, budget, false);
            }
            Some(Resolved::Wildcard { chain, target }) => {
                let mut expander = Expander {
                    catalog,
                    closure: &mut closure,
                    expand_nested: false,
                };
                expander.scalars(&chain, &target);
                let reachable = wildcard_navigations(catalog, &chain, &target);
                let mut chain = chain;
                for (nav, nav_target) in reachable {
                    chain.push(nav);
                    expander.scalars(&chain, &nav_target);
                    chain.pop();
                }
            }
        }
    }

    closure
}

struct Expander<'a> {
    catalog: &'a Catalog,
    closure: &'a mut ScalarClosure,
    expand_nested: bool,
}

impl Expander<'_> {
    fn scalars(&mut self, chain: &[NavigationMetadata], target: &EntityMetadata) {
        for field in target.scalar_names() {
            self.closure.push(scalar_path(chain, field).to_string());
        }
    }

    /// Emit the scalars of `target` (reached through `chain`) and descend.
    ///
    /// `budget` is the smallest `max_depth` along `chain`.
    fn navigation(
        &mut self,
        chain: &mut Vec<NavigationMetadata>,
        target: &Arc<EntityMetadata>,
        budget: u32,
        reached_by_expansion: bool,
    ) {
        self.scalars(chain, target);

        if !self.expand_nested {
            return;
        }
        if reached_by_expansion && chain.last().map(|n| n.is_collection()).unwrap_or(false) {
            return;
        }

        let depth = chain.len() as u32 + 1;
        for nav in &target.navigations {
            let limit = budget.min(nav.max_depth);
            if depth > limit {
                trace!(
                    path = %chain_path(chain),
                    navigation = %nav.name,
                    depth,
                    limit,
                    "depth limit reached"
                );
                continue;
            }
            let Some(next) = self.catalog.metadata(&nav.target) else {
                continue;
            };
            chain.push(nav.clone());
            self.navigation(chain, &next, limit, true);
            chain.pop();
        }
    }
}
