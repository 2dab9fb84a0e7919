//! Splitting raw paths into include paths and selector paths.

use std::collections::HashSet;

use tracing::{debug, instrument};

use crate::catalog::Catalog;

use super::parser::{parse, ParsedPath, PathSegment};
use super::resolve::{chain_path, resolve, scalar_path, Resolved};

/// Include and selector paths derived from a raw path set.
///
/// Paths are in canonical (declared) casing, deduplicated and in first-seen
/// order. No include path is a proper prefix of another.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifiedPathSet {
    include_paths: Vec<ParsedPath>,
    selector_paths: Vec<ParsedPath>,
}

impl ClassifiedPathSet {
    /// Build a set from already classified paths, minimizing the includes.
    pub fn new(include_paths: Vec<ParsedPath>, selector_paths: Vec<ParsedPath>) -> Self {
        Self {
            include_paths: minimize_includes(dedup(include_paths)),
            selector_paths: dedup(selector_paths),
        }
    }

    /// Structural paths that must be materialized.
    pub fn include_paths(&self) -> &[ParsedPath] {
        &self.include_paths
    }

    /// Scalar leaves to project.
    pub fn selector_paths(&self) -> &[ParsedPath] {
        &self.selector_paths
    }

    /// Include paths as dotted strings.
    pub fn include_strings(&self) -> Vec<String> {
        self.include_paths.iter().map(ToString::to_string).collect()
    }

    /// Selector paths as dotted strings.
    pub fn selector_strings(&self) -> Vec<String> {
        self.selector_paths.iter().map(ToString::to_string).collect()
    }

    /// Check if nothing was classified.
    pub fn is_empty(&self) -> bool {
        self.include_paths.is_empty() && self.selector_paths.is_empty()
    }
}

/// Classify raw paths against the metadata of `root`.
///
/// Unresolvable paths are dropped without error. A navigation-terminal path is
/// an include only; a scalar-terminal path is a selector and contributes its
/// navigation prefix as an include; a terminal `*` contributes one include per
/// direct navigation of the type it is applied to.
#[instrument(level = "debug", skip_all, fields(root = root, paths = paths.len()))]
pub fn split_includes<S: AsRef<str>>(
    catalog: &Catalog,
    root: &str,
    paths: &[S],
) -> ClassifiedPathSet {
    let Some(root_meta) = catalog.metadata(root) else {
        debug!("unknown root type, nothing to classify");
        return ClassifiedPathSet::default();
    };

    let mut includes = Vec::new();
    let mut selectors = Vec::new();

    for raw in paths {
        let raw = raw.as_ref();
        let parsed = parse(raw);
        if parsed.is_empty() {
            continue;
        }

        match resolve(catalog, &root_meta, &parsed) {
            None => debug!(path = raw, "dropping unresolvable path"),
            Some(Resolved::Scalar { chain, field }) => {
                selectors.push(scalar_path(&chain, &field.name));
                if !chain.is_empty() {
                    includes.push(chain_path(&chain));
                }
            }
            Some(Resolved::Navigation { chain, .. }) => includes.push(chain_path(&chain)),
            Some(Resolved::Wildcard { chain, target }) => {
                let base = chain_path(&chain);
                if target.navigations.is_empty() && !base.is_empty() {
                    includes.push(base);
                    continue;
                }
                for nav in &target.navigations {
                    includes.push(base.child(PathSegment::named(nav.name.clone())));
                }
            }
        }
    }

    let set = ClassifiedPathSet::new(includes, selectors);
    debug!(
        includes = set.include_paths.len(),
        selectors = set.selector_paths.len(),
        "classified paths"
    );
    set
}

fn dedup(paths: Vec<ParsedPath>) -> Vec<ParsedPath> {
    let mut seen = HashSet::new();
    paths
        .into_iter()
        .filter(|p| seen.insert(p.normalized()))
        .collect()
}

/// Drop every path that is a proper prefix of another retained path.
pub(crate) fn minimize_includes(paths: Vec<ParsedPath>) -> Vec<ParsedPath> {
    paths
        .iter()
        .filter(|p| !paths.iter().any(|q| p.is_proper_prefix_of(q)))
        .cloned()
        .collect()
}
