//! Include tree construction.
//!
//! Include paths are merged into a prefix tree rooted at the query's entity.
//! Each collection node carries the ordering and filter declared for its
//! navigation, so materialization order is fixed per level and independent of
//! the order rows come back from storage.

use navql_proto::{ComposedQuery, FilterExpr, OrderSpec, RelationInclude};
use tracing::{debug, instrument};

use crate::catalog::{Cardinality, Catalog, NavigationMetadata};
use crate::path::resolve::{chain_path, resolve, Resolved};
use crate::path::{split_includes, ClassifiedPathSet};

use super::projection::ProjectionSpec;

/// One materialized navigation in the include tree.
#[derive(Debug, Clone, PartialEq)]
pub struct IncludeNode {
    /// Navigation name as declared on the source entity.
    pub navigation: String,
    /// Canonical dotted path from the root.
    pub path: String,
    /// Entity the navigation starts from.
    pub source_entity: String,
    /// Entity the navigation leads to.
    pub target_entity: String,
    /// Navigation cardinality.
    pub cardinality: Cardinality,
    /// Ordering of the materialized children (collections only).
    pub order_by: Vec<OrderSpec>,
    /// Predicate the materialized children must satisfy (collections only).
    pub filter: Option<FilterExpr>,
    /// Nested includes.
    pub children: Vec<IncludeNode>,
}

impl IncludeNode {
    fn from_navigation(catalog: &Catalog, nav: &NavigationMetadata, path: String) -> Self {
        let (order_by, filter) = if nav.is_collection() {
            (collection_ordering(catalog, nav), nav.filter.clone())
        } else {
            (Vec::new(), None)
        };
        Self {
            navigation: nav.name.clone(),
            path,
            source_entity: nav.source.clone(),
            target_entity: nav.target.clone(),
            cardinality: nav.cardinality,
            order_by,
            filter,
            children: Vec::new(),
        }
    }

    /// Check if this node materializes a collection.
    pub fn is_collection(&self) -> bool {
        self.cardinality == Cardinality::Collection
    }

    /// Depth of this node (1 for top-level).
    pub fn depth(&self) -> usize {
        self.path.matches('.').count() + 1
    }
}

/// Declared ordering plus the target identity as a final ascending key.
pub(crate) fn collection_ordering(catalog: &Catalog, nav: &NavigationMetadata) -> Vec<OrderSpec> {
    let mut order_by = nav.order_by.clone();
    if let Some(target) = catalog.metadata(&nav.target) {
        let identity = &target.identity_field;
        if !order_by
            .iter()
            .any(|o| o.field.eq_ignore_ascii_case(identity))
        {
            order_by.push(OrderSpec::asc(identity.clone()));
        }
    }
    order_by
}

/// A compiled include plan.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    /// Root entity type.
    pub root_entity: String,
    /// Top-level include nodes in first-seen order.
    pub nodes: Vec<IncludeNode>,
    /// Selector paths from classification, canonical casing.
    pub selectors: Vec<String>,
    /// Field-limited projection, set by the projection builder.
    pub projection: Option<ProjectionSpec>,
}

impl QueryPlan {
    /// All include paths, parents before children.
    pub fn include_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        self.walk(|node| paths.push(node.path.clone()));
        paths
    }

    /// Find a node by its canonical path (case-insensitive).
    pub fn find(&self, path: &str) -> Option<&IncludeNode> {
        let mut found = None;
        self.walk(|node| {
            if found.is_none() && node.path.eq_ignore_ascii_case(path) {
                found = Some(node);
            }
        });
        found
    }

    /// Number of include nodes.
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        self.walk(|_| count += 1);
        count
    }

    /// Visit every node depth-first, parents before children.
    pub fn walk<'a, F>(&'a self, mut visit: F)
    where
        F: FnMut(&'a IncludeNode),
    {
        fn go<'a, F: FnMut(&'a IncludeNode)>(nodes: &'a [IncludeNode], visit: &mut F) {
            for node in nodes {
                visit(node);
                go(&node.children, visit);
            }
        }
        go(&self.nodes, &mut visit);
    }

    /// Lower the plan into a composable query.
    pub fn to_query(&self) -> ComposedQuery {
        let mut query = ComposedQuery::new(self.root_entity.clone());
        self.walk(|node| {
            let mut include = RelationInclude::new(node.path.clone());
            include.filter = node.filter.clone();
            include.order_by = node.order_by.clone();
            query.includes.push(include);
        });
        if let Some(projection) = &self.projection {
            query.projection = Some(projection.to_projection());
        }
        query
    }
}

/// Classify `paths` and build the include tree.
///
/// Unresolvable paths are skipped; the root still materializes.
pub fn build_query<S: AsRef<str>>(catalog: &Catalog, root: &str, paths: &[S]) -> QueryPlan {
    let set = split_includes(catalog, root, paths);
    build_query_from(catalog, root, &set)
}

/// Build the include tree from an already classified path set.
#[instrument(level = "debug", skip_all, fields(root = root, includes = set.include_paths().len()))]
pub fn build_query_from(catalog: &Catalog, root: &str, set: &ClassifiedPathSet) -> QueryPlan {
    let root_meta = catalog.metadata(root);
    let mut plan = QueryPlan {
        root_entity: root_meta
            .as_ref()
            .map(|m| m.name.clone())
            .unwrap_or_else(|| root.to_string()),
        nodes: Vec::new(),
        selectors: set.selector_strings(),
        projection: None,
    };
    let Some(root_meta) = root_meta else {
        debug!("unknown root type, building an empty plan");
        return plan;
    };

    for path in set.include_paths() {
        let chain = match resolve(catalog, &root_meta, path) {
            Some(Resolved::Navigation { chain, .. }) => chain,
            _ => {
                debug!(path = %path, "skipping unresolvable include");
                continue;
            }
        };
        insert_chain(catalog, &mut plan.nodes, &chain);
    }

    debug!(nodes = plan.node_count(), "include tree built");
    plan
}

fn insert_chain(catalog: &Catalog, nodes: &mut Vec<IncludeNode>, chain: &[NavigationMetadata]) {
    let mut level = nodes;
    for (i, nav) in chain.iter().enumerate() {
        let pos = match level
            .iter()
            .position(|n| n.navigation.eq_ignore_ascii_case(&nav.name))
        {
            Some(pos) => pos,
            None => {
                let path = chain_path(&chain[..=i]).to_string();
                level.push(IncludeNode::from_navigation(catalog, nav, path));
                level.len() - 1
            }
        };
        level = &mut level[pos].children;
    }
}
