//! Flattening of nested relations into one row set.
//!
//! Field paths are compiled into a tree of join steps, one per distinct
//! navigation chain, and a list of projection slots. To-one hops dereference;
//! to-many hops flatten (cross join). The plan lowers to a [`FlattenSpec`]
//! that an engine evaluates as a whole, so caller-side filters, `distinct`,
//! counting and pagination still run inside the engine.

use navql_proto::{ComposedQuery, FilterExpr, FlattenSpec, JoinSpec, OrderSpec, SlotSpec};
use std::collections::HashSet;
use tracing::{debug, instrument};

use crate::catalog::{Catalog, EntityMetadata, NavigationMetadata};
use crate::error::Error;
use crate::path::parse;
use crate::path::resolve::{
    chain_path, crosses_collection, resolve, scalar_path, wildcard_navigations, Resolved,
};

use super::include::collection_ordering;

/// How a join step follows its navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// To-one: at most one row, never multiplies.
    Dereference,
    /// To-many: one output row per element.
    Flatten,
}

/// One join step, shared by every slot below its navigation chain.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinStep {
    /// Position in [`FlatteningPlan::steps`].
    pub id: usize,
    /// Parent step, `None` when joined to the root.
    pub parent: Option<usize>,
    /// Navigation name as declared.
    pub navigation: String,
    /// Canonical navigation chain from the root.
    pub path: String,
    /// Entity joined from.
    pub source_entity: String,
    /// Entity joined to.
    pub target_entity: String,
    /// Dereference or flatten.
    pub kind: JoinKind,
    /// Ordering of flattened elements within their parent.
    pub order_by: Vec<OrderSpec>,
    /// Predicate flattened elements must satisfy.
    pub filter: Option<FilterExpr>,
}

/// Whether a slot is multiplied by crossed collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    /// Read along a to-one chain; copied once per root combination.
    Scalar,
    /// Crosses at least one collection.
    Multiplied,
}

/// One output column.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionSlot {
    /// Column name: the canonical dotted leaf path.
    pub name: String,
    /// Step the value is read from, `None` for the root.
    pub step: Option<usize>,
    /// Scalar field read from the step's row.
    pub field: String,
    /// Scalar or multiplied.
    pub kind: SlotKind,
}

/// A compiled flattening plan.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatteningPlan {
    /// Root entity type.
    pub root_entity: String,
    /// Join steps, parents before children.
    pub steps: Vec<JoinStep>,
    /// Output slots in request order.
    pub slots: Vec<ProjectionSlot>,
}

impl FlatteningPlan {
    /// Get a slot by name (case-insensitive).
    pub fn slot(&self, name: &str) -> Option<&ProjectionSlot> {
        self.slots.iter().find(|s| s.name.eq_ignore_ascii_case(name))
    }

    /// Number of flattening joins.
    pub fn flatten_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.kind == JoinKind::Flatten)
            .count()
    }

    /// Lower the plan into a composable query.
    pub fn to_query(&self) -> ComposedQuery {
        let joins = self
            .steps
            .iter()
            .map(|step| JoinSpec {
                parent: step.parent.map(|p| p as u32),
                navigation: step.navigation.clone(),
                flatten: step.kind == JoinKind::Flatten,
                filter: step.filter.clone(),
                order_by: step.order_by.clone(),
            })
            .collect();
        let slots = self
            .slots
            .iter()
            .map(|slot| SlotSpec {
                name: slot.name.clone(),
                source: slot.step.map(|s| s as u32),
                field: slot.field.clone(),
            })
            .collect();
        ComposedQuery::new(self.root_entity.clone()).with_flatten(FlattenSpec { joins, slots })
    }
}

struct Builder<'a> {
    catalog: &'a Catalog,
    steps: Vec<JoinStep>,
    slots: Vec<ProjectionSlot>,
    seen: HashSet<String>,
}

impl Builder<'_> {
    /// Return the step for the end of `chain`, creating missing steps.
    fn ensure_chain(&mut self, chain: &[NavigationMetadata]) -> Option<usize> {
        let mut parent = None;
        for (i, nav) in chain.iter().enumerate() {
            let existing = self
                .steps
                .iter()
                .find(|s| s.parent == parent && s.navigation.eq_ignore_ascii_case(&nav.name))
                .map(|s| s.id);
            let id = match existing {
                Some(id) => id,
                None => {
                    let id = self.steps.len();
                    let flatten = nav.is_collection();
                    self.steps.push(JoinStep {
                        id,
                        parent,
                        navigation: nav.name.clone(),
                        path: chain_path(&chain[..=i]).to_string(),
                        source_entity: nav.source.clone(),
                        target_entity: nav.target.clone(),
                        kind: if flatten {
                            JoinKind::Flatten
                        } else {
                            JoinKind::Dereference
                        },
                        order_by: if flatten {
                            collection_ordering(self.catalog, nav)
                        } else {
                            Vec::new()
                        },
                        filter: if flatten { nav.filter.clone() } else { None },
                    });
                    id
                }
            };
            parent = Some(id);
        }
        parent
    }

    fn slot(&mut self, chain: &[NavigationMetadata], field: &str) {
        let name = scalar_path(chain, field).to_string();
        if !self.seen.insert(name.to_ascii_lowercase()) {
            return;
        }
        let step = self.ensure_chain(chain);
        let kind = if crosses_collection(chain) {
            SlotKind::Multiplied
        } else {
            SlotKind::Scalar
        };
        self.slots.push(ProjectionSlot {
            name,
            step,
            field: field.to_string(),
            kind,
        });
    }

    fn direct_scalars(&mut self, chain: &[NavigationMetadata], target: &EntityMetadata) {
        for field in target.scalar_names() {
            self.slot(chain, field);
        }
    }
}

/// Compile leaf paths into a flattening plan.
///
/// Navigation-terminal entries are widened to their direct scalars. A terminal
/// `*` resolves as it does for scalar expansion: the scalars of its type plus
/// the direct scalars of every navigation still within its depth budget.
/// Unresolvable and blank entries are skipped, so an empty field set yields a
/// plan without slots.
#[instrument(level = "debug", skip_all, fields(root = root, fields = fields.len()))]
pub fn build_flattened_query<S: AsRef<str>>(
    catalog: &Catalog,
    root: &str,
    fields: &[S],
) -> Result<FlatteningPlan, Error> {
    let root_meta = catalog.metadata(root);
    let mut builder = Builder {
        catalog,
        steps: Vec::new(),
        slots: Vec::new(),
        seen: HashSet::new(),
    };

    for raw in fields {
        let parsed = parse(raw.as_ref());
        if parsed.is_empty() {
            continue;
        }
        let resolved = root_meta
            .as_ref()
            .and_then(|meta| resolve(catalog, meta, &parsed));
        match resolved {
            None => debug!(path = %parsed, "skipping unresolvable field"),
            Some(Resolved::Scalar { chain, field }) => builder.slot(&chain, &field.name),
            Some(Resolved::Navigation { chain, target }) => {
                builder.direct_scalars(&chain, &target)
            }
            Some(Resolved::Wildcard { chain, target }) => {
                builder.direct_scalars(&chain, &target);
                let reachable = wildcard_navigations(catalog, &chain, &target);
                let mut chain = chain;
                for (nav, nav_target) in reachable {
                    chain.push(nav);
                    builder.direct_scalars(&chain, &nav_target);
                    chain.pop();
                }
            }
        }
    }

    let plan = FlatteningPlan {
        root_entity: root_meta
            .map(|m| m.name.clone())
            .unwrap_or_else(|| root.to_string()),
        steps: builder.steps,
        slots: builder.slots,
    };
    debug!(
        steps = plan.steps.len(),
        flattens = plan.flatten_count(),
        slots = plan.slots.len(),
        "flattening plan built"
    );
    Ok(plan)
}
