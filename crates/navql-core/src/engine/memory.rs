//! In-memory reference engine.
//!
//! Rows live in per-entity tables. Relations are resolved with a nested loop
//! over the navigation's join keys. Every query shape the compiler emits runs
//! here unchanged: include trees, projections and flattening joins, followed by
//! caller filters, ordering, `distinct` and pagination.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use navql_proto::{
    ComposedQuery, Document, FilterExpr, FlatRow, FlattenSpec, OrderDirection, OrderSpec,
    Pagination, Projection, QueryResult, Related, RelationInclude, Value,
};
use tracing::{debug, instrument};

use crate::catalog::{Catalog, EntityMetadata, NavigationMetadata};
use crate::error::Error;

use super::filter::FilterEvaluator;
use super::{Deadline, ExecutionOptions, QueryEngine};

/// One stored row: field name and value pairs.
pub type Row = Vec<(String, Value)>;

/// Per-entity row tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: HashMap<String, Vec<Row>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row to an entity's table.
    pub fn insert(&mut self, entity: &str, row: Row) {
        self.tables
            .entry(entity.to_ascii_lowercase())
            .or_default()
            .push(row);
    }

    /// Rows of an entity in insertion order.
    pub fn rows(&self, entity: &str) -> &[Row] {
        self.tables
            .get(&entity.to_ascii_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Total number of stored rows.
    pub fn len(&self) -> usize {
        self.tables.values().map(Vec::len).sum()
    }

    /// Check if the store holds no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Reference [`QueryEngine`] over a [`MemoryStore`].
#[derive(Debug)]
pub struct MemoryEngine {
    catalog: Arc<Catalog>,
    store: MemoryStore,
}

impl MemoryEngine {
    /// Create an engine over `store`, resolving relations through `catalog`.
    pub fn new(catalog: Arc<Catalog>, store: MemoryStore) -> Self {
        Self { catalog, store }
    }

    /// The catalog used to resolve relations.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The underlying store.
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Rows of `nav.target` joined to `parent`, filtered and ordered.
    fn related<'a>(
        &'a self,
        nav: &NavigationMetadata,
        parent: &[(String, Value)],
        filter: Option<&FilterExpr>,
        order_by: &[OrderSpec],
    ) -> Vec<&'a Row> {
        let key = FilterEvaluator::field(parent, &nav.from_field);
        if key.is_null() {
            return Vec::new();
        }
        let mut rows: Vec<&Row> = self
            .store
            .rows(&nav.target)
            .iter()
            .filter(|row| FilterEvaluator::field(row.as_slice(), &nav.to_field).loose_eq(key))
            .filter(|row| {
                filter
                    .map(|f| FilterEvaluator::evaluate(f, row.as_slice()))
                    .unwrap_or(true)
            })
            .collect();
        sort_rows(&mut rows, order_by);
        rows
    }

    fn execute_documents(
        &self,
        query: &ComposedQuery,
        root: &EntityMetadata,
        deadline: &Deadline<'_>,
    ) -> Result<Vec<Document>, Error> {
        let mut roots: Vec<&Row> = self
            .store
            .rows(&root.name)
            .iter()
            .filter(|row| {
                query
                    .filters
                    .iter()
                    .all(|f| FilterEvaluator::evaluate(f, row.as_slice()))
            })
            .collect();
        sort_rows(&mut roots, &with_identity(&query.order_by, &root.identity_field));

        let mut documents = Vec::with_capacity(roots.len());
        for row in roots {
            deadline.check()?;
            documents.push(self.materialize(
                root,
                row,
                "",
                &query.includes,
                query.projection.as_ref(),
            )?);
        }
        Ok(documents)
    }

    fn materialize(
        &self,
        meta: &EntityMetadata,
        row: &[(String, Value)],
        level: &str,
        includes: &[RelationInclude],
        projection: Option<&Projection>,
    ) -> Result<Document, Error> {
        let selection = projection.map(|p| p.selection(level));
        let fields = meta
            .scalars
            .iter()
            .map(|field| {
                let keep = match selection {
                    None => true,
                    Some(Some(sel)) => sel
                        .fields
                        .iter()
                        .any(|f| f.eq_ignore_ascii_case(&field.name)),
                    Some(None) => false,
                };
                let value = if keep {
                    FilterEvaluator::field(row, &field.name).clone()
                } else {
                    field.scalar_type.default_value()
                };
                (field.name.clone(), value)
            })
            .collect();
        let mut document = Document::new(meta.name.clone(), fields);

        for include in includes
            .iter()
            .filter(|i| i.parent_path().unwrap_or("").eq_ignore_ascii_case(level))
        {
            let nav = meta.navigation(include.relation_name()).ok_or_else(|| {
                Error::InvalidArgument(format!(
                    "unknown navigation '{}' on '{}'",
                    include.relation_name(),
                    meta.name
                ))
            })?;
            let target = self
                .catalog
                .metadata(&nav.target)
                .ok_or_else(|| Error::UnknownEntity(nav.target.clone()))?;
            let related = self.related(nav, row, include.filter.as_ref(), &include.order_by);

            let value = if nav.is_collection() {
                let children = related
                    .into_iter()
                    .map(|child| {
                        self.materialize(&target, child, &include.path, includes, projection)
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Related::Many(children)
            } else {
                match related.first() {
                    Some(child) => Related::One(Some(Box::new(self.materialize(
                        &target,
                        child,
                        &include.path,
                        includes,
                        projection,
                    )?))),
                    None => Related::One(None),
                }
            };
            document.relations.push((nav.name.clone(), value));
        }

        Ok(document)
    }

    fn execute_flattened(
        &self,
        query: &ComposedQuery,
        spec: &FlattenSpec,
        root: &Arc<EntityMetadata>,
        deadline: &Deadline<'_>,
    ) -> Result<Vec<FlatRow>, Error> {
        let mut navs: Vec<NavigationMetadata> = Vec::with_capacity(spec.joins.len());
        let mut targets: Vec<Arc<EntityMetadata>> = Vec::with_capacity(spec.joins.len());
        for join in &spec.joins {
            // Parents precede their children, checked by `validate`.
            let source = match join.parent {
                None => Arc::clone(root),
                Some(p) => Arc::clone(&targets[p as usize]),
            };
            let nav = source.navigation(&join.navigation).cloned().ok_or_else(|| {
                Error::InvalidArgument(format!(
                    "unknown navigation '{}' on '{}'",
                    join.navigation, source.name
                ))
            })?;
            let target = self
                .catalog
                .metadata(&nav.target)
                .ok_or_else(|| Error::UnknownEntity(nav.target.clone()))?;
            navs.push(nav);
            targets.push(target);
        }

        let mut roots: Vec<&Row> = self.store.rows(&root.name).iter().collect();
        sort_rows(&mut roots, &[OrderSpec::asc(root.identity_field.clone())]);

        let mut rows = Vec::new();
        for root_row in roots {
            deadline.check()?;

            let mut bindings: Vec<Vec<Option<&Row>>> = vec![Vec::with_capacity(spec.joins.len())];
            for (join, nav) in spec.joins.iter().zip(&navs) {
                let mut next = Vec::with_capacity(bindings.len());
                for binding in bindings {
                    let parent = match join.parent {
                        None => Some(root_row),
                        Some(p) => binding[p as usize],
                    };
                    if join.flatten {
                        let Some(parent) = parent else {
                            continue;
                        };
                        let children =
                            self.related(nav, parent, join.filter.as_ref(), &join.order_by);
                        for child in children {
                            let mut extended = binding.clone();
                            extended.push(Some(child));
                            next.push(extended);
                        }
                    } else {
                        let child = parent.and_then(|p| {
                            self.related(nav, p, join.filter.as_ref(), &join.order_by)
                                .into_iter()
                                .next()
                        });
                        let mut extended = binding;
                        extended.push(child);
                        next.push(extended);
                    }
                }
                bindings = next;
            }

            for binding in bindings {
                let values = spec
                    .slots
                    .iter()
                    .map(|slot| {
                        let source = match slot.source {
                            None => Some(root_row),
                            Some(s) => binding[s as usize],
                        };
                        let value = source
                            .map(|r| FilterEvaluator::field(r, &slot.field).clone())
                            .unwrap_or(Value::Null);
                        (slot.name.clone(), value)
                    })
                    .collect();
                rows.push(FlatRow { values });
            }
        }

        rows.retain(|row| {
            query
                .filters
                .iter()
                .all(|f| FilterEvaluator::evaluate(f, &row.values))
        });
        if !query.order_by.is_empty() {
            rows.sort_by(|a, b| compare_rows(&a.values, &b.values, &query.order_by));
        }
        Ok(rows)
    }
}

impl QueryEngine for MemoryEngine {
    #[instrument(
        level = "debug",
        skip_all,
        fields(root = %query.root_entity, flattened = query.is_flattened())
    )]
    fn execute(
        &self,
        query: &ComposedQuery,
        options: &ExecutionOptions,
    ) -> Result<QueryResult, Error> {
        let deadline = options.start();
        deadline.check()?;
        query.validate()?;

        let root = self
            .catalog
            .metadata(&query.root_entity)
            .ok_or_else(|| Error::UnknownEntity(query.root_entity.clone()))?;

        let result = match &query.flatten {
            Some(spec) => {
                let rows = self.execute_flattened(query, spec, &root, &deadline)?;
                QueryResult::Rows(finish(rows, query.distinct, query.pagination.as_ref()))
            }
            None => {
                let documents = self.execute_documents(query, &root, &deadline)?;
                QueryResult::Documents(finish(
                    documents,
                    query.distinct,
                    query.pagination.as_ref(),
                ))
            }
        };

        debug!(results = result.len(), "query executed");
        Ok(result)
    }
}

/// Caller ordering followed by the identity field, unless already present.
fn with_identity(order_by: &[OrderSpec], identity: &str) -> Vec<OrderSpec> {
    let mut order = order_by.to_vec();
    if !order.iter().any(|o| o.field.eq_ignore_ascii_case(identity)) {
        order.push(OrderSpec::asc(identity));
    }
    order
}

fn compare_rows(a: &[(String, Value)], b: &[(String, Value)], order_by: &[OrderSpec]) -> Ordering {
    for spec in order_by {
        let cmp = FilterEvaluator::field(a, &spec.field)
            .sort_compare(FilterEvaluator::field(b, &spec.field));
        let cmp = match spec.direction {
            OrderDirection::Asc => cmp,
            OrderDirection::Desc => cmp.reverse(),
        };
        if cmp != Ordering::Equal {
            return cmp;
        }
    }
    Ordering::Equal
}

/// Stable multi-key sort.
fn sort_rows(rows: &mut [&Row], order_by: &[OrderSpec]) {
    if order_by.is_empty() {
        return;
    }
    rows.sort_by(|a, b| compare_rows(a, b, order_by));
}

fn finish<T: PartialEq>(items: Vec<T>, distinct: bool, pagination: Option<&Pagination>) -> Vec<T> {
    let items = if distinct {
        let mut unique: Vec<T> = Vec::with_capacity(items.len());
        for item in items {
            if !unique.contains(&item) {
                unique.push(item);
            }
        }
        unique
    } else {
        items
    };
    match pagination {
        Some(p) => items
            .into_iter()
            .skip(p.offset as usize)
            .take(p.limit as usize)
            .collect(),
        None => items,
    }
}
