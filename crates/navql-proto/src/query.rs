//! Composable query IR produced by the path compiler.
//!
//! A [`ComposedQuery`] is what the compiler hands to an execution engine. It is
//! deliberately open for further composition by the caller: extra filters,
//! ordering, `distinct` and pagination are layered on top before execution and
//! are evaluated by the engine, never by the caller.

use crate::error::Error;
use crate::value::Value;
use rkyv::{Archive, Deserialize, Serialize};
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

/// Filter expression over the fields of one entity (or one flattened row).
///
/// Note: This uses a flat design without recursive Box types to work with rkyv.
/// And/Or contain Vec<SimpleFilter>.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize)]
pub enum FilterExpr {
    /// Field equals value.
    Eq { field: String, value: Value },
    /// Field not equals value.
    Ne { field: String, value: Value },
    /// Field less than value.
    Lt { field: String, value: Value },
    /// Field less than or equal to value.
    Le { field: String, value: Value },
    /// Field greater than value.
    Gt { field: String, value: Value },
    /// Field greater than or equal to value.
    Ge { field: String, value: Value },
    /// Field is in a set of values.
    In { field: String, values: Vec<Value> },
    /// Field is null.
    IsNull { field: String },
    /// Field is not null.
    IsNotNull { field: String },
    /// Field matches a LIKE pattern.
    Like { field: String, pattern: String },
    /// All conditions must be true.
    And(Vec<SimpleFilter>),
    /// At least one condition must be true.
    Or(Vec<SimpleFilter>),
}

/// A simple (non-compound) filter for use in And/Or expressions.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize)]
pub enum SimpleFilter {
    /// Field equals value.
    Eq { field: String, value: Value },
    /// Field not equals value.
    Ne { field: String, value: Value },
    /// Field less than value.
    Lt { field: String, value: Value },
    /// Field less than or equal to value.
    Le { field: String, value: Value },
    /// Field greater than value.
    Gt { field: String, value: Value },
    /// Field greater than or equal to value.
    Ge { field: String, value: Value },
    /// Field is in a set of values.
    In { field: String, values: Vec<Value> },
    /// Field is null.
    IsNull { field: String },
    /// Field is not null.
    IsNotNull { field: String },
    /// Field matches a LIKE pattern.
    Like { field: String, pattern: String },
}

impl SimpleFilter {
    /// Create an equality filter.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        SimpleFilter::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Create a greater-than filter.
    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        SimpleFilter::Gt {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Create an IS NOT NULL filter.
    pub fn is_not_null(field: impl Into<String>) -> Self {
        SimpleFilter::IsNotNull {
            field: field.into(),
        }
    }
}

impl FilterExpr {
    /// Create an equality filter.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        FilterExpr::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Create a not-equal filter.
    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        FilterExpr::Ne {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Create a less-than filter.
    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        FilterExpr::Lt {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Create a greater-than filter.
    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        FilterExpr::Gt {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Create a greater-than-or-equal filter.
    pub fn ge(field: impl Into<String>, value: impl Into<Value>) -> Self {
        FilterExpr::Ge {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Create an IN filter.
    pub fn in_values(field: impl Into<String>, values: Vec<Value>) -> Self {
        FilterExpr::In {
            field: field.into(),
            values,
        }
    }

    /// Create an IS NULL filter.
    pub fn is_null(field: impl Into<String>) -> Self {
        FilterExpr::IsNull {
            field: field.into(),
        }
    }

    /// Create a LIKE filter.
    pub fn like(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        FilterExpr::Like {
            field: field.into(),
            pattern: pattern.into(),
        }
    }

    /// Create an AND filter combining multiple simple expressions.
    pub fn and(exprs: Vec<SimpleFilter>) -> Self {
        FilterExpr::And(exprs)
    }

    /// Create an OR filter combining multiple simple expressions.
    pub fn or(exprs: Vec<SimpleFilter>) -> Self {
        FilterExpr::Or(exprs)
    }
}

/// Order specification for sorting results.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize)]
pub struct OrderSpec {
    /// Field to order by.
    pub field: String,
    /// Sort direction.
    pub direction: OrderDirection,
}

impl OrderSpec {
    /// Create an ascending order spec.
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: OrderDirection::Asc,
        }
    }

    /// Create a descending order spec.
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: OrderDirection::Desc,
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize)]
pub enum OrderDirection {
    /// Ascending order.
    Asc,
    /// Descending order.
    Desc,
}

/// Pagination parameters.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize)]
pub struct Pagination {
    /// Maximum number of results to return.
    pub limit: u32,
    /// Number of results to skip.
    pub offset: u32,
}

impl Pagination {
    /// Create pagination with limit and offset.
    pub fn new(limit: u32, offset: u32) -> Self {
        Self { limit, offset }
    }

    /// Create pagination with just a limit.
    pub fn limit(limit: u32) -> Self {
        Self { limit, offset: 0 }
    }
}

/// A relation to materialize, addressed by its dotted navigation path.
///
/// The `path` field uses dot-notation for nested relations:
/// - "Departments" - include departments of the root
/// - "Departments.Employees" - include employees of each department
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize)]
pub struct RelationInclude {
    /// Dot-separated path to this relation.
    pub path: String,
    /// Filter applied to the related rows.
    pub filter: Option<FilterExpr>,
    /// Ordering of the related rows (collections only).
    pub order_by: Vec<OrderSpec>,
}

impl RelationInclude {
    /// Create a new include for a relation.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            filter: None,
            order_by: vec![],
        }
    }

    /// Set a filter for this include.
    pub fn with_filter(mut self, filter: FilterExpr) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Add ordering for this include.
    pub fn with_order(mut self, order: OrderSpec) -> Self {
        self.order_by.push(order);
        self
    }

    /// Get the relation name (last segment of the path).
    pub fn relation_name(&self) -> &str {
        self.path.rsplit('.').next().unwrap_or(&self.path)
    }

    /// Get the parent path (all segments except the last).
    pub fn parent_path(&self) -> Option<&str> {
        self.path.rsplit_once('.').map(|(parent, _)| parent)
    }

    /// Check if this is a top-level include (no dots in path).
    pub fn is_top_level(&self) -> bool {
        !self.path.contains('.')
    }

    /// Get the depth of this include (number of dots + 1).
    pub fn depth(&self) -> usize {
        self.path.matches('.').count() + 1
    }
}

/// Scalars kept at one navigation level of a projected result.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize)]
pub struct FieldSelection {
    /// Navigation path of the level ("" for the root).
    pub path: String,
    /// Scalar fields that keep their stored value; all others are defaulted.
    pub fields: Vec<String>,
}

/// Field-limited projection over a materialized object graph.
#[derive(Debug, Clone, PartialEq, Default, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize)]
pub struct Projection {
    /// One selection per materialized level.
    pub selections: Vec<FieldSelection>,
}

impl Projection {
    /// Get the selection for a navigation path (case-insensitive).
    pub fn selection(&self, path: &str) -> Option<&FieldSelection> {
        self.selections
            .iter()
            .find(|s| s.path.eq_ignore_ascii_case(path))
    }
}

/// One join step of a flattened query.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize)]
pub struct JoinSpec {
    /// Index of the parent step, `None` for the root.
    pub parent: Option<u32>,
    /// Navigation followed from the parent.
    pub navigation: String,
    /// `true` for a flattening (to-many) join, `false` for a dereference.
    pub flatten: bool,
    /// Filter applied to the joined rows.
    pub filter: Option<FilterExpr>,
    /// Ordering of the joined rows within their parent.
    pub order_by: Vec<OrderSpec>,
}

/// One output column of a flattened query.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize)]
pub struct SlotSpec {
    /// Output column name (the dotted leaf path).
    pub name: String,
    /// Join step the value is read from, `None` for the root.
    pub source: Option<u32>,
    /// Scalar field read from the source.
    pub field: String,
}

/// Cross-join flattening of nested relations into flat rows.
#[derive(Debug, Clone, PartialEq, Default, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize)]
pub struct FlattenSpec {
    /// Join steps, every parent listed before its children.
    pub joins: Vec<JoinSpec>,
    /// Output columns in request order.
    pub slots: Vec<SlotSpec>,
}

/// A composed query ready for execution or further composition.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize)]
pub struct ComposedQuery {
    /// The root entity type to query.
    pub root_entity: String,
    /// Relations to materialize, parents before children.
    pub includes: Vec<RelationInclude>,
    /// Optional field-limited projection of the object graph.
    pub projection: Option<Projection>,
    /// Optional flattening; when present the result is flat rows.
    pub flatten: Option<FlattenSpec>,
    /// Caller filters, all of which must hold: over root fields, or over
    /// slot names when flattened.
    pub filters: Vec<FilterExpr>,
    /// Caller ordering (same addressing as `filters`).
    pub order_by: Vec<OrderSpec>,
    /// Remove duplicate results.
    pub distinct: bool,
    /// Pagination parameters.
    pub pagination: Option<Pagination>,
}

impl ComposedQuery {
    /// Create a new query for an entity.
    pub fn new(root_entity: impl Into<String>) -> Self {
        Self {
            root_entity: root_entity.into(),
            includes: vec![],
            projection: None,
            flatten: None,
            filters: vec![],
            order_by: vec![],
            distinct: false,
            pagination: None,
        }
    }

    /// Add an include.
    pub fn include(mut self, include: RelationInclude) -> Self {
        self.includes.push(include);
        self
    }

    /// Set the projection.
    pub fn with_projection(mut self, projection: Projection) -> Self {
        self.projection = Some(projection);
        self
    }

    /// Set the flattening.
    pub fn with_flatten(mut self, flatten: FlattenSpec) -> Self {
        self.flatten = Some(flatten);
        self
    }

    /// Add a filter. Filters compose by conjunction.
    pub fn with_filter(mut self, filter: FilterExpr) -> Self {
        self.filters.push(filter);
        self
    }

    /// Add ordering.
    pub fn with_order(mut self, order: OrderSpec) -> Self {
        self.order_by.push(order);
        self
    }

    /// Remove duplicate results.
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Set pagination.
    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }

    /// Check if the query produces flat rows.
    pub fn is_flattened(&self) -> bool {
        self.flatten.is_some()
    }

    /// Check the structural consistency of the query.
    ///
    /// Every join must reference a preceding join, every slot must read from
    /// an existing join, and a flattened query carries no includes.
    pub fn validate(&self) -> Result<(), Error> {
        let Some(flatten) = &self.flatten else {
            return Ok(());
        };
        if !self.includes.is_empty() {
            return Err(Error::InvalidQuery(
                "a flattened query cannot carry includes".to_string(),
            ));
        }
        for (i, join) in flatten.joins.iter().enumerate() {
            if let Some(parent) = join.parent {
                if parent as usize >= i {
                    return Err(Error::InvalidQuery(format!(
                        "join {} references join {} which does not precede it",
                        i, parent
                    )));
                }
            }
        }
        if let Some(slot) = flatten
            .slots
            .iter()
            .find(|s| s.source.is_some_and(|j| j as usize >= flatten.joins.len()))
        {
            return Err(Error::InvalidQuery(format!(
                "slot '{}' reads from a missing join",
                slot.name
            )));
        }
        Ok(())
    }
}
