//! navql core - compiling dotted query paths over entity metadata.
//!
//! Given a root entity type and a set of paths such as
//! `"Departments.Employees.Skills.Name"` or `"*"`, this crate works out which
//! relations must be materialized, which scalar leaves are projected, how far
//! cyclic navigations may be auto-expanded, and how nested collections flatten
//! into a single row set. The result is a [`navql_proto::ComposedQuery`] that a
//! [`QueryEngine`] executes.

pub mod cache;
pub mod catalog;
pub mod compiler;
pub mod config;
pub mod engine;
pub mod error;
pub mod path;
pub mod plan;

#[cfg(test)]
mod testing;

pub use cache::{CacheStats, CompiledPlan, PlanCache, PlanFingerprint, PlanKind};
pub use catalog::{
    Cardinality, Catalog, CatalogBuilder, EntityDef, EntityMetadata, FieldDef, Member,
    NavigationDecoration, NavigationDef, NavigationMetadata, ScalarType,
};
pub use compiler::PathCompiler;
pub use config::{CompilerConfig, DEFAULT_MAX_DEPTH, DEFAULT_PLAN_CACHE_CAPACITY};
pub use engine::{ExecutionOptions, FilterEvaluator, MemoryEngine, MemoryStore, QueryEngine, Row};
pub use error::Error;
pub use path::{
    expand_fields_to_scalars, parse, split_includes, ClassifiedPathSet, ParsedPath, PathSegment,
    ScalarClosure, WILDCARD,
};
pub use plan::{
    build_flattened_query, build_projection_query, build_query, build_query_from, FlatteningPlan,
    IncludeNode, JoinKind, JoinStep, LevelSelection, ProjectionSlot, ProjectionSpec, QueryPlan,
    SlotKind,
};

/// Re-export protocol types.
pub use navql_proto as proto;
