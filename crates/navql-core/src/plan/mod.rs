//! Host-neutral plans built from classified paths.
//!
//! Plans are plain data. Each lowers to a [`navql_proto::ComposedQuery`] that
//! an engine executes.

mod flatten;
mod include;
mod projection;

pub use flatten::{
    build_flattened_query, FlatteningPlan, JoinKind, JoinStep, ProjectionSlot, SlotKind,
};
pub use include::{build_query, build_query_from, IncludeNode, QueryPlan};
pub use projection::{build_projection_query, LevelSelection, ProjectionSpec};
