//! Dotted path handling: parsing, classification and scalar expansion.

mod classify;
mod expand;
mod parser;
pub(crate) mod resolve;

pub use classify::{split_includes, ClassifiedPathSet};
pub use expand::{expand_fields_to_scalars, ScalarClosure};
pub use parser::{parse, ParsedPath, PathSegment, WILDCARD};
