//! navql protocol types.
//!
//! This crate defines the host-neutral intermediate representation the path
//! compiler lowers its plans into, and the result shapes engines return.
//!
//! # Modules
//!
//! - [`value`] - Runtime scalar values
//! - [`query`] - Composable query IR (includes, projections, flattening)
//! - [`result`] - Documents and flat rows
//! - [`error`] - Protocol error types
//!
//! Every IR type derives `rkyv` and `serde` traits so a composed query can be
//! shipped to a remote engine:
//!
//! ```ignore
//! let bytes = navql_proto::encode(&query)?;
//! let query = navql_proto::decode(&bytes)?;
//! ```

pub mod error;
pub mod query;
pub mod result;
pub mod value;

pub use error::Error;

pub use query::{
    ComposedQuery, FieldSelection, FilterExpr, FlattenSpec, JoinSpec, OrderDirection, OrderSpec,
    Pagination, Projection, RelationInclude, SimpleFilter, SlotSpec,
};
pub use result::{Document, FlatRow, QueryResult, Related};
pub use value::Value;

/// Encode a composed query with rkyv.
pub fn encode(query: &ComposedQuery) -> Result<Vec<u8>, Error> {
    rkyv::to_bytes::<rkyv::rancor::Error>(query)
        .map(|bytes| bytes.to_vec())
        .map_err(|e| Error::Serialization(e.to_string()))
}

/// Decode a composed query encoded with [`encode`].
pub fn decode(bytes: &[u8]) -> Result<ComposedQuery, Error> {
    rkyv::from_bytes::<ComposedQuery, rkyv::rancor::Error>(bytes)
        .map_err(|e| Error::Deserialization(e.to_string()))
}
