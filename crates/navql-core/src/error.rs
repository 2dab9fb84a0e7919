//! Core error types.

use thiserror::Error;

/// Errors raised by the catalog, the compiler and the reference engine.
#[derive(Debug, Error)]
pub enum Error {
    /// An operation received an argument it cannot work with.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The metadata registration pass is inconsistent.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    /// An engine was asked about an entity type it does not know.
    #[error("unknown entity type '{0}'")]
    UnknownEntity(String),

    /// Execution was cancelled by the caller.
    #[error("query execution cancelled")]
    Cancelled,

    /// Execution exceeded the caller's deadline.
    #[error("query execution timed out")]
    Timeout,

    /// Configuration could not be parsed.
    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),

    /// Protocol error.
    #[error("protocol error: {0}")]
    Protocol(#[from] navql_proto::Error),
}
