//! Execution collaborators for compiled queries.
//!
//! The compiler never executes anything itself. It hands a
//! [`ComposedQuery`] to a [`QueryEngine`] together with the caller's
//! [`ExecutionOptions`], which are passed through untouched.

mod filter;
mod memory;

pub use filter::FilterEvaluator;
pub use memory::{MemoryEngine, MemoryStore, Row};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use navql_proto::{ComposedQuery, QueryResult};

use crate::error::Error;

/// Cancellation and timeout settings for one execution.
#[derive(Debug, Clone, Default)]
pub struct ExecutionOptions {
    /// Maximum wall-clock time for the execution.
    pub timeout: Option<Duration>,
    /// Flag that aborts the execution once set.
    pub cancel: Option<Arc<AtomicBool>>,
}

impl ExecutionOptions {
    /// Options without timeout or cancellation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Attach a cancellation flag.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Check if the cancellation flag is set.
    pub fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .map(|flag| flag.load(Ordering::Relaxed))
            .unwrap_or(false)
    }

    /// Start a deadline clock for these options.
    pub fn start(&self) -> Deadline<'_> {
        Deadline {
            options: self,
            expires_at: self.timeout.map(|t| Instant::now() + t),
        }
    }
}

/// Running check against [`ExecutionOptions`].
#[derive(Debug)]
pub struct Deadline<'a> {
    options: &'a ExecutionOptions,
    expires_at: Option<Instant>,
}

impl Deadline<'_> {
    /// Fail if the execution was cancelled or ran past its timeout.
    pub fn check(&self) -> Result<(), Error> {
        if self.options.is_cancelled() {
            return Err(Error::Cancelled);
        }
        match self.expires_at {
            Some(at) if Instant::now() >= at => Err(Error::Timeout),
            _ => Ok(()),
        }
    }
}

/// Executes composed queries.
pub trait QueryEngine: Send + Sync {
    /// Execute a query.
    fn execute(&self, query: &ComposedQuery, options: &ExecutionOptions)
        -> Result<QueryResult, Error>;

    /// Count the results a query would return.
    fn count(&self, query: &ComposedQuery, options: &ExecutionOptions) -> Result<usize, Error> {
        Ok(self.execute(query, options)?.len())
    }
}
