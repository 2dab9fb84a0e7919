//! navql Benchmark Suite
//!
//! Criterion benchmarks for the path compiler and the in-memory engine.
//!
//! # Benchmark Categories
//!
//! - **Compile**: scalar expansion, include classification, plan building,
//!   plan cache hit vs miss
//! - **Execute**: include, projection and flattened execution over generated
//!   stores at several scales
//!
//! Set `RUST_LOG` to get compiler tracing output while benchmarking.

pub mod fixtures;

pub use fixtures::{org_catalog, org_store, Scale};

/// Install a `tracing` subscriber driven by `RUST_LOG`.
///
/// Safe to call more than once.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
