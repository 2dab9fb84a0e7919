//! Compiler configuration.

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Recursion depth applied to navigations without an explicit decoration.
pub const DEFAULT_MAX_DEPTH: u32 = 2;

/// Default number of compiled plans kept by the plan cache.
pub const DEFAULT_PLAN_CACHE_CAPACITY: usize = 1024;

/// Configuration for the path compiler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Max recursion depth for navigations that declare none.
    pub default_max_depth: u32,

    /// Whether projection building recurses into nested navigations.
    pub expand_nested_entities: bool,

    /// Whether compiled plans are memoized.
    pub enable_plan_cache: bool,

    /// Maximum number of memoized plans.
    pub plan_cache_capacity: usize,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            default_max_depth: DEFAULT_MAX_DEPTH,
            expand_nested_entities: true,
            enable_plan_cache: true,
            plan_cache_capacity: DEFAULT_PLAN_CACHE_CAPACITY,
        }
    }
}

impl CompilerConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from JSON. Missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the default max recursion depth.
    pub fn default_max_depth(mut self, depth: u32) -> Self {
        self.default_max_depth = depth;
        self
    }

    /// Set whether nested navigations are expanded.
    pub fn expand_nested_entities(mut self, expand: bool) -> Self {
        self.expand_nested_entities = expand;
        self
    }

    /// Disable the plan cache.
    pub fn without_plan_cache(mut self) -> Self {
        self.enable_plan_cache = false;
        self
    }

    /// Set the plan cache capacity.
    pub fn plan_cache_capacity(mut self, capacity: usize) -> Self {
        self.plan_cache_capacity = capacity;
        self
    }
}
