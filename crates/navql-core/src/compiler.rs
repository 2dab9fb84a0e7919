//! Compiler facade over a shared catalog.

use std::sync::Arc;

use tracing::debug;

use crate::cache::{CacheStats, CompiledPlan, PlanCache, PlanFingerprint, PlanKind};
use crate::catalog::Catalog;
use crate::config::CompilerConfig;
use crate::error::Error;
use crate::path::{self, ClassifiedPathSet, ScalarClosure};
use crate::plan::{self, FlatteningPlan, QueryPlan};

/// Entry point for compiling path sets against a catalog.
///
/// Compilation is pure: the same request against the same catalog always
/// yields the same plan. With the plan cache enabled, repeated requests share
/// one compiled plan.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use navql_core::{Catalog, CompilerConfig, EntityDef, NavigationDef, PathCompiler, ScalarType};
///
/// let catalog = Catalog::builder()
///     .entity(
///         EntityDef::new("Author", "Id")
///             .with_field("Id", ScalarType::Int32)
///             .with_navigation(NavigationDef::collection("Books", "Book", "Id", "AuthorId")),
///     )
///     .entity(
///         EntityDef::new("Book", "Id")
///             .with_field("Id", ScalarType::Int32)
///             .with_field("Title", ScalarType::String)
///             .with_field("AuthorId", ScalarType::Int32),
///     )
///     .build()
///     .unwrap();
///
/// let compiler = PathCompiler::new(Arc::new(catalog), CompilerConfig::default());
/// let plan = compiler.build_flattened_query("Author", &["Id", "Books.Title"]).unwrap();
/// assert_eq!(plan.slots.len(), 2);
/// ```
#[derive(Debug)]
pub struct PathCompiler {
    catalog: Arc<Catalog>,
    config: CompilerConfig,
    cache: Option<PlanCache>,
}

impl PathCompiler {
    /// Create a compiler.
    pub fn new(catalog: Arc<Catalog>, config: CompilerConfig) -> Self {
        let cache = config
            .enable_plan_cache
            .then(|| PlanCache::new(config.plan_cache_capacity));
        Self {
            catalog,
            config,
            cache,
        }
    }

    /// The catalog plans are compiled against.
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// The compiler configuration.
    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Classify paths into include and selector paths.
    pub fn split_includes<S: AsRef<str>>(&self, root: &str, paths: &[S]) -> ClassifiedPathSet {
        path::split_includes(&self.catalog, root, paths)
    }

    /// Expand field paths into their scalar closure using the configured
    /// nested-expansion flag.
    pub fn expand_fields_to_scalars<S: AsRef<str>>(
        &self,
        root: &str,
        fields: &[S],
    ) -> ScalarClosure {
        path::expand_fields_to_scalars(
            &self.catalog,
            root,
            fields,
            self.config.expand_nested_entities,
        )
    }

    /// Build an include plan.
    pub fn build_query<S: AsRef<str>>(&self, root: &str, paths: &[S]) -> Arc<QueryPlan> {
        let fingerprint = PlanFingerprint::new(PlanKind::Include, root, paths);
        if let Some(CompiledPlan::Query(plan)) = self.lookup(&fingerprint) {
            return plan;
        }
        let plan = Arc::new(plan::build_query(&self.catalog, root, paths));
        self.store(fingerprint, CompiledPlan::Query(Arc::clone(&plan)));
        plan
    }

    /// Build an include plan with a field-limited projection.
    pub fn build_projection_query<S: AsRef<str>>(
        &self,
        root: &str,
        fields: &[S],
    ) -> Result<Arc<QueryPlan>, Error> {
        self.build_projection_query_with(root, fields, self.config.expand_nested_entities)
    }

    /// Build a projection plan with an explicit nested-expansion flag.
    pub fn build_projection_query_with<S: AsRef<str>>(
        &self,
        root: &str,
        fields: &[S],
        expand_nested: bool,
    ) -> Result<Arc<QueryPlan>, Error> {
        let fingerprint =
            PlanFingerprint::new(PlanKind::Projection { expand_nested }, root, fields);
        if let Some(CompiledPlan::Query(plan)) = self.lookup(&fingerprint) {
            return Ok(plan);
        }
        let plan = Arc::new(plan::build_projection_query(
            &self.catalog,
            root,
            fields,
            expand_nested,
        )?);
        self.store(fingerprint, CompiledPlan::Query(Arc::clone(&plan)));
        Ok(plan)
    }

    /// Build a flattening plan.
    pub fn build_flattened_query<S: AsRef<str>>(
        &self,
        root: &str,
        fields: &[S],
    ) -> Result<Arc<FlatteningPlan>, Error> {
        let fingerprint = PlanFingerprint::new(PlanKind::Flatten, root, fields);
        if let Some(CompiledPlan::Flattening(plan)) = self.lookup(&fingerprint) {
            return Ok(plan);
        }
        let plan = Arc::new(plan::build_flattened_query(&self.catalog, root, fields)?);
        self.store(fingerprint, CompiledPlan::Flattening(Arc::clone(&plan)));
        Ok(plan)
    }

    /// Plan cache statistics, `None` when the cache is disabled.
    pub fn cache_stats(&self) -> Option<&CacheStats> {
        self.cache.as_ref().map(PlanCache::stats)
    }

    /// Number of cached plans.
    pub fn cached_plans(&self) -> usize {
        self.cache.as_ref().map(PlanCache::len).unwrap_or(0)
    }

    /// Drop all cached plans.
    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }

    fn lookup(&self, fingerprint: &PlanFingerprint) -> Option<CompiledPlan> {
        self.cache.as_ref()?.get(fingerprint)
    }

    fn store(&self, fingerprint: PlanFingerprint, plan: CompiledPlan) {
        if let Some(cache) = &self.cache {
            debug!(fingerprint = %fingerprint, "caching compiled plan");
            cache.insert(fingerprint, plan);
        }
    }
}
