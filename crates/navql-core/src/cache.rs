//! Plan cache for compiled path sets.
//!
//! Compiled plans depend only on the catalog and the request, so the same
//! request against the same catalog can reuse a previous result. Requests are
//! keyed by a structural fingerprint of the operation, root type and path list.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

use crate::plan::{FlatteningPlan, QueryPlan};

/// Which compile operation a fingerprint belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanKind {
    /// Include tree.
    Include,
    /// Include tree with projection.
    Projection {
        /// Whether nested navigations were expanded.
        expand_nested: bool,
    },
    /// Flattening plan.
    Flatten,
}

impl PlanKind {
    fn tag(self) -> &'static [u8] {
        match self {
            PlanKind::Include => b"include",
            PlanKind::Projection {
                expand_nested: true,
            } => b"projection+nested",
            PlanKind::Projection {
                expand_nested: false,
            } => b"projection",
            PlanKind::Flatten => b"flatten",
        }
    }
}

/// Structural fingerprint of a compile request.
///
/// Root and paths are compared case-insensitively with surrounding whitespace
/// ignored. Path order is significant because it determines output order.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PlanFingerprint {
    hash: [u8; 32],
}

impl PlanFingerprint {
    /// Fingerprint a compile request.
    pub fn new<S: AsRef<str>>(kind: PlanKind, root: &str, paths: &[S]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(kind.tag());
        hasher.update(&[0u8]);
        hasher.update(root.trim().to_ascii_lowercase().as_bytes());
        for path in paths {
            hasher.update(&[0u8]);
            let normalized: Vec<String> = path
                .as_ref()
                .trim()
                .split('.')
                .map(|s| s.trim().to_ascii_lowercase())
                .collect();
            hasher.update(normalized.join(".").as_bytes());
        }
        Self {
            hash: *hasher.finalize().as_bytes(),
        }
    }

    /// Hex rendering of the fingerprint.
    pub fn to_hex(&self) -> String {
        hex::encode(self.hash)
    }
}

impl fmt::Debug for PlanFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PlanFingerprint").field(&self.to_hex()).finish()
    }
}

impl fmt::Display for PlanFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex()[..16])
    }
}

/// A compiled plan as stored in the cache.
#[derive(Debug, Clone)]
pub enum CompiledPlan {
    /// Include or projection plan.
    Query(Arc<QueryPlan>),
    /// Flattening plan.
    Flattening(Arc<FlatteningPlan>),
}

#[derive(Debug)]
struct CachedPlan {
    plan: CompiledPlan,
    hit_count: AtomicU64,
}

impl CachedPlan {
    fn new(plan: CompiledPlan) -> Self {
        Self {
            plan,
            hit_count: AtomicU64::new(0),
        }
    }

    fn record_hit(&self) -> u64 {
        self.hit_count.fetch_add(1, AtomicOrdering::Relaxed) + 1
    }

    fn hits(&self) -> u64 {
        self.hit_count.load(AtomicOrdering::Relaxed)
    }
}

/// Cache statistics.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl CacheStats {
    /// Get hit count.
    pub fn hits(&self) -> u64 {
        self.hits.load(AtomicOrdering::Relaxed)
    }

    /// Get miss count.
    pub fn misses(&self) -> u64 {
        self.misses.load(AtomicOrdering::Relaxed)
    }

    /// Get eviction count.
    pub fn evictions(&self) -> u64 {
        self.evictions.load(AtomicOrdering::Relaxed)
    }

    /// Calculate hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits() as f64;
        let total = hits + self.misses() as f64;
        if total > 0.0 {
            hits / total
        } else {
            0.0
        }
    }
}

/// Bounded cache of compiled plans with least-hit eviction.
#[derive(Debug)]
pub struct PlanCache {
    cache: RwLock<HashMap<PlanFingerprint, CachedPlan>>,
    max_entries: usize,
    stats: CacheStats,
}

impl PlanCache {
    /// Create a cache holding at most `max_entries` plans.
    pub fn new(max_entries: usize) -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
            max_entries,
            stats: CacheStats::default(),
        }
    }

    /// Look up a plan, recording a hit or a miss.
    pub fn get(&self, fingerprint: &PlanFingerprint) -> Option<CompiledPlan> {
        let guard = self.cache.read();
        if let Some(cached) = guard.get(fingerprint) {
            let hits = cached.record_hit();
            self.stats.hits.fetch_add(1, AtomicOrdering::Relaxed);
            trace!(fingerprint = %fingerprint, hits, "plan cache hit");
            return Some(cached.plan.clone());
        }
        self.stats.misses.fetch_add(1, AtomicOrdering::Relaxed);
        trace!(fingerprint = %fingerprint, "plan cache miss");
        None
    }

    /// Insert a plan, evicting the least-hit entry when full.
    pub fn insert(&self, fingerprint: PlanFingerprint, plan: CompiledPlan) {
        if self.max_entries == 0 {
            return;
        }
        let mut guard = self.cache.write();
        if guard.len() >= self.max_entries && !guard.contains_key(&fingerprint) {
            let evict_key = guard
                .iter()
                .min_by_key(|(_, v)| v.hits())
                .map(|(k, _)| k.clone());
            if let Some(key) = evict_key {
                guard.remove(&key);
                self.stats.evictions.fetch_add(1, AtomicOrdering::Relaxed);
                trace!(fingerprint = %key, "plan evicted");
            }
        }
        guard.insert(fingerprint, CachedPlan::new(plan));
    }

    /// Get cache statistics.
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Get the current number of cached entries.
    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear all cached entries.
    pub fn clear(&self) {
        self.cache.write().clear();
    }
}
