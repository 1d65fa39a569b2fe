//! Access decision caching.
//!
//! Evaluating an expression costs a full parse. For workloads where the
//! same expressions repeat (row-level tags in a scan, say), a cache in
//! front of the evaluator turns repeat decisions into a hash lookup.
//!
//! Caching is safe because an [`AccessEvaluator`]'s authorizations are
//! fixed at construction: evaluating the same expression always yields the
//! same result. The cache is bounded and entries expire after a TTL, so a
//! hostile stream of unique expressions cannot grow it without limit.

use std::time::Duration;

use moka::sync::Cache;
use tracing::debug;

use crate::error::AccessResult;
use crate::evaluator::AccessEvaluator;
use crate::expression::AccessExpression;

/// Configuration for [`CachedAccessEvaluator`].
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of cached decisions.
    pub max_capacity: u64,
    /// Time-to-live for cached decisions.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            ttl: Duration::from_secs(3600),
        }
    }
}

impl CacheConfig {
    /// Sets the maximum number of cached decisions.
    pub fn with_max_capacity(mut self, max_capacity: u64) -> Self {
        self.max_capacity = max_capacity;
        self
    }

    /// Sets the time-to-live for cached decisions.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

/// An [`AccessEvaluator`] with a bounded decision cache keyed by expression
/// bytes.
///
/// Decisions are cached; errors are not, so an invalid expression re-raises
/// on every call. Safe for concurrent use without external locking.
pub struct CachedAccessEvaluator {
    evaluator: AccessEvaluator,
    cache: Cache<Vec<u8>, bool>,
    config: CacheConfig,
}

impl std::fmt::Debug for CachedAccessEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedAccessEvaluator")
            .field("evaluator", &self.evaluator)
            .field("config", &self.config)
            .field("entry_count", &self.cache.entry_count())
            .finish()
    }
}

impl CachedAccessEvaluator {
    /// Wraps `evaluator` with the default cache configuration.
    pub fn new(evaluator: AccessEvaluator) -> Self {
        Self::with_config(evaluator, CacheConfig::default())
    }

    /// Wraps `evaluator` with the given cache configuration.
    pub fn with_config(evaluator: AccessEvaluator, config: CacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(config.ttl)
            .build();
        Self {
            evaluator,
            cache,
            config,
        }
    }

    /// Returns the cache configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Returns the wrapped evaluator.
    pub fn evaluator(&self) -> &AccessEvaluator {
        &self.evaluator
    }

    /// Cached form of [`AccessEvaluator::can_access`].
    pub fn can_access(&self, expression: &str) -> AccessResult<bool> {
        self.can_access_bytes(expression.as_bytes())
    }

    /// Cached form of [`AccessEvaluator::can_access_bytes`].
    pub fn can_access_bytes(&self, expression: &[u8]) -> AccessResult<bool> {
        if let Some(granted) = self.cache.get(expression) {
            metrics::counter!("rsaccess_cache_hits_total").increment(1);
            return Ok(granted);
        }
        metrics::counter!("rsaccess_cache_misses_total").increment(1);
        let granted = self.evaluator.can_access_bytes(expression)?;
        self.cache.insert(expression.to_vec(), granted);
        Ok(granted)
    }

    /// Cached form of [`AccessEvaluator::can_access_expression`].
    pub fn can_access_expression(&self, expression: &AccessExpression) -> AccessResult<bool> {
        self.can_access_bytes(expression.as_bytes())
    }

    /// Number of cached decisions.
    pub fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }

    /// Drops all cached decisions.
    pub fn invalidate_all(&self) {
        debug!("invalidating all cached access decisions");
        self.cache.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authorizations::Authorizations;

    fn cached() -> CachedAccessEvaluator {
        CachedAccessEvaluator::new(AccessEvaluator::new(Authorizations::of(["A", "B"])))
    }

    #[test]
    fn test_decisions_are_cached() {
        let evaluator = cached();
        assert!(evaluator.can_access("A&B").unwrap());
        assert!(evaluator.can_access("A&B").unwrap());
        assert_eq!(evaluator.entry_count(), 1);

        assert!(!evaluator.can_access("A&C").unwrap());
        assert_eq!(evaluator.entry_count(), 2);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let evaluator = cached();
        assert!(evaluator.can_access("A&B|C").is_err());
        assert!(evaluator.can_access("A&B|C").is_err());
        assert_eq!(evaluator.entry_count(), 0);
    }

    #[test]
    fn test_invalidate_all_empties_the_cache() {
        let evaluator = cached();
        evaluator.can_access("A").unwrap();
        evaluator.can_access("B").unwrap();
        assert_eq!(evaluator.entry_count(), 2);

        evaluator.invalidate_all();
        assert_eq!(evaluator.entry_count(), 0);
    }

    #[test]
    fn test_capacity_bound_is_respected() {
        let evaluator = CachedAccessEvaluator::with_config(
            AccessEvaluator::new(Authorizations::of(["A"])),
            CacheConfig::default().with_max_capacity(4),
        );
        for index in 0..64 {
            evaluator.can_access(&format!("A|auth{index}")).unwrap();
        }
        assert!(evaluator.entry_count() <= 4);
    }

    #[test]
    fn test_cached_and_uncached_results_agree() {
        let evaluator = cached();
        for expression in ["A", "A&B", "A&C", "(A|C)&B", ""] {
            let direct = evaluator.evaluator().can_access(expression).unwrap();
            assert_eq!(evaluator.can_access(expression).unwrap(), direct);
            // second call served from cache
            assert_eq!(evaluator.can_access(expression).unwrap(), direct);
        }
    }
}
