//! Memoized recommendation runs using moka.
//!
//! Identical selections (same normalized [`RecommendQuery`]) against the
//! same ratings return the previously computed ranking without re-running
//! the search.

use crate::core::recommender::{generate_scored_recommendations, RecommendQuery, ScoredComp};
use crate::domain::model::Ratings;
use moka::sync::Cache;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_CAPACITY: u64 = 512;

#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    /// Number of entries in cache
    pub entry_count: u64,
}

/// Keyed by a fingerprint of the ratings table plus the query, so a cache
/// shared between planners over different catalogs never crosses results.
#[derive(Clone)]
pub struct RecommendationCache {
    inner: Cache<(u64, RecommendQuery), Arc<Vec<ScoredComp>>>,
}

/// Order-independent digest of a ratings table.
pub fn ratings_fingerprint(ratings: &Ratings) -> u64 {
    let mut eras: Vec<_> = ratings.iter().collect();
    eras.sort_by(|a, b| a.0.cmp(b.0));

    let mut hasher = DefaultHasher::new();
    for (era, by_class) in eras {
        era.hash(&mut hasher);
        let mut classes: Vec<_> = by_class.iter().collect();
        classes.sort_by(|a, b| a.0.cmp(b.0));
        classes.hash(&mut hasher);
    }
    hasher.finish()
}

impl RecommendationCache {
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        Self {
            inner: Cache::new(max_capacity),
        }
    }

    #[must_use]
    pub fn with_ttl(max_capacity: u64, ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Cached ranking for `query` over `ratings`, computing it on a miss.
    pub fn get_or_compute(
        &self,
        ratings: &Ratings,
        query: &RecommendQuery,
    ) -> Arc<Vec<ScoredComp>> {
        let key = (ratings_fingerprint(ratings), query.clone());
        if let Some(hit) = self.inner.get(&key) {
            tracing::debug!("recommendation cache hit");
            return hit;
        }
        self.inner.get_with(key, || {
            tracing::debug!("recommendation cache miss; running search");
            Arc::new(generate_scored_recommendations(ratings, query))
        })
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.inner.run_pending_tasks();
        CacheStats {
            entry_count: self.inner.entry_count(),
        }
    }
}

impl Default for RecommendationCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl std::fmt::Debug for RecommendationCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecommendationCache")
            .field("entry_count", &self.inner.entry_count())
            .finish()
    }
}
