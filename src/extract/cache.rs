//! TTL cache in front of a [`MediaExtractor`].
//!
//! Keyed by the canonical post URL. Only successful extractions are stored;
//! concurrent misses for the same key share a single upstream call.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::future::Cache;

use super::error::ExtractError;
use super::link::InstagramLink;
use super::{MediaExtractor, MediaItem};
use crate::core::metrics;

/// Hit/miss counters of a [`MediaCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

pub struct MediaCache {
    extractor: Arc<dyn MediaExtractor>,
    entries: Cache<String, Arc<Vec<MediaItem>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MediaCache {
    pub fn new(extractor: Arc<dyn MediaExtractor>, ttl: Duration, max_capacity: u64) -> Self {
        let entries = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .build();

        Self {
            extractor,
            entries,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Returns the media of `link`, calling the extractor only on a miss.
    pub async fn get_or_extract(&self, link: &InstagramLink) -> Result<Arc<Vec<MediaItem>>, ExtractError> {
        let key = link.canonical_url();
        let loaded = AtomicBool::new(false);

        let result = self
            .entries
            .try_get_with(key.clone(), async {
                loaded.store(true, Ordering::Relaxed);
                let started = Instant::now();
                let outcome = self.extractor.extract(link).await;
                metrics::EXTRACTION_DURATION_SECONDS.observe(started.elapsed().as_secs_f64());
                if let Err(ref e) = outcome {
                    metrics::record_extraction_failure(e.subcategory());
                }
                outcome.map(Arc::new)
            })
            .await;

        if loaded.load(Ordering::Relaxed) {
            self.misses.fetch_add(1, Ordering::Relaxed);
            metrics::CACHE_MISSES_TOTAL.inc();
            log::debug!("Cache miss for {} ({})", key, self.extractor.name());
        } else if result.is_ok() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            metrics::CACHE_HITS_TOTAL.inc();
            log::debug!("Cache hit for {}", key);
        }

        result.map_err(|e| (*e).clone())
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Number of cached posts, after dropping expired entries.
    pub async fn entry_count(&self) -> u64 {
        self.entries.run_pending_tasks().await;
        self.entries.entry_count()
    }
}
