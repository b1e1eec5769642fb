use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parla_domain::{ContentProvider, ItemFilter, PracticeError, VocabularyItem};
use tracing::debug;

struct CacheEntry {
    items: Vec<VocabularyItem>,
    stored_at: Instant,
}

/// Wraps a [`ContentProvider`] with a keyed, time-bounded cache of fetched sets.
///
/// Entries are keyed by the whole [`ItemFilter`]. A zero `ttl` disables caching. Failed fetches
/// are never cached.
pub struct CachedContentProvider<P> {
    inner: P,
    ttl: Duration,
    entries: Mutex<HashMap<ItemFilter, CacheEntry>>,
}

impl<P: ContentProvider> CachedContentProvider<P> {
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn invalidate(&self, filter: &ItemFilter) {
        self.lock().remove(filter);
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn cached(&self, filter: &ItemFilter, now: Instant) -> Option<Vec<VocabularyItem>> {
        let mut entries = self.lock();
        let fresh = entries
            .get(filter)
            .map(|entry| now.saturating_duration_since(entry.stored_at) < self.ttl)?;
        if fresh {
            entries.get(filter).map(|entry| entry.items.clone())
        } else {
            entries.remove(filter);
            None
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ItemFilter, CacheEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl<P: ContentProvider> ContentProvider for CachedContentProvider<P> {
    async fn fetch_items(&self, filter: &ItemFilter) -> Result<Vec<VocabularyItem>, PracticeError> {
        if let Some(items) = self.cached(filter, Instant::now()) {
            debug!(set_id = %filter.set_id, "item cache hit");
            return Ok(items);
        }
        let items = self.inner.fetch_items(filter).await?;
        if !self.ttl.is_zero() {
            self.lock().insert(
                filter.clone(),
                CacheEntry {
                    items: items.clone(),
                    stored_at: Instant::now(),
                },
            );
        }
        Ok(items)
    }
}
