//! Time-boxed, fail-open cache of approved community contributions
//!
//! The cache moves between three states:
//!
//! - `Empty`: nothing cached (or the last successful fetch returned no rows)
//! - `Fresh`: cached rows younger than the TTL, served without a fetch
//! - `Stale`: TTL elapsed, the next `get()` refetches
//!
//! A failed or timed-out fetch never changes the state: the last good snapshot
//! keeps being served. Concurrent callers that observe staleness share one
//! fetch attempt through the refresh lock, whether that attempt succeeds or not.

use crate::config::ResolverConfig;
use crate::dictionary::{DictionaryEntry, Provenance};
use crate::error::{LexError, LexResult};
use crate::mt::store::{ContributionRecord, ContributionStore};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Immutable view of the overlay handed to one resolution
pub type OverlaySnapshot = Arc<HashMap<String, DictionaryEntry>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayState {
    Empty,
    Fresh,
    Stale,
}

#[derive(Debug, Default)]
struct CacheSlot {
    entries: OverlaySnapshot,
    last_fetch_at: Option<Instant>,
}

pub struct OverlayCache {
    store: Arc<dyn ContributionStore>,
    ttl: Duration,
    fetch_timeout: Duration,
    slot: RwLock<CacheSlot>,
    refresh_lock: tokio::sync::Mutex<()>,
    // bumped after every fetch attempt, failed ones included
    attempts: AtomicU64,
}

impl OverlayCache {
    pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);
    pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new(store: Arc<dyn ContributionStore>) -> Self {
        Self {
            store,
            ttl: Self::DEFAULT_TTL,
            fetch_timeout: Self::DEFAULT_FETCH_TIMEOUT,
            slot: RwLock::new(CacheSlot::default()),
            refresh_lock: tokio::sync::Mutex::new(()),
            attempts: AtomicU64::new(0),
        }
    }

    pub fn from_config(store: Arc<dyn ContributionStore>, config: &ResolverConfig) -> Self {
        Self::new(store)
            .with_ttl(config.overlay_ttl)
            .with_fetch_timeout(config.fetch_timeout)
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Current overlay, refreshing first if it is empty or stale
    ///
    /// Never fails: a refresh error leaves the cache as it was and the
    /// previous snapshot is returned. Callers queued behind an in-flight
    /// attempt take its outcome instead of fetching again.
    pub async fn get(&self) -> OverlaySnapshot {
        let seen = self.attempts.load(Ordering::Acquire);
        if let Some(snapshot) = self.fresh_snapshot() {
            return snapshot;
        }

        let _guard = self.refresh_lock.lock().await;
        if let Some(snapshot) = self.fresh_snapshot() {
            debug!("overlay refreshed by a concurrent caller");
            return snapshot;
        }
        if self.attempts.load(Ordering::Acquire) != seen {
            debug!("concurrent overlay refresh already attempted, serving cached overlay");
            return self.snapshot();
        }

        fail_open(self.fetch_and_swap().await, self.snapshot())
    }

    /// Fetch approved contributions and replace the cached map
    ///
    /// Serialized with `get()` through the refresh lock. On error the cache
    /// is not touched.
    pub async fn refresh(&self) -> LexResult<OverlaySnapshot> {
        let _guard = self.refresh_lock.lock().await;
        self.fetch_and_swap().await
    }

    /// Caller must hold `refresh_lock`
    async fn fetch_and_swap(&self) -> LexResult<OverlaySnapshot> {
        let fetched = tokio::time::timeout(self.fetch_timeout, self.store.fetch_approved()).await;
        self.attempts.fetch_add(1, Ordering::AcqRel);

        let records = fetched.map_err(|_| {
            LexError::Timeout(format!(
                "{} did not answer within {:?}",
                self.store.store_name(),
                self.fetch_timeout
            ))
        })??;

        let fetched = records.len();
        let snapshot: OverlaySnapshot = Arc::new(build_overlay(records));

        let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());
        slot.entries = Arc::clone(&snapshot);
        slot.last_fetch_at = Some(Instant::now());
        drop(slot);

        info!(
            "overlay refreshed from {}: {} entries from {} rows",
            self.store.store_name(),
            snapshot.len(),
            fetched
        );
        Ok(snapshot)
    }

    /// Cached overlay without any refresh attempt
    pub fn snapshot(&self) -> OverlaySnapshot {
        Arc::clone(&self.slot.read().unwrap_or_else(|e| e.into_inner()).entries)
    }

    pub fn state(&self) -> OverlayState {
        let slot = self.slot.read().unwrap_or_else(|e| e.into_inner());
        match slot.last_fetch_at {
            _ if slot.entries.is_empty() => OverlayState::Empty,
            Some(at) if at.elapsed() < self.ttl => OverlayState::Fresh,
            _ => OverlayState::Stale,
        }
    }

    pub fn last_fetch_at(&self) -> Option<Instant> {
        self.slot.read().unwrap_or_else(|e| e.into_inner()).last_fetch_at
    }

    /// Drop everything; the next `get()` fetches
    pub fn clear(&self) {
        let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());
        *slot = CacheSlot::default();
    }

    fn fresh_snapshot(&self) -> Option<OverlaySnapshot> {
        let slot = self.slot.read().unwrap_or_else(|e| e.into_inner());
        match slot.last_fetch_at {
            Some(at) if at.elapsed() < self.ttl && !slot.entries.is_empty() => {
                Some(Arc::clone(&slot.entries))
            }
            _ => None,
        }
    }
}

impl std::fmt::Debug for OverlayCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayCache")
            .field("store", &self.store.store_name())
            .field("ttl", &self.ttl)
            .field("fetch_timeout", &self.fetch_timeout)
            .field("state", &self.state())
            .finish()
    }
}

/// Serve `last_known_good` when a refresh failed
pub fn fail_open<T>(result: LexResult<T>, last_known_good: T) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            warn!("overlay refresh failed, serving last known-good overlay: {}", e);
            last_known_good
        }
    }
}

/// Turn newest-first contribution rows into overlay entries
///
/// The first row seen for a key wins. Rows that are not approved or cannot
/// form a valid entry are skipped.
pub fn build_overlay(records: Vec<ContributionRecord>) -> HashMap<String, DictionaryEntry> {
    let mut entries = HashMap::with_capacity(records.len());

    for record in records {
        if !record.is_approved() {
            debug!("skipping contribution {} with status {:?}", record.id, record.status);
            continue;
        }

        let entry = match DictionaryEntry::new(&record.word, &record.translation) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("skipping contribution {}: {}", record.id, e);
                continue;
            }
        };
        if entries.contains_key(&entry.key) {
            continue;
        }

        let entry = entry
            .with_phonetic(record.phonetic)
            .with_notes(record.example)
            .with_provenance(Provenance::Contribution {
                contribution_id: record.id,
            });
        entries.insert(entry.key.clone(), entry);
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mt::store::InMemoryContributionStore;

    fn record(id: &str, word: &str, translation: &str) -> ContributionRecord {
        ContributionRecord::approved(id, word, translation)
    }

    fn cache_over(store: &Arc<InMemoryContributionStore>) -> OverlayCache {
        OverlayCache::new(store.clone())
    }

    #[test]
    fn test_build_overlay_first_seen_wins() {
        let entries = build_overlay(vec![
            record("2", "Ăn", "kin"),
            record("1", "ăn", "kỉn"),
        ]);
        assert_eq!(entries.len(), 1);
        let entry = &entries["ăn"];
        assert_eq!(entry.primary_script(), "kin");
        assert_eq!(
            entry.provenance,
            Provenance::Contribution {
                contribution_id: "2".to_string()
            }
        );
    }

    #[test]
    fn test_build_overlay_skips_invalid_rows() {
        let mut pending = record("3", "uống", "kin nặm");
        pending.status = "pending".to_string();
        let entries = build_overlay(vec![
            record("1", "  ", "kin"),
            record("2", "ngủ", ""),
            pending,
            record("4", "nhà", "rườn"),
        ]);
        assert_eq!(entries.len(), 1);
        assert!(entries.contains_key("nhà"));
    }

    #[test]
    fn test_build_overlay_keeps_phonetic_and_example() {
        let mut row = record("1", "nhà", "rườn");
        row.phonetic = Some("rɨən".to_string());
        row.example = Some("rườn kù".to_string());
        let entries = build_overlay(vec![row]);
        assert_eq!(entries["nhà"].phonetic.as_deref(), Some("rɨən"));
        assert_eq!(entries["nhà"].notes.as_deref(), Some("rườn kù"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_cache_is_reused() {
        let store = Arc::new(InMemoryContributionStore::new(vec![record("1", "nhà", "rườn")]));
        let cache = cache_over(&store);
        assert_eq!(cache.state(), OverlayState::Empty);

        let first = cache.get().await;
        assert_eq!(cache.state(), OverlayState::Fresh);
        tokio::time::advance(Duration::from_secs(60)).await;
        let second = cache.get().await;

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.fetch_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_cache_refetches() {
        let store = Arc::new(InMemoryContributionStore::new(vec![record("1", "nhà", "rườn")]));
        let cache = cache_over(&store);
        cache.get().await;

        tokio::time::advance(OverlayCache::DEFAULT_TTL).await;
        assert_eq!(cache.state(), OverlayState::Stale);

        store.set_records(vec![record("1", "nhà", "rườn"), record("2", "tôi", "kù")]);
        let refreshed = cache.get().await;
        assert_eq!(store.fetch_count(), 2);
        assert_eq!(refreshed.len(), 2);
        assert_eq!(cache.state(), OverlayState::Fresh);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_failure_keeps_last_snapshot() {
        let store = Arc::new(InMemoryContributionStore::new(vec![record("1", "nhà", "rườn")]));
        let cache = cache_over(&store);
        let good = cache.get().await;
        let stamped = cache.last_fetch_at();

        tokio::time::advance(OverlayCache::DEFAULT_TTL + Duration::from_secs(1)).await;
        store.set_failing(true);
        let served = cache.get().await;

        assert!(Arc::ptr_eq(&good, &served));
        assert_eq!(store.fetch_count(), 2);
        assert_eq!(cache.last_fetch_at(), stamped);
        assert_eq!(cache.state(), OverlayState::Stale);
        assert!(cache.refresh().await.is_err());
    }

    #[tokio::test]
    async fn test_fetch_failure_on_empty_cache() {
        let store = Arc::new(InMemoryContributionStore::new(vec![record("1", "nhà", "rườn")]));
        store.set_failing(true);
        let cache = cache_over(&store);
        assert!(cache.get().await.is_empty());
        assert_eq!(cache.state(), OverlayState::Empty);
        assert!(cache.last_fetch_at().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_timeout_is_a_failure() {
        let store = Arc::new(
            InMemoryContributionStore::new(vec![record("1", "nhà", "rườn")])
                .with_delay(Duration::from_secs(30)),
        );
        let cache = cache_over(&store).with_fetch_timeout(Duration::from_secs(1));
        assert!(matches!(cache.refresh().await, Err(LexError::Timeout(_))));
        assert!(cache.get().await.is_empty());
    }

    #[tokio::test]
    async fn test_empty_fetch_is_retried() {
        let store = Arc::new(InMemoryContributionStore::new(vec![]));
        let cache = cache_over(&store);
        cache.get().await;
        cache.get().await;
        assert_eq!(store.fetch_count(), 2);
        assert_eq!(cache.state(), OverlayState::Empty);
    }

    #[tokio::test]
    async fn test_clear_resets_to_empty() {
        let store = Arc::new(InMemoryContributionStore::new(vec![record("1", "nhà", "rườn")]));
        let cache = cache_over(&store);
        cache.get().await;
        cache.clear();
        assert_eq!(cache.state(), OverlayState::Empty);
        assert!(cache.snapshot().is_empty());

        cache.get().await;
        assert_eq!(store.fetch_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_refreshes_share_one_fetch() {
        let store = Arc::new(
            InMemoryContributionStore::new(vec![record("1", "nhà", "rườn")])
                .with_delay(Duration::from_millis(50)),
        );
        let cache = cache_over(&store);

        let (a, b, c) = tokio::join!(cache.get(), cache.get(), cache.get());
        assert_eq!(store.fetch_count(), 1);
        assert!(Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&b, &c));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_one_timed_out_fetch() {
        let store = Arc::new(
            InMemoryContributionStore::new(vec![record("1", "nhà", "rườn")])
                .with_delay(Duration::from_secs(30)),
        );
        let cache = cache_over(&store).with_fetch_timeout(Duration::from_secs(1));

        let started = Instant::now();
        let (a, b, c, d, e) =
            tokio::join!(cache.get(), cache.get(), cache.get(), cache.get(), cache.get());

        assert_eq!(store.fetch_count(), 1);
        assert!(started.elapsed() < Duration::from_secs(2));
        assert!([a, b, c, d, e].iter().all(|s| s.is_empty()));
        assert_eq!(cache.state(), OverlayState::Empty);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_one_failed_fetch_when_stale() {
        let store = Arc::new(
            InMemoryContributionStore::new(vec![record("1", "nhà", "rườn")])
                .with_delay(Duration::from_millis(500)),
        );
        let cache = cache_over(&store);
        let good = cache.get().await;

        tokio::time::advance(OverlayCache::DEFAULT_TTL).await;
        store.set_failing(true);
        let (a, b, c, d) = tokio::join!(cache.get(), cache.get(), cache.get(), cache.get());

        assert_eq!(store.fetch_count(), 2);
        for served in [a, b, c, d] {
            assert!(Arc::ptr_eq(&good, &served));
        }
        assert_eq!(cache.state(), OverlayState::Stale);

        // the outage is over, so the next caller fetches again
        store.set_failing(false);
        assert_eq!(cache.get().await.len(), 1);
        assert_eq!(store.fetch_count(), 3);
        assert_eq!(cache.state(), OverlayState::Fresh);
    }

    #[tokio::test]
    async fn test_refresh_waits_for_in_flight_get() {
        let store = Arc::new(
            InMemoryContributionStore::new(vec![record("1", "nhà", "rườn")])
                .with_delay(Duration::from_millis(20)),
        );
        let cache = cache_over(&store);

        let (got, refreshed) = tokio::join!(cache.get(), cache.refresh());
        assert_eq!(got.len(), 1);
        assert_eq!(refreshed.unwrap().len(), 1);
        assert_eq!(store.fetch_count(), 2);
    }

    #[test]
    fn test_fail_open_passes_success_through() {
        assert_eq!(fail_open(Ok(1), 0), 1);
        assert_eq!(fail_open(Err(LexError::Store("down".to_string())), 0), 0);
    }
}
