//! Keyed remote-resource cache with request deduplication
//!
//! Maps a composed request key (see [`crate::key`]) to the lifecycle state of
//! a single remote fetch. Guarantees at most one in-flight fetch per key:
//! a `request` while an entry is already `Pending` or `Succeeded` is a no-op,
//! while `refresh` unconditionally issues a new fetch that supersedes any
//! in-flight one.
//!
//! Race resolution: every issued fetch is tagged with a sequence number
//! drawn from a cache-wide monotonic counter, so numbers stay unique even
//! when an entry is removed and recreated. A completion is applied only if
//! its sequence number is the one the entry currently carries; late
//! completions of superseded fetches are dropped. Last-issued-wins, not
//! last-resolved-wins.
//!
//! Stale-while-revalidate: `CacheEntry::data` holds the last successful
//! payload and stays readable for the whole duration of a refresh, and after
//! a failed settlement. `status` and `error` always reflect the latest
//! settlement, so readers can distinguish fresh, revalidating, and failed
//! states.

use crate::error::TransportError;
use crate::event::{DataEvent, EventBus};
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Lifecycle state of the latest issued fetch for a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    /// A fetch is in flight
    Pending,
    /// The latest fetch settled with data
    Succeeded,
    /// The latest fetch settled with an error
    Failed,
}

/// Lifecycle record for one request key
///
/// `data` is the last *successful* payload for this key, independent of
/// `status`: during a refresh (`Pending`) and after a failed refresh
/// (`Failed`) it still holds the previous result for stale rendering.
#[derive(Debug)]
pub struct CacheEntry<T> {
    pub key: String,
    pub status: FetchStatus,
    pub data: Option<Arc<T>>,
    pub error: Option<TransportError>,
    pub requested_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    /// Sequence number of the latest fetch issued for this key, drawn from
    /// the cache-wide counter
    seq: u64,
}

// Manual impl: Arc makes entries cloneable without T: Clone.
impl<T> Clone for CacheEntry<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            status: self.status,
            data: self.data.clone(),
            error: self.error.clone(),
            requested_at: self.requested_at,
            resolved_at: self.resolved_at,
            seq: self.seq,
        }
    }
}

impl<T> CacheEntry<T> {
    fn pending(key: String, seq: u64) -> Self {
        Self {
            key,
            status: FetchStatus::Pending,
            data: None,
            error: None,
            requested_at: Utc::now(),
            resolved_at: None,
            seq,
        }
    }

    /// Issue a new fetch for an existing entry: adopt a freshly drawn
    /// sequence number so any in-flight completion is superseded, go back
    /// to `Pending`, keep the last successful data readable.
    fn reissue(&mut self, seq: u64) {
        self.seq = seq;
        self.status = FetchStatus::Pending;
        self.error = None;
        self.requested_at = Utc::now();
        self.resolved_at = None;
    }

    pub fn is_pending(&self) -> bool {
        self.status == FetchStatus::Pending
    }

    pub fn is_succeeded(&self) -> bool {
        self.status == FetchStatus::Succeeded
    }

    pub fn is_failed(&self) -> bool {
        self.status == FetchStatus::Failed
    }
}

struct CacheInner<T> {
    kind: &'static str,
    entries: DashMap<String, CacheEntry<T>>,
    /// Source of fetch sequence numbers. Cache-wide so a number can never
    /// repeat for a key whose entry was invalidated and recreated.
    next_seq: AtomicU64,
    bus: EventBus,
}

/// Keyed fetch-and-cache coordinator for one resource kind
///
/// Cheap to clone (shared interior). All mutations go through per-shard
/// locking in the entry map; correctness across overlapping fetches for a
/// single key rests on the sequence-number check applied under the entry
/// lock. Distinct keys are fully independent.
pub struct ResourceCache<T> {
    inner: Arc<CacheInner<T>>,
}

impl<T> Clone for ResourceCache<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Send + Sync + 'static> ResourceCache<T> {
    /// Create a cache for one resource kind, publishing settlements on `bus`
    pub fn new(kind: &'static str, bus: EventBus) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                kind,
                entries: DashMap::new(),
                next_seq: AtomicU64::new(0),
                bus,
            }),
        }
    }

    /// Resource kind label used in events and logs
    pub fn kind(&self) -> &'static str {
        self.inner.kind
    }

    /// Synchronous snapshot of the entry for `key`, if any. No side effects.
    pub fn get(&self, key: &str) -> Option<CacheEntry<T>> {
        self.inner.entries.get(key).map(|r| r.value().clone())
    }

    /// Last successful payload for `key`, regardless of current status
    pub fn data(&self, key: &str) -> Option<Arc<T>> {
        self.inner.entries.get(key).and_then(|r| r.value().data.clone())
    }

    /// Fetch `key` unless a fetch is already in flight or has succeeded.
    ///
    /// Idempotent while `Pending` or `Succeeded`: the fetcher is dropped
    /// unpolled and no second network operation is issued. A `Failed` entry
    /// is re-attempted.
    pub fn request<F>(&self, key: impl Into<String>, fetcher: F)
    where
        F: Future<Output = Result<T, TransportError>> + Send + 'static,
    {
        let key = key.into();
        let seq = match self.inner.entries.entry(key.clone()) {
            Entry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();
                match entry.status {
                    FetchStatus::Pending | FetchStatus::Succeeded => {
                        debug!(
                            kind = self.inner.kind,
                            key,
                            status = ?entry.status,
                            "request deduplicated"
                        );
                        return;
                    }
                    FetchStatus::Failed => {
                        let seq = self.inner.issue_seq();
                        entry.reissue(seq);
                        seq
                    }
                }
            }
            Entry::Vacant(vacant) => {
                let seq = self.inner.issue_seq();
                vacant.insert(CacheEntry::pending(key.clone(), seq));
                seq
            }
        };

        debug!(kind = self.inner.kind, key, seq, "fetch issued");
        self.spawn_fetch(key, seq, fetcher);
    }

    /// Unconditionally fetch `key`, superseding any in-flight fetch.
    ///
    /// The entry transitions to `Pending`; the previous successful payload
    /// stays readable via [`Self::data`] until the new fetch settles. If a
    /// superseded fetch resolves later, its result is discarded.
    pub fn refresh<F>(&self, key: impl Into<String>, fetcher: F)
    where
        F: Future<Output = Result<T, TransportError>> + Send + 'static,
    {
        let key = key.into();
        // Drawn under the entry lock so stamp order matches issue order
        let seq = match self.inner.entries.entry(key.clone()) {
            Entry::Occupied(mut occupied) => {
                let seq = self.inner.issue_seq();
                occupied.get_mut().reissue(seq);
                seq
            }
            Entry::Vacant(vacant) => {
                let seq = self.inner.issue_seq();
                vacant.insert(CacheEntry::pending(key.clone(), seq));
                seq
            }
        };

        debug!(kind = self.inner.kind, key, seq, "refresh issued");
        self.spawn_fetch(key, seq, fetcher);
    }

    /// Drop the entry for `key`; the next `request` refetches
    pub fn invalidate(&self, key: &str) {
        if self.inner.entries.remove(key).is_some() {
            debug!(kind = self.inner.kind, key, "cache entry invalidated");
        }
    }

    /// Drop all entries
    pub fn clear(&self) {
        self.inner.entries.clear();
        debug!(kind = self.inner.kind, "cache cleared");
    }

    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    fn spawn_fetch<F>(&self, key: String, seq: u64, fetcher: F)
    where
        F: Future<Output = Result<T, TransportError>> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let result = fetcher.await;
            inner.settle(&key, seq, result);
        });
    }
}

impl<T: Send + Sync + 'static> CacheInner<T> {
    /// Draw the next fetch sequence number (first issued is 1)
    fn issue_seq(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Apply a fetch completion if it is still the latest issued for `key`
    fn settle(&self, key: &str, seq: u64, result: Result<T, TransportError>) {
        let event = {
            let Some(mut entry) = self.entries.get_mut(key) else {
                debug!(kind = self.kind, key, seq, "completion for evicted entry dropped");
                return;
            };

            if entry.seq != seq {
                debug!(
                    kind = self.kind,
                    key,
                    issued = seq,
                    latest = entry.seq,
                    "superseded completion dropped"
                );
                return;
            }

            entry.resolved_at = Some(Utc::now());
            match result {
                Ok(data) => {
                    entry.status = FetchStatus::Succeeded;
                    entry.data = Some(Arc::new(data));
                    entry.error = None;
                    debug!(kind = self.kind, key, seq, "fetch succeeded");
                    DataEvent::ResourceResolved {
                        kind: self.kind,
                        key: key.to_string(),
                    }
                }
                Err(err) => {
                    entry.status = FetchStatus::Failed;
                    warn!(kind = self.kind, key, seq, error = %err, "fetch failed");
                    entry.error = Some(err);
                    DataEvent::ResourceFailed {
                        kind: self.kind,
                        key: key.to_string(),
                    }
                }
            }
        };

        self.bus.publish(event);
    }
}
