//! Query cache over backend reads, backed by [`moka`].
//!
//! # Responsibility
//! - Serve fresh cached values without calling the fetcher.
//! - Run at most one fetch per key at a time; concurrent callers for the
//!   same key share the leader's result.
//! - Retry failed fetches as the policy allows.
//!
//! # Invariants
//! - Each entry expires after the stale time of the policy it was stored
//!   with.
//! - A value whose fetch started before an invalidation of its family is
//!   never served as fresh, even when the fetch finished afterwards.
//! - A leader that unwinds without a result hands the load to one of its
//!   waiters.

use crate::query::key::QueryKey;
use crate::query::policy::QueryPolicy;
use log::{debug, warn};
use moka::sync::Cache;
use moka::Expiry;
use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Upper bound on cached entries; least recently used entries go first.
const MAX_CACHE_ENTRIES: u64 = 1_000;

#[derive(Clone)]
struct CachedValue {
    value: Arc<dyn Any + Send + Sync>,
    /// Invalidation epoch observed when the fetch (or write) started.
    epoch: u64,
    stale_time: Duration,
}

/// Expires every entry after its own policy's stale time.
struct StaleAfter;

impl Expiry<QueryKey, CachedValue> for StaleAfter {
    fn expire_after_create(
        &self,
        _key: &QueryKey,
        value: &CachedValue,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.stale_time)
    }

    fn expire_after_update(
        &self,
        _key: &QueryKey,
        value: &CachedValue,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.stale_time)
    }
}

/// Family invalidations, stamped with a monotonically increasing epoch.
#[derive(Default)]
struct Invalidations {
    epoch: u64,
    families: Vec<(QueryKey, u64)>,
}

impl Invalidations {
    fn record(&mut self, family: &QueryKey) {
        self.epoch += 1;
        let epoch = self.epoch;
        match self.families.iter_mut().find(|(known, _)| known == family) {
            Some(slot) => slot.1 = epoch,
            None => self.families.push((family.clone(), epoch)),
        }
    }

    /// Epoch of the latest invalidation covering `key`, `0` when none.
    fn invalidated_at(&self, key: &QueryKey) -> u64 {
        self.families
            .iter()
            .filter(|(family, _)| key.starts_with(family))
            .map(|(_, epoch)| *epoch)
            .max()
            .unwrap_or(0)
    }

    fn is_superseded(&self, key: &QueryKey, value: &CachedValue) -> bool {
        self.invalidated_at(key) > value.epoch
    }
}

/// Snapshot of cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    /// Fetcher invocations, retries included.
    pub fetches: u64,
    /// Callers served by another caller's in-flight fetch.
    pub shared: u64,
}

/// Cache of backend reads keyed by [`QueryKey`].
///
/// `E` is the fetch error type; it is cloned to every caller waiting on a
/// shared fetch.
pub struct QueryClient<E> {
    cache: Cache<QueryKey, CachedValue>,
    invalidations: Mutex<Invalidations>,
    hits: AtomicU64,
    fetches: AtomicU64,
    shared: AtomicU64,
    _error: std::marker::PhantomData<fn() -> E>,
}

impl<E> Default for QueryClient<E> {
    fn default() -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(MAX_CACHE_ENTRIES)
                .expire_after(StaleAfter)
                .build(),
            invalidations: Mutex::new(Invalidations::default()),
            hits: AtomicU64::new(0),
            fetches: AtomicU64::new(0),
            shared: AtomicU64::new(0),
            _error: std::marker::PhantomData,
        }
    }
}

impl<E> QueryClient<E>
where
    E: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached value for `key` when fresh, otherwise fetches it.
    ///
    /// Concurrent calls for the same key share one fetch. Failed fetches are
    /// retried `policy.retries` times before the error is returned; errors
    /// are never cached.
    pub fn fetch<T, F>(&self, key: &QueryKey, policy: QueryPolicy, mut fetcher: F) -> Result<Arc<T>, E>
    where
        T: Send + Sync + 'static,
        F: FnMut() -> Result<T, E>,
    {
        loop {
            let called_at = self.epoch();

            if let Some(cached) = self.cache.get(key) {
                if !lock(&self.invalidations).is_superseded(key, &cached) {
                    if let Ok(value) = cached.value.downcast::<T>() {
                        self.hits.fetch_add(1, Ordering::Relaxed);
                        debug!(
                            "event=query_fetch module=query status=hit resource={}",
                            key.resource()
                        );
                        return Ok(value);
                    }
                }
                self.cache.invalidate(key);
            }

            let mut led = false;
            let loaded = self.cache.try_get_with(key.clone(), || {
                led = true;
                self.load(key, policy, &mut fetcher)
            });

            let cached = match loaded {
                Ok(cached) => cached,
                Err(err) => return Err((*err).clone()),
            };
            if !led {
                self.shared.fetch_add(1, Ordering::Relaxed);
                // Another caller's fetch started before an invalidation this
                // call already observed; its result must not reach us.
                let invalidated_at = lock(&self.invalidations).invalidated_at(key);
                if invalidated_at > cached.epoch && invalidated_at <= called_at {
                    self.cache.invalidate(key);
                    continue;
                }
            }

            match cached.value.downcast::<T>() {
                Ok(value) => return Ok(value),
                Err(_) => {
                    warn!(
                        "event=query_fetch module=query status=type_mismatch resource={}",
                        key.resource()
                    );
                    self.cache.invalidate(key);
                }
            }
        }
    }

    fn load<T, F>(&self, key: &QueryKey, policy: QueryPolicy, fetcher: &mut F) -> Result<CachedValue, E>
    where
        T: Send + Sync + 'static,
        F: FnMut() -> Result<T, E>,
    {
        let epoch = self.epoch();
        let started_at = Instant::now();
        let result = self.run_with_retries(key, policy, fetcher);

        debug!(
            "event=query_fetch module=query status={} resource={} duration_ms={}",
            if result.is_ok() { "ok" } else { "error" },
            key.resource(),
            started_at.elapsed().as_millis()
        );
        result.map(|value| CachedValue {
            value: Arc::new(value),
            epoch,
            stale_time: policy.stale_time,
        })
    }

    fn run_with_retries<T, F>(&self, key: &QueryKey, policy: QueryPolicy, fetcher: &mut F) -> Result<T, E>
    where
        F: FnMut() -> Result<T, E>,
    {
        let mut attempt: u32 = 0;
        loop {
            self.fetches.fetch_add(1, Ordering::Relaxed);
            match fetcher() {
                Ok(value) => return Ok(value),
                Err(_) if attempt < policy.retries => {
                    attempt += 1;
                    warn!(
                        "event=query_fetch module=query status=retry resource={} attempt={}",
                        key.resource(),
                        attempt
                    );
                    if !policy.retry_delay.is_zero() {
                        std::thread::sleep(policy.retry_delay * attempt);
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl<E> QueryClient<E> {
    /// Returns the cached value until it expires, even after invalidation.
    pub fn get_query_data<T: Send + Sync + 'static>(&self, key: &QueryKey) -> Option<Arc<T>> {
        self.cache.get(key)?.value.downcast::<T>().ok()
    }

    /// Writes a fresh value directly into `key`'s slot.
    pub fn set_query_data<T: Send + Sync + 'static>(
        &self,
        key: QueryKey,
        policy: QueryPolicy,
        value: T,
    ) -> Arc<T> {
        let value = Arc::new(value);
        self.cache.insert(
            key,
            CachedValue {
                value: Arc::clone(&value) as Arc<dyn Any + Send + Sync>,
                epoch: self.epoch(),
                stale_time: policy.stale_time,
            },
        );
        value
    }

    /// Whether `key` holds a value that would be served without fetching.
    pub fn is_fresh(&self, key: &QueryKey) -> bool {
        self.cache
            .get(key)
            .is_some_and(|cached| !lock(&self.invalidations).is_superseded(key, &cached))
    }

    /// Marks every entry of `family` stale, including values still being
    /// fetched; returns how many stored entries were marked.
    pub fn invalidate(&self, family: &QueryKey) -> usize {
        let mut invalidations = lock(&self.invalidations);
        let marked = self
            .cache
            .iter()
            .filter(|(key, cached)| key.starts_with(family) && !invalidations.is_superseded(key, cached))
            .count();
        invalidations.record(family);
        drop(invalidations);

        debug!(
            "event=query_invalidate module=query status=ok family={} marked={}",
            family.resource(),
            marked
        );
        marked
    }

    pub fn remove(&self, key: &QueryKey) -> bool {
        self.cache.remove(key).is_some()
    }

    pub fn clear(&self) {
        let keys: Vec<Arc<QueryKey>> = self.cache.iter().map(|(key, _)| key).collect();
        for key in keys {
            self.cache.invalidate(key.as_ref());
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.cache.iter().count(),
            hits: self.hits.load(Ordering::Relaxed),
            fetches: self.fetches.load(Ordering::Relaxed),
            shared: self.shared.load(Ordering::Relaxed),
        }
    }

    fn epoch(&self) -> u64 {
        lock(&self.invalidations).epoch
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
