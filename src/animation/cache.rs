//! Animation cache with sliding expiration and single-flight fills.
//!
//! Encoded GIF payloads are cached by the raw path string the client sent.
//! Two strings naming the same file are distinct keys.
//!
//! # Expiration
//!
//! Entries expire after sitting idle for longer than the configured TTL.
//! Every hit resets the idle timer. Expired entries are dropped lazily the
//! next time their key is looked up; there is no background sweeper.
//!
//! # Concurrency
//!
//! In [`LockMode::PerKey`] (the default) concurrent misses for the same key
//! share one computation, and misses for different keys compute in parallel.
//! [`LockMode::Global`] reproduces a single process-wide lock held across the
//! whole lookup-or-compute sequence, so at most one computation runs at a time.
//!
//! # Size-Based Eviction
//!
//! On top of expiration, the cache tracks the total payload size in bytes and
//! evicts least-recently-used entries when the capacity is exceeded.

use std::collections::HashMap;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;

use bytes::Bytes;
use lru::LruCache;
use tokio::sync::{Mutex, OnceCell};
use tokio::time::Instant;
use tracing::debug;

use crate::error::RenderError;

/// Default idle window before an entry expires: 5 minutes.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Default cache capacity: 256MB
pub const DEFAULT_CACHE_CAPACITY: usize = 256 * 1024 * 1024;

/// Default maximum number of entries (to bound LRU overhead)
const DEFAULT_MAX_ENTRIES: usize = 10_000;

// =============================================================================
// Lock Mode
// =============================================================================

/// How concurrent cache misses are coordinated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockMode {
    /// One in-flight computation per key; unrelated keys do not wait on each other.
    #[default]
    PerKey,

    /// One lock around every lookup-or-compute, across all keys.
    Global,
}

// =============================================================================
// Cache Entry
// =============================================================================

#[derive(Debug, Clone)]
struct CacheEntry {
    payload: Bytes,
    last_accessed: Instant,
}

/// LRU map plus a running byte count, guarded together.
struct Entries {
    lru: LruCache<String, CacheEntry>,
    size: usize,
}

impl Entries {
    fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.lru.pop(key)?;
        self.size = self.size.saturating_sub(entry.payload.len());
        Some(entry)
    }
}

/// A computation other requests for the same key can join.
#[derive(Default)]
struct InFlight {
    result: OnceCell<Result<Bytes, RenderError>>,

    /// Callers currently joined; only changed under the in-flight map lock
    callers: AtomicUsize,
}

type InFlightMap = HashMap<String, Arc<InFlight>>;

/// One caller's membership in an in-flight computation.
///
/// Dropping the guard, on return or on cancellation, unregisters the flight
/// once it holds a result or once no caller is left to finish it. Later
/// misses then start a fresh computation instead of reading a stale one.
struct FlightGuard<'a> {
    map: &'a StdMutex<InFlightMap>,
    key: &'a str,
    flight: Arc<InFlight>,
}

impl<'a> FlightGuard<'a> {
    /// Join the flight for `key`, registering a new one if none is running.
    fn join(map: &'a StdMutex<InFlightMap>, key: &'a str) -> Self {
        let mut in_flight = map.lock().unwrap_or_else(PoisonError::into_inner);
        let flight = in_flight.entry(key.to_string()).or_default().clone();
        flight.callers.fetch_add(1, Ordering::Relaxed);

        Self { map, key, flight }
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        let mut in_flight = self.map.lock().unwrap_or_else(PoisonError::into_inner);
        let remaining = self.flight.callers.fetch_sub(1, Ordering::Relaxed) - 1;
        let registered = in_flight
            .get(self.key)
            .is_some_and(|current| Arc::ptr_eq(current, &self.flight));

        if registered && (self.flight.result.initialized() || remaining == 0) {
            in_flight.remove(self.key);
        }
    }
}

/// Result of [`AnimationCache::get_or_compute`].
#[derive(Debug, Clone)]
pub struct CacheLookup {
    /// The encoded animation
    pub payload: Bytes,

    /// Whether the payload was already cached (no computation ran for this caller)
    pub cache_hit: bool,
}

// =============================================================================
// Animation Cache
// =============================================================================

/// Cache of encoded animations keyed by requested path.
///
/// The cache is meant to be created once and shared (usually behind the
/// service that owns it) by every request handler.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use bytes::Bytes;
/// use huecache::animation::AnimationCache;
///
/// #[tokio::main]
/// async fn main() {
///     let cache = AnimationCache::new(Duration::from_secs(300));
///
///     let first = cache
///         .get_or_compute("photo.png", || async { Ok(Bytes::from_static(b"GIF89a")) })
///         .await
///         .unwrap();
///     assert!(!first.cache_hit);
///
///     let second = cache
///         .get_or_compute("photo.png", || async { Ok(Bytes::from_static(b"unused")) })
///         .await
///         .unwrap();
///     assert!(second.cache_hit);
///     assert_eq!(first.payload, second.payload);
/// }
/// ```
pub struct AnimationCache {
    /// Live payloads
    entries: Mutex<Entries>,

    /// Computations currently running, by key
    in_flight: StdMutex<InFlightMap>,

    /// Held across lookup-or-compute in `LockMode::Global`
    global_gate: Option<Mutex<()>>,

    /// Idle window
    ttl: Duration,

    /// Maximum total size in bytes
    max_size: usize,
}

impl AnimationCache {
    /// Create a per-key cache with the given idle TTL and default capacity.
    pub fn new(ttl: Duration) -> Self {
        Self::with_options(ttl, DEFAULT_CACHE_CAPACITY, LockMode::PerKey)
    }

    /// Create a cache with explicit TTL, byte capacity and lock mode.
    ///
    /// # Arguments
    ///
    /// * `ttl` - Idle time after which an entry expires
    /// * `max_size` - Maximum total size of cached payloads in bytes
    /// * `mode` - How concurrent misses are coordinated
    pub fn with_options(ttl: Duration, max_size: usize, mode: LockMode) -> Self {
        Self {
            entries: Mutex::new(Entries {
                lru: LruCache::new(
                    NonZeroUsize::new(DEFAULT_MAX_ENTRIES).unwrap_or(NonZeroUsize::MIN),
                ),
                size: 0,
            }),
            in_flight: StdMutex::new(HashMap::new()),
            global_gate: match mode {
                LockMode::Global => Some(Mutex::new(())),
                LockMode::PerKey => None,
            },
            ttl,
            max_size,
        }
    }

    /// Return the cached payload for `key`, or compute, store and return it.
    ///
    /// A hit refreshes the entry's idle timer and never calls `compute`.
    /// A failed computation is returned to every caller that joined it and
    /// nothing is stored, so the next request tries again.
    pub async fn get_or_compute<F, Fut>(
        &self,
        key: &str,
        compute: F,
    ) -> Result<CacheLookup, RenderError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Bytes, RenderError>>,
    {
        let _gate = match &self.global_gate {
            Some(gate) => Some(gate.lock().await),
            None => None,
        };

        // Fast path: live entry
        if let Some(payload) = self.get(key).await {
            return Ok(CacheLookup {
                payload,
                cache_hit: true,
            });
        }

        // Slow path: join the in-flight computation or start one
        let guard = FlightGuard::join(&self.in_flight, key);

        let mut computed = false;
        let ran = &mut computed;
        let result = guard
            .flight
            .result
            .get_or_init(move || async move {
                *ran = true;
                let result = compute().await;
                if let Ok(ref payload) = result {
                    self.put(key.to_string(), payload.clone()).await;
                }
                result
            })
            .await
            .clone();
        drop(guard);

        if !computed {
            debug!(key = key, "Joined in-flight computation");
        }

        result.map(|payload| CacheLookup {
            payload,
            cache_hit: !computed,
        })
    }

    /// Get a live payload, refreshing its idle timer.
    ///
    /// An entry found past its TTL is removed and `None` is returned.
    pub async fn get(&self, key: &str) -> Option<Bytes> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();

        match entries.lru.get_mut(key) {
            None => return None,
            Some(entry) if now.duration_since(entry.last_accessed) <= self.ttl => {
                entry.last_accessed = now;
                return Some(entry.payload.clone());
            }
            Some(_) => {}
        }

        entries.remove(key);
        debug!(key = key, "Expired cache entry removed");
        None
    }

    /// Check for a live entry without refreshing it or touching LRU order.
    pub async fn contains(&self, key: &str) -> bool {
        let entries = self.entries.lock().await;
        entries
            .lru
            .peek(key)
            .is_some_and(|entry| entry.last_accessed.elapsed() <= self.ttl)
    }

    /// Store a payload, replacing any previous entry for the key.
    ///
    /// Least-recently-used entries are evicted until the total size fits.
    pub async fn put(&self, key: String, payload: Bytes) {
        let payload_size = payload.len();
        let mut entries = self.entries.lock().await;

        entries.remove(&key);
        if let Some((evicted_key, evicted)) = entries.lru.push(
            key,
            CacheEntry {
                payload,
                last_accessed: Instant::now(),
            },
        ) {
            entries.size = entries.size.saturating_sub(evicted.payload.len());
            debug!(key = %evicted_key, "Evicted cache entry (entry limit)");
        }
        entries.size += payload_size;

        while entries.size > self.max_size {
            match entries.lru.pop_lru() {
                Some((evicted_key, evicted)) => {
                    entries.size = entries.size.saturating_sub(evicted.payload.len());
                    debug!(key = %evicted_key, "Evicted cache entry (size limit)");
                }
                None => break,
            }
        }
    }

    /// Remove an entry, returning its payload if it existed.
    pub async fn remove(&self, key: &str) -> Option<Bytes> {
        let mut entries = self.entries.lock().await;
        entries.remove(key).map(|entry| entry.payload)
    }

    /// Clear all entries from the cache.
    pub async fn clear(&self) {
        let mut entries = self.entries.lock().await;
        entries.lru.clear();
        entries.size = 0;
    }

    /// Number of stored entries, including expired ones not yet looked up.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.lru.len()
    }

    /// Check if the cache is empty.
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.lru.is_empty()
    }

    /// Current total size of cached payloads in bytes.
    pub async fn size(&self) -> usize {
        self.entries.lock().await.size
    }

    /// Get the maximum capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.max_size
    }

    /// Get the idle TTL.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Get the lock mode this cache was built with.
    pub fn lock_mode(&self) -> LockMode {
        if self.global_gate.is_some() {
            LockMode::Global
        } else {
            LockMode::PerKey
        }
    }
}

impl Default for AnimationCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

// =============================================================================
// Tests
// =============================================================================
