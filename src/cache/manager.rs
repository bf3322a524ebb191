//! In-memory result cache with TTL expiry and LRU eviction
//!
//! Provides a `ResultCache` that stores values under string keys together with
//! the time they were cached. Entries older than the TTL are never returned.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::Deserialize;
use tracing::{debug, trace};

use super::clock::{Clock, SystemClock};

/// Default time-to-live for cache entries in hours
pub const DEFAULT_TTL_HOURS: u64 = 24;

/// Default maximum number of keys
pub const DEFAULT_CAPACITY: usize = 10;

/// Longest accepted time-to-live in hours (one year)
pub const MAX_TTL_HOURS: u64 = 24 * 365;

/// Cache sizing and expiry settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// How long an entry stays servable
    pub ttl_hours: u64,
    /// Maximum number of keys held at once
    pub capacity: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_hours: DEFAULT_TTL_HOURS,
            capacity: DEFAULT_CAPACITY,
        }
    }
}

/// Converts configured hours into a TTL clamped to `1..=MAX_TTL_HOURS`
fn ttl_from_hours(hours: u64) -> Duration {
    let hours = hours.clamp(1, MAX_TTL_HOURS);
    i64::try_from(hours)
        .ok()
        .and_then(Duration::try_hours)
        .unwrap_or_else(|| Duration::days(365))
}

/// A stored value with its bookkeeping
#[derive(Debug)]
struct CacheEntry<V> {
    value: V,
    /// When the value was stored
    cached_at: DateTime<Utc>,
    /// Recency stamp for LRU eviction
    last_used: u64,
}

#[derive(Debug)]
struct Storage<V> {
    entries: HashMap<String, CacheEntry<V>>,
    /// Monotonic counter handed out as recency stamps
    tick: u64,
}

impl<V> Storage<V> {
    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    /// Removes the entry with the oldest recency stamp
    fn evict_least_recently_used(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(key, _)| key.clone());

        if let Some(key) = oldest {
            debug!(%key, "evicting least recently used cache entry");
            self.entries.remove(&key);
        }
    }
}

/// Thread-safe keyed cache with time-based expiry
///
/// Reads take `&self`, so a single cache can be shared behind an `Arc`.
/// Expiry is evaluated on read: an entry is valid only while
/// `now - cached_at < ttl`.
#[derive(Debug)]
pub struct ResultCache<V, C = SystemClock> {
    storage: Mutex<Storage<V>>,
    ttl: Duration,
    capacity: usize,
    clock: C,
}

impl<V: Clone> ResultCache<V, SystemClock> {
    /// Creates a cache using the system clock
    pub fn new(settings: &CacheSettings) -> Self {
        Self::with_clock(settings, SystemClock)
    }
}

impl<V: Clone> Default for ResultCache<V, SystemClock> {
    fn default() -> Self {
        Self::new(&CacheSettings::default())
    }
}

impl<V: Clone, C: Clock> ResultCache<V, C> {
    /// Creates a cache that reads time from `clock`
    pub fn with_clock(settings: &CacheSettings, clock: C) -> Self {
        Self {
            storage: Mutex::new(Storage {
                entries: HashMap::new(),
                tick: 0,
            }),
            ttl: ttl_from_hours(settings.ttl_hours),
            capacity: settings.capacity.max(1),
            clock,
        }
    }

    /// Returns the cached value for `key` if it has not expired
    ///
    /// An expired entry is removed and reported as absent.
    pub fn get_if_valid(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let mut storage = self.storage.lock();

        let expired = match storage.entries.get(key) {
            None => {
                trace!(key, "cache miss");
                return None;
            }
            Some(entry) => now - entry.cached_at >= self.ttl,
        };

        if expired {
            debug!(key, "cache entry expired");
            storage.entries.remove(key);
            return None;
        }

        let tick = storage.next_tick();
        let entry = storage.entries.get_mut(key)?;
        entry.last_used = tick;
        trace!(key, "cache hit");
        Some(entry.value.clone())
    }

    /// Stores `value` under `key`, replacing any previous entry
    ///
    /// When the cache is full and `key` is new, the least recently used entry
    /// is evicted first.
    pub fn put(&self, key: impl Into<String>, value: V) {
        let key = key.into();
        let now = self.clock.now();
        let mut storage = self.storage.lock();

        if !storage.entries.contains_key(&key) && storage.entries.len() >= self.capacity {
            storage.evict_least_recently_used();
        }

        let tick = storage.next_tick();
        storage.entries.insert(
            key,
            CacheEntry {
                value,
                cached_at: now,
                last_used: tick,
            },
        );
    }

    /// Removes the entry for `key` regardless of its age
    pub fn invalidate(&self, key: &str) {
        if self.storage.lock().entries.remove(key).is_some() {
            debug!(key, "cache entry invalidated");
        }
    }

    /// Number of stored entries, including ones that expired but were not read yet
    pub fn len(&self) -> usize {
        self.storage.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
