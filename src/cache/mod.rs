//! Cache module for holding composed word-of-the-day results in memory
//!
//! This module provides a small keyed cache with a time-to-live and a bounded
//! number of keys. Expired entries are dropped lazily when read, and the least
//! recently used key is evicted when the cache is full.

mod clock;
mod manager;

pub use clock::{Clock, SystemClock};
#[cfg(any(test, feature = "test-util"))]
pub use clock::ManualClock;
pub use manager::{CacheSettings, ResultCache, MAX_TTL_HOURS};
