//! Time-to-live cache for loaded catalog contents
//!
//! Every catalog read accessor goes through `load_if_stale`, which serves the
//! cached value while it is younger than the TTL and re-runs the loader
//! otherwise.

use std::time::{Duration, Instant};

/// A lazily-filled value with a last-load timestamp
#[derive(Debug, Clone)]
pub struct TtlCache<T> {
    entry: Option<(T, Instant)>,
    /// `None` never expires
    ttl: Option<Duration>,
    loads: u64,
}

impl<T> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entry: None,
            ttl: Some(ttl),
            loads: 0,
        }
    }

    /// A cache that stays fresh once filled
    pub fn forever() -> Self {
        Self {
            entry: None,
            ttl: None,
            loads: 0,
        }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Serve the cached value, or run `load` when empty or expired.
    ///
    /// A failed load leaves the cache empty so the next access retries.
    pub fn load_if_stale<E, F>(&mut self, load: F) -> Result<&T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let entry = match self.entry.take() {
            Some((value, loaded_at)) if self.is_fresh_at(loaded_at) => (value, loaded_at),
            _ => {
                let value = load()?;
                self.loads += 1;
                (value, Instant::now())
            }
        };

        Ok(&self.entry.insert(entry).0)
    }

    /// Drop the cached value; the next access reloads
    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    /// Cached value regardless of age
    pub fn get(&self) -> Option<&T> {
        self.entry.as_ref().map(|(value, _)| value)
    }

    pub fn is_stale(&self) -> bool {
        match &self.entry {
            Some((_, loaded_at)) => !self.is_fresh_at(*loaded_at),
            None => true,
        }
    }

    /// Time since the last successful load
    pub fn age(&self) -> Option<Duration> {
        self.entry.as_ref().map(|(_, loaded_at)| loaded_at.elapsed())
    }

    /// Number of successful loads so far
    pub fn load_count(&self) -> u64 {
        self.loads
    }

    fn is_fresh_at(&self, loaded_at: Instant) -> bool {
        match self.ttl {
            Some(ttl) => loaded_at.elapsed() < ttl,
            None => true,
        }
    }
}
