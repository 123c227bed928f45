//! Injected TTL cache for finished candidate sets.
//!
//! Callers construct and own the instance and hand it to the orchestrator;
//! there is no ambient static state. Keys are request fingerprints built
//! from the quantized endpoints and the hour bucket, so two requests for the
//! same walk within the same hour share an entry.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::{DateTime, FixedOffset, Timelike};

use crate::types::{GeoPoint, RouteCandidate};

#[derive(Debug)]
struct CacheEntry {
    inserted: Instant,
    candidates: Vec<RouteCandidate>,
}

/// Bounded TTL cache keyed by request fingerprint.
///
/// Eviction: expired entries first, then the oldest entry when at capacity.
#[derive(Debug)]
pub struct RouteCache {
    ttl: Duration,
    capacity: usize,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl RouteCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity: capacity.max(1),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Fingerprint for a request: endpoints quantized to ~10 m plus the
    /// local date and hour bucket (sun position changes materially per
    /// hour, and the same clock hour on another day is a different sun).
    pub fn fingerprint(start: GeoPoint, end: GeoPoint, time: DateTime<FixedOffset>) -> String {
        format!(
            "{:.4},{:.4}:{:.4},{:.4}:{}:{}",
            start.lat,
            start.lng,
            end.lat,
            end.lng,
            time.date_naive(),
            time.hour()
        )
    }

    pub fn get(&self, key: &str) -> Option<Vec<RouteCandidate>> {
        let mut entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let expired = match entries.get(key) {
            Some(entry) => {
                if entry.inserted.elapsed() < self.ttl {
                    return Some(entry.candidates.clone());
                }
                true
            }
            None => false,
        };
        if expired {
            entries.remove(key);
        }
        None
    }

    pub fn insert(&self, key: String, candidates: Vec<RouteCandidate>) {
        let mut entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.retain(|_, entry| entry.inserted.elapsed() < self.ttl);
        if entries.len() >= self.capacity && !entries.contains_key(&key) {
            if let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, entry)| entry.inserted)
                .map(|(k, _)| k.clone())
            {
                entries.remove(&oldest);
            }
        }
        entries.insert(
            key,
            CacheEntry {
                inserted: Instant::now(),
                candidates,
            },
        );
    }

    pub fn len(&self) -> usize {
        match self.entries.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
