//! Bounded LRU cache of completed paths.
//!
//! Entries are keyed by the `(start, goal)` pair itself, so any node type
//! and any coordinate range works. There is no partial invalidation: after
//! a terrain change the owner calls [`PathCache::invalidate`], which drops
//! everything and bumps [`PathCache::version`].

use std::collections::BTreeMap;

use log::debug;
use rustc_hash::FxHashMap;

use crate::error::{PathError, Result};
use crate::traits::Node;

#[derive(Debug, Clone)]
struct CacheEntry<N> {
    path: Vec<N>,
    stamp: u64,
}

/// Least-recently-used path cache.
#[derive(Debug, Clone)]
pub struct PathCache<N: Node> {
    capacity: usize,
    entries: FxHashMap<(N, N), CacheEntry<N>>,
    // stamp -> key; the smallest stamp is the least recently used entry.
    recency: BTreeMap<u64, (N, N)>,
    clock: u64,
    version: u64,
    hits: u64,
    misses: u64,
}

impl<N: Node> PathCache<N> {
    /// Create a cache holding at most `capacity` paths.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(PathError::InvalidConfig("path cache capacity must be at least 1"));
        }
        Ok(Self {
            capacity,
            entries: FxHashMap::default(),
            recency: BTreeMap::new(),
            clock: 0,
            version: 0,
            hits: 0,
            misses: 0,
        })
    }

    /// Store a copy of `path` for `(start, goal)`, evicting the least
    /// recently used entry if the cache is full.
    pub fn store(&mut self, start: N, goal: N, path: &[N]) {
        let stamp = self.tick();
        let key = (start, goal);
        if let Some(entry) = self.entries.get_mut(&key) {
            self.recency.remove(&entry.stamp);
            entry.path.clear();
            entry.path.extend_from_slice(path);
            entry.stamp = stamp;
            self.recency.insert(stamp, key);
            return;
        }

        if self.entries.len() >= self.capacity {
            if let Some((_, oldest)) = self.recency.pop_first() {
                self.entries.remove(&oldest);
            }
        }
        self.entries.insert(
            key.clone(),
            CacheEntry {
                path: path.to_vec(),
                stamp,
            },
        );
        self.recency.insert(stamp, key);
    }

    /// A copy of the cached path for `(start, goal)`, marking it as
    /// recently used. The cache keeps its own copy untouched.
    pub fn try_get(&mut self, start: &N, goal: &N) -> Option<Vec<N>> {
        let key = (start.clone(), goal.clone());
        let stamp = self.clock + 1;
        let Some(entry) = self.entries.get_mut(&key) else {
            self.misses += 1;
            return None;
        };
        self.clock = stamp;
        self.hits += 1;
        self.recency.remove(&entry.stamp);
        entry.stamp = stamp;
        let path = entry.path.clone();
        self.recency.insert(stamp, key);
        Some(path)
    }

    /// Whether `(start, goal)` is cached, without touching recency.
    pub fn contains(&self, start: &N, goal: &N) -> bool {
        self.entries.contains_key(&(start.clone(), goal.clone()))
    }

    /// Drop one entry.
    pub fn remove(&mut self, start: &N, goal: &N) -> bool {
        match self.entries.remove(&(start.clone(), goal.clone())) {
            Some(entry) => {
                self.recency.remove(&entry.stamp);
                true
            }
            None => false,
        }
    }

    /// Drop every entry and bump the version. Call whenever the graph's
    /// walkability or costs change.
    pub fn invalidate(&mut self) {
        let dropped = self.entries.len();
        self.entries.clear();
        self.recency.clear();
        self.version += 1;
        debug!(
            "path cache invalidated: version {}, {} entries dropped",
            self.version, dropped
        );
    }

    /// Number of invalidations so far.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }
}
