//! # LRU Cache
//!
//! A fixed-capacity recency cache sitting between the memtable and the
//! on-disk runs. Entries carry the tombstone flag so a cached deletion can
//! answer a lookup without touching disk.
//!
//! Eviction is strict least-recently-used. The recency list is an
//! arena-backed doubly linked list: slots live in a `Vec`, links are indices,
//! and a free list recycles evicted slots — no unsafe, no pointer cycles.

use std::collections::HashMap;

/// One cached lookup result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub key: String,
    pub value: Vec<u8>,
    pub timestamp: i64,
    pub tombstone: bool,
}

struct Slot {
    entry: CacheEntry,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Bounded strict-LRU cache keyed by string.
pub struct LruCache {
    capacity: usize,
    slots: Vec<Slot>,
    free: Vec<usize>,
    map: HashMap<String, usize>,
    /// Least recently used end.
    head: Option<usize>,
    /// Most recently used end.
    tail: Option<usize>,
}

impl LruCache {
    /// Creates an empty cache holding at most `capacity` entries.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "cache capacity must be > 0");
        Self {
            capacity,
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            map: HashMap::with_capacity(capacity),
            head: None,
            tail: None,
        }
    }

    /// Looks up a key. A hit moves the entry to the most-recently-used end.
    ///
    /// The returned entry may be a tombstone — callers decide what a cached
    /// deletion means for them.
    pub fn get(&mut self, key: &str) -> Option<&CacheEntry> {
        let idx = *self.map.get(key)?;
        self.touch(idx);
        Some(&self.slots[idx].entry)
    }

    /// Returns `true` if the key is cached, without touching recency.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    /// Inserts or refreshes an entry at the most-recently-used end,
    /// evicting the least recently used entry if the cache is full.
    pub fn insert(&mut self, entry: CacheEntry) {
        if let Some(&idx) = self.map.get(&entry.key) {
            self.slots[idx].entry = entry;
            self.touch(idx);
            return;
        }

        if self.map.len() >= self.capacity {
            self.evict_lru();
        }

        let slot = Slot {
            entry,
            prev: self.tail,
            next: None,
        };
        let idx = match self.free.pop() {
            Some(i) => {
                self.slots[i] = slot;
                i
            }
            None => {
                self.slots.push(slot);
                self.slots.len() - 1
            }
        };

        if let Some(t) = self.tail {
            self.slots[t].next = Some(idx);
        } else {
            self.head = Some(idx);
        }
        self.tail = Some(idx);
        self.map.insert(self.slots[idx].entry.key.clone(), idx);
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Configured maximum entry count.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // ---- Internal list surgery ----

    /// Moves slot `idx` to the most-recently-used end.
    fn touch(&mut self, idx: usize) {
        if self.tail == Some(idx) {
            return;
        }
        self.unlink(idx);
        self.slots[idx].prev = self.tail;
        self.slots[idx].next = None;
        if let Some(t) = self.tail {
            self.slots[t].next = Some(idx);
        } else {
            self.head = Some(idx);
        }
        self.tail = Some(idx);
    }

    /// Detaches slot `idx` from the list without freeing it.
    fn unlink(&mut self, idx: usize) {
        let (prev, next) = (self.slots[idx].prev, self.slots[idx].next);
        match prev {
            Some(p) => self.slots[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.slots[n].prev = prev,
            None => self.tail = prev,
        }
        self.slots[idx].prev = None;
        self.slots[idx].next = None;
    }

    /// Removes the entry at the least-recently-used end.
    fn evict_lru(&mut self) {
        let Some(idx) = self.head else { return };
        self.unlink(idx);
        self.map.remove(&self.slots[idx].entry.key);
        // Leave the slot's payload in place; the free list will overwrite it.
        self.free.push(idx);
    }
}

impl std::fmt::Debug for LruCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LruCache")
            .field("capacity", &self.capacity)
            .field("len", &self.map.len())
            .finish()
    }
}
