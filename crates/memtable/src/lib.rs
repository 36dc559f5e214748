//! # Memtable — the in-memory write buffer
//!
//! A probabilistic skip list holding the most recent writes, sorted by key.
//! Deletions are logical: a node is tombstoned in place, never unlinked, so
//! the flag survives into flushed runs where compaction can observe it.
//!
//! Nodes live in an arena (`Vec<Node>`) and link to each other by index.
//! `nodes[0]` is the head sentinel owning the top of every forward chain.
//! Index links sidestep the ownership cycles raw forward pointers would
//! create, and the arena is dropped wholesale when the table is flushed.
//!
//! ```text
//! level 2:  HEAD ──────────────► "m" ─────────────► nil
//! level 1:  HEAD ──► "d" ──────► "m" ──► "t" ─────► nil
//! level 0:  HEAD ──► "d" ─► "g" ► "m" ──► "t" ► "z" ► nil
//! ```
//!
//! When an insert brings the table to capacity, the caller is told so it can
//! take the whole structure for flushing and install a fresh one.

use rand::Rng;

struct Node {
    key: String,
    value: Vec<u8>,
    timestamp: i64,
    tombstone: bool,
    /// Forward links per level; `forward.len()` is the node's height + 1.
    forward: Vec<Option<usize>>,
}

/// A borrowed view of one memtable slot, tombstoned or not.
#[derive(Debug, Clone, Copy)]
pub struct EntryRef<'a> {
    pub key: &'a str,
    pub value: &'a [u8],
    pub timestamp: i64,
    pub tombstone: bool,
}

/// Sorted in-memory write buffer with logical deletes.
pub struct Memtable {
    nodes: Vec<Node>,
    /// Highest level currently in use (0-based).
    height: usize,
    /// Count of key slots, tombstoned slots included.
    size: usize,
    capacity: usize,
    max_height: usize,
}

impl Memtable {
    /// Creates an empty memtable.
    ///
    /// `capacity` is the slot count that triggers a flush; `max_height` caps
    /// the level a node can roll.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize, max_height: usize) -> Self {
        assert!(capacity > 0, "memtable capacity must be > 0");
        let head = Node {
            key: String::new(),
            value: Vec::new(),
            timestamp: 0,
            tombstone: false,
            forward: vec![None; max_height + 1],
        };
        Self {
            nodes: vec![head],
            height: 0,
            size: 0,
            capacity,
            max_height,
        }
    }

    /// Inserts a key or overwrites an existing slot in place.
    ///
    /// A new key splices a node into every level up to a randomly rolled
    /// height and bumps `size`; an existing key gets its value and timestamp
    /// replaced (and its tombstone cleared) with no size change.
    ///
    /// Returns `true` iff the table has reached capacity after the call —
    /// the caller must then hand the whole table to the flush path and
    /// continue with a fresh one.
    pub fn insert(&mut self, key: &str, value: &[u8], timestamp: i64) -> bool {
        let update = self.predecessors(key);

        if let Some(idx) = self.nodes[update[0]].forward[0] {
            if self.nodes[idx].key == key {
                let node = &mut self.nodes[idx];
                node.value = value.to_vec();
                node.timestamp = timestamp;
                node.tombstone = false;
                return false;
            }
        }

        let level = self.roll();
        if level > self.height {
            self.height = level;
        }

        let idx = self.nodes.len();
        self.nodes.push(Node {
            key: key.to_string(),
            value: value.to_vec(),
            timestamp,
            tombstone: false,
            forward: vec![None; level + 1],
        });
        for lvl in 0..=level {
            let pred = update[lvl];
            let next = self.nodes[pred].forward[lvl];
            self.nodes[idx].forward[lvl] = next;
            self.nodes[pred].forward[lvl] = Some(idx);
        }

        self.size += 1;
        self.size >= self.capacity
    }

    /// Returns the value for `key` if present and not tombstoned.
    #[must_use]
    pub fn find(&self, key: &str) -> Option<&[u8]> {
        self.find_node(key)
            .filter(|e| !e.tombstone)
            .map(|e| e.value)
    }

    /// Returns the slot for `key` regardless of tombstone state.
    ///
    /// A tombstoned result means "logically absent, and definitively newer
    /// than anything on disk" — callers must check the flag themselves.
    #[must_use]
    pub fn find_node(&self, key: &str) -> Option<EntryRef<'_>> {
        let update = self.predecessors(key);
        let idx = self.nodes[update[0]].forward[0]?;
        let node = &self.nodes[idx];
        (node.key == key).then(|| EntryRef {
            key: &node.key,
            value: &node.value,
            timestamp: node.timestamp,
            tombstone: node.tombstone,
        })
    }

    /// Marks `key` as deleted.
    ///
    /// Returns `true` iff the key was present and live; an absent key is the
    /// caller's problem (synthesize an insert, then delete again).
    pub fn delete(&mut self, key: &str) -> bool {
        let update = self.predecessors(key);
        if let Some(idx) = self.nodes[update[0]].forward[0] {
            let node = &mut self.nodes[idx];
            if node.key == key && !node.tombstone {
                node.tombstone = true;
                return true;
            }
        }
        false
    }

    /// In-order walk over every slot, tombstoned ones included.
    ///
    /// This is the flush input: key order here is the key order of the run.
    pub fn iter(&self) -> Entries<'_> {
        Entries {
            mem: self,
            cur: self.nodes[0].forward[0],
        }
    }

    /// Collects the live (non-tombstoned) pairs in key order.
    #[must_use]
    pub fn extract_data(&self) -> Vec<(String, Vec<u8>)> {
        self.iter()
            .filter(|e| !e.tombstone)
            .map(|e| (e.key.to_string(), e.value.to_vec()))
            .collect()
    }

    /// Number of key slots, tombstoned slots included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.size
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// `true` once `len() >= capacity` — the table should be flushed.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.size >= self.capacity
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn max_height(&self) -> usize {
        self.max_height
    }

    // ---- Internal helpers ----

    /// Descending-level search returning, per level, the index of the last
    /// node whose key is strictly less than `key`.
    fn predecessors(&self, key: &str) -> Vec<usize> {
        let mut update = vec![0usize; self.max_height + 1];
        let mut cur = 0usize;
        for lvl in (0..=self.height).rev() {
            while let Some(next) = self.nodes[cur].forward[lvl] {
                if self.nodes[next].key.as_str() < key {
                    cur = next;
                } else {
                    break;
                }
            }
            update[lvl] = cur;
        }
        update
    }

    /// Rolls a node level: count consecutive fair-coin "continue" outcomes,
    /// capped at `max_height`.
    fn roll(&self) -> usize {
        let mut rng = rand::thread_rng();
        let mut level = 0;
        while level < self.max_height && rng.gen_bool(0.5) {
            level += 1;
        }
        level
    }
}

impl std::fmt::Debug for Memtable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memtable")
            .field("size", &self.size)
            .field("capacity", &self.capacity)
            .field("height", &self.height)
            .field("max_height", &self.max_height)
            .finish()
    }
}

/// Iterator over memtable slots in ascending key order.
pub struct Entries<'a> {
    mem: &'a Memtable,
    cur: Option<usize>,
}

impl<'a> Iterator for Entries<'a> {
    type Item = EntryRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.cur?;
        let node = &self.mem.nodes[idx];
        self.cur = node.forward[0];
        Some(EntryRef {
            key: &node.key,
            value: &node.value,
            timestamp: node.timestamp,
            tombstone: node.tombstone,
        })
    }
}
