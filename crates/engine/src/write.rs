//! Write path: `create()`, `update()`, `delete()` and the internal flush.
//!
//! Every mutation is appended to the WAL first; only a durable append may
//! touch the cache and memtable. When an insert brings the memtable to
//! capacity it is flushed wholesale into a new Level 1 run, a fresh memtable
//! takes its place, and the WAL — now fully reflected on disk — is cleared.

use cache::CacheEntry;
use memtable::Memtable;
use record::Record;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

use crate::{Engine, EngineError};

/// Seconds since the Unix epoch, the timestamp resolution of the format.
fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

impl Engine {
    /// Inserts a key-value pair.
    pub fn create(&mut self, key: &str, value: &[u8]) -> Result<(), EngineError> {
        self.write(key, value)
    }

    /// Overwrites a key's value. Identical to [`create`](Engine::create) —
    /// the engine does not distinguish insert from update.
    pub fn update(&mut self, key: &str, value: &[u8]) -> Result<(), EngineError> {
        self.write(key, value)
    }

    fn write(&mut self, key: &str, value: &[u8]) -> Result<(), EngineError> {
        let ts = now();
        let rec = Record::new(key, value.to_vec(), ts, false);

        // Durability first; an append error means nothing was committed.
        self.wal.append(&rec)?;

        // Refresh the cache only if the key is already hot.
        if self.cache.contains(key) {
            self.cache.insert(CacheEntry {
                key: key.to_string(),
                value: value.to_vec(),
                timestamp: ts,
                tombstone: false,
            });
        }

        if self.mem.insert(key, value, ts) {
            self.flush_memtable()?;
        }
        Ok(())
    }

    /// Deletes a key by tombstoning it.
    ///
    /// The tombstone is logged and recorded in the memtable even when the
    /// key is not resident there — a placeholder slot is inserted and
    /// immediately tombstoned so the deletion survives flushes and reaches
    /// compaction. Returns `true` iff the key was live in the memtable.
    pub fn delete(&mut self, key: &str) -> Result<bool, EngineError> {
        let ts = now();
        let rec = Record::new(key, Vec::new(), ts, true);
        self.wal.append(&rec)?;

        if self.cache.contains(key) {
            self.cache.insert(CacheEntry {
                key: key.to_string(),
                value: Vec::new(),
                timestamp: ts,
                tombstone: true,
            });
        }

        let was_live = self.mem.delete(key);
        if !was_live {
            let full = self.mem.insert(key, b"", ts);
            self.mem.delete(key);
            if full {
                self.flush_memtable()?;
            }
        }
        Ok(was_live)
    }

    /// Forces the memtable to disk. A no-op when it is empty.
    pub fn flush(&mut self) -> Result<(), EngineError> {
        if self.mem.is_empty() {
            return Ok(());
        }
        self.flush_memtable()
    }

    /// Takes the full memtable, writes it as a new Level 1 run, installs a
    /// fresh memtable and clears the WAL (its contents are now durable in
    /// the run).
    pub(crate) fn flush_memtable(&mut self) -> Result<(), EngineError> {
        let full = std::mem::replace(
            &mut self.mem,
            Memtable::new(self.config.memtable_capacity, self.config.memtable_max_height),
        );
        let run_dir = sstable::flush_memtable(&self.root, &full, self.config.bloom_fp_rate)?;
        self.wal.delete_all()?;
        info!(run = %run_dir.display(), "flush complete, wal cleared");
        Ok(())
    }
}
