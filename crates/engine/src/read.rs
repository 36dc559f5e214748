//! Read path: the `read()` lookup cascade.
//!
//! Memory first, disk last:
//!
//! 1. **Memtable** — the freshest state. A hit (tombstoned or not) is
//!    authoritative and is copied into the cache.
//! 2. **Cache** — recently read or written entries, promoted to
//!    most-recently-used on a hit.
//! 3. **Runs** — levels ascending (Level 1 holds the freshest flushes),
//!    runs within a level newest-first by their numeric suffix, so of two
//!    runs that both know a key the newer one answers. Per run the chain is
//!    Filter → Summary → Index → Data; a bloom false positive falls through
//!    at the Summary and the scan moves on.
//!
//! A tombstone found at any tier means the key is deleted: the cascade stops
//! and the lookup reports absent.

use cache::CacheEntry;
use record::Record;
use sstable::layout::{self, FileKind};
use std::path::Path;

use crate::{Engine, EngineError};

impl Engine {
    /// Looks up a key, returning the full record if it is live.
    ///
    /// `Ok(None)` means absent (never seen, or deleted); corruption and I/O
    /// problems surface as errors.
    pub fn read(&mut self, key: &str) -> Result<Option<Record>, EngineError> {
        // 1. Memtable.
        if let Some(entry) = self.mem.find_node(key) {
            let rec = Record::new(entry.key, entry.value.to_vec(), entry.timestamp, entry.tombstone);
            self.cache.insert(CacheEntry {
                key: rec.key.clone(),
                value: rec.value.clone(),
                timestamp: rec.timestamp,
                tombstone: rec.tombstone,
            });
            return Ok(if rec.tombstone { None } else { Some(rec) });
        }

        // 2. Cache.
        if let Some(entry) = self.cache.get(key) {
            if entry.tombstone {
                return Ok(None);
            }
            return Ok(Some(Record::new(
                entry.key.clone(),
                entry.value.clone(),
                entry.timestamp,
                false,
            )));
        }

        // 3. Runs, newest data first.
        for level in 1..=self.config.max_level {
            let dir = layout::level_dir(&self.root, level);
            let mut runs = layout::list_runs(&dir)?;
            runs.reverse();
            for (_, run_dir) in runs {
                if let Some(rec) = self.probe_run(&run_dir, level, key)? {
                    self.cache.insert(CacheEntry {
                        key: rec.key.clone(),
                        value: rec.value.clone(),
                        timestamp: rec.timestamp,
                        tombstone: rec.tombstone,
                    });
                    return Ok(if rec.tombstone { None } else { Some(rec) });
                }
            }
        }

        // 4. Nowhere.
        Ok(None)
    }

    /// Runs one run's Filter → Summary → Index → Data chain.
    ///
    /// `Ok(None)` means this run does not hold the key (filter negative or
    /// summary miss). Offset mismatches below the summary are corruption and
    /// propagate as errors.
    fn probe_run(
        &self,
        run_dir: &Path,
        level: u32,
        key: &str,
    ) -> Result<Option<Record>, EngineError> {
        let filter = sstable::read_filter(run_dir, level)?;
        if !filter.contains(key) {
            return Ok(None);
        }

        let summary_path = layout::run_file(run_dir, level, FileKind::Summary);
        let Some(index_offset) = sstable::read_summary(&summary_path, key)? else {
            return Ok(None);
        };

        let index_path = layout::run_file(run_dir, level, FileKind::Index);
        let data_offset = sstable::read_index(&index_path, key, index_offset)?;

        let data_path = layout::run_file(run_dir, level, FileKind::Data);
        let rec = sstable::read_data(&data_path, key, data_offset)?;
        Ok(Some(rec))
    }
}
