//! # Engine — the SiltKV storage engine
//!
//! The central orchestrator tying the [`memtable`], [`wal`], [`cache`] and
//! [`sstable`] crates into a complete LSM key-value store.
//!
//! ## Architecture
//!
//! ```text
//! Client
//!   |
//!   v
//! ┌─────────────────────────────────────────────────┐
//! │                    ENGINE                       │
//! │                                                 │
//! │ write.rs → WAL append → cache refresh           │
//! │               → memtable insert/tombstone       │
//! │                     |                           │
//! │                     | (capacity reached?)       │
//! │                     v        yes                │
//! │               flush → Level1 run, WAL trimmed   │
//! │                                                 │
//! │ read.rs  → memtable → cache → per-run           │
//! │            Filter → Summary → Index → Data      │
//! │            (levels ascending, newest run first) │
//! │                                                 │
//! │ compaction.rs → pairwise merge L → L+1          │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! ## Module responsibilities
//!
//! | Module          | Purpose                                            |
//! |-----------------|----------------------------------------------------|
//! | `lib.rs`        | `Engine` struct, open, accessors, `Debug`, `Drop`  |
//! | [`recovery`]    | bootstrap, WAL segment replay, watermark trimming  |
//! | [`write`]       | `create()`, `update()`, `delete()`, flush          |
//! | [`read`]        | `read()` lookup cascade                            |
//! | [`compaction`]  | `compact()` per-level pairwise merges              |
//!
//! ## Crash safety
//!
//! Every mutation is appended (and fsynced) to the WAL before the memtable
//! changes. The WAL is cleared only after a successful flush. Runs are built
//! in temp directories and renamed into place; leftovers are swept on open.

mod compaction;
mod read;
mod recovery;
mod write;

use cache::LruCache;
use config::Config;
use memtable::Memtable;
use record::StorageError;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;
use wal::{Wal, WalError};

/// Name of the WAL directory under the database root.
pub const WAL_DIR: &str = "Wal";

/// Engine-level error: the typed kinds from the storage layers, plus plain
/// I/O from directory plumbing.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("wal: {0}")]
    Wal(#[from] WalError),

    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// The storage engine. One logical caller at a time; readers and writers go
/// through `&mut self`, which makes the flush-and-swap of the memtable
/// atomic as far as any observer is concerned.
pub struct Engine {
    pub(crate) root: PathBuf,
    pub(crate) config: Config,
    pub(crate) mem: Memtable,
    pub(crate) cache: LruCache,
    pub(crate) wal: Wal,
}

impl Engine {
    /// Opens (or creates) a database rooted at `root`, performing full
    /// recovery.
    ///
    /// # Steps
    ///
    /// 1. Create `Data/SSTable/Level1..N` and `Wal/` if absent.
    /// 2. Sweep temp run directories left by interrupted builds.
    /// 3. Replay WAL segments into a fresh memtable, flushing to Level 1
    ///    whenever a replayed insert reaches capacity (exactly like the live
    ///    write path), and delete the fully-flushed segment prefix.
    /// 4. Attach the WAL writer to the surviving (or a fresh) segment.
    pub fn open(root: impl Into<PathBuf>, config: Config) -> Result<Self, EngineError> {
        let root = root.into();
        recovery::bootstrap(&root, config.max_level)?;

        let mut mem = Memtable::new(config.memtable_capacity, config.memtable_max_height);
        let recovered = recovery::recover_wal(&root, &config, &mut mem)?;
        let wal = Wal::attach(
            root.join(WAL_DIR),
            config.wal_segment_size,
            recovered.active_segment,
            recovered.segment_elements,
        );
        let cache = LruCache::new(config.cache_capacity);

        info!(
            root = %root.display(),
            recovered = mem.len(),
            segment = recovered.active_segment,
            "engine opened"
        );

        Ok(Self {
            root,
            config,
            mem,
            cache,
            wal,
        })
    }

    /// Database root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The settings this engine was opened with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Key slots currently in the memtable (tombstoned ones included).
    #[must_use]
    pub fn memtable_len(&self) -> usize {
        self.mem.len()
    }

    /// Entries currently cached.
    #[must_use]
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Number of runs in one level.
    pub fn run_count(&self, level: u32) -> Result<usize, EngineError> {
        let dir = sstable::layout::level_dir(&self.root, level);
        Ok(sstable::layout::list_runs(&dir)?.len())
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("root", &self.root)
            .field("memtable_len", &self.mem.len())
            .field("memtable_capacity", &self.config.memtable_capacity)
            .field("cache_len", &self.cache.len())
            .field("wal", &self.wal)
            .finish()
    }
}

/// Best-effort flush on drop.
///
/// Data still in the memtable is flushed so a clean shutdown leaves nothing
/// behind in the log. Errors are swallowed — `Drop` cannot propagate them,
/// and the WAL still holds everything for the next recovery. The WAL is
/// trimmed only if the flush actually succeeded.
impl Drop for Engine {
    fn drop(&mut self) {
        if !self.mem.is_empty() {
            let mem = std::mem::replace(
                &mut self.mem,
                Memtable::new(self.config.memtable_capacity, self.config.memtable_max_height),
            );
            if sstable::flush_memtable(&self.root, &mem, self.config.bloom_fp_rate).is_ok() {
                let _ = self.wal.delete_all();
            }
        }
    }
}

#[cfg(test)]
mod tests;
