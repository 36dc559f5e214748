//! Cold-start path: directory bootstrap and WAL replay.
//!
//! Replay mirrors the live write path exactly: records are inserted (and
//! tombstoned, for deletes) in segment order, and a replayed insert that
//! brings the memtable to capacity flushes it to Level 1 on the spot before
//! replay continues into a fresh table.
//!
//! Segment retention works backwards from the tail: after each segment
//! finishes, a non-empty memtable means that segment still backs unflushed
//! data, extending the trailing run of live segments; an empty memtable
//! (everything flushed) resets it. Segments before the live tail hold only
//! flushed data — the low watermark — and are deleted.

use config::Config;
use memtable::Memtable;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::{EngineError, WAL_DIR};

/// Where appends continue after recovery.
pub(crate) struct RecoveredWal {
    pub active_segment: u64,
    pub segment_elements: u64,
}

/// Creates the level directories and the WAL directory, and sweeps temp run
/// directories left behind by interrupted builds.
pub(crate) fn bootstrap(root: &Path, max_level: u32) -> Result<(), EngineError> {
    sstable::layout::ensure_levels(root, max_level)?;
    fs::create_dir_all(root.join(WAL_DIR))?;
    sstable::layout::sweep_temp_runs(root, max_level)?;
    Ok(())
}

/// Replays every WAL segment into `mem`, trims the flushed prefix, and
/// reports which segment to keep appending to.
pub(crate) fn recover_wal(
    root: &Path,
    config: &Config,
    mem: &mut Memtable,
) -> Result<RecoveredWal, EngineError> {
    let wal_dir = root.join(WAL_DIR);
    let segments = wal::list_segments(&wal_dir)?;
    if segments.is_empty() {
        return Ok(RecoveredWal {
            active_segment: 1,
            segment_elements: 0,
        });
    }

    let mut live_tail = 0usize;
    for (number, path) in &segments {
        let mut reader = wal::SegmentReader::open(path)?;
        let mut records = Vec::new();
        reader.replay(|rec| records.push(rec))?;

        for rec in records {
            let full = mem.insert(&rec.key, &rec.value, rec.timestamp);
            if rec.tombstone {
                mem.delete(&rec.key);
            }
            if full {
                // Capacity mid-replay: flush exactly as the live path would.
                let table = std::mem::replace(
                    mem,
                    Memtable::new(config.memtable_capacity, config.memtable_max_height),
                );
                sstable::flush_memtable(root, &table, config.bloom_fp_rate)?;
            }
        }

        if mem.is_empty() {
            live_tail = 0;
        } else {
            live_tail += 1;
        }
        debug!(segment = number, live_tail, "wal segment replayed");
    }

    // Everything before the trailing live segments is durably flushed.
    let watermark = segments.len() - live_tail;
    for (_, path) in &segments[..watermark] {
        fs::remove_file(path)?;
    }

    let highest = segments.last().map(|(n, _)| *n).unwrap_or(0);
    let recovered = if mem.is_empty() {
        // All replayed data reached disk; start a fresh segment.
        RecoveredWal {
            active_segment: highest + 1,
            segment_elements: 0,
        }
    } else {
        // Keep appending to the newest surviving segment.
        let (_, last_path) = segments.last().expect("segments is non-empty");
        RecoveredWal {
            active_segment: highest,
            segment_elements: wal::count_records(last_path)?,
        }
    };

    info!(
        segments = segments.len(),
        trimmed = watermark,
        recovered = mem.len(),
        "wal recovery complete"
    );
    Ok(recovered)
}
