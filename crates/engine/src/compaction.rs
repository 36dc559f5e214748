//! Compaction: pairwise merges that push runs down the level tree.
//!
//! Each level from 1 up to (but not including) the deepest is examined in
//! turn. Runs are paired in ascending numeric order — first with second,
//! third with fourth — and each pair is merged into a single new run one
//! level deeper; an unpaired final run stays where it is until the next
//! cycle. Input runs are deleted only after their merged replacement has
//! been renamed into place.

use sstable::layout::{self, FileKind};
use std::fs;
use tracing::info;

use crate::{Engine, EngineError};

impl Engine {
    /// Runs one full compaction cycle over all levels.
    ///
    /// Levels with fewer than two runs are skipped. Merging continues with
    /// the next level even when a level had nothing to do, so a deep level
    /// can compact regardless of the state of the shallow ones.
    pub fn compact(&mut self) -> Result<(), EngineError> {
        for level in 1..self.config.max_level {
            let level_dir = layout::level_dir(&self.root, level);
            let runs = layout::list_runs(&level_dir)?;
            if runs.len() <= 1 {
                continue;
            }

            let target_dir = layout::level_dir(&self.root, level + 1);
            let mut merged = 0usize;
            for pair in runs.chunks(2) {
                let [(_, a), (_, b)] = pair else {
                    // Odd run out; it waits for the next cycle.
                    break;
                };

                let data_a = layout::run_file(a, level, FileKind::Data);
                let data_b = layout::run_file(b, level, FileKind::Data);
                sstable::merge_runs(
                    &target_dir,
                    level + 1,
                    &data_a,
                    &data_b,
                    self.config.bloom_fp_rate,
                )?;

                fs::remove_dir_all(a)?;
                fs::remove_dir_all(b)?;
                merged += 1;
            }

            info!(level, pairs = merged, "level compacted");
        }
        Ok(())
    }
}
