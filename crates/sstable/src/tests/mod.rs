
use memtable::Memtable;
use record::Record;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::layout::{self, FileKind};
use crate::write::RunBuilder;

pub const FP_RATE: f64 = 0.05;

/// A memtable preloaded with `(key, value, timestamp)` triples.
pub fn memtable_with(entries: &[(&str, &[u8], i64)]) -> Memtable {
    let mut mem = Memtable::new(1000, 10);
    for (key, value, ts) in entries {
        mem.insert(key, value, *ts);
    }
    mem
}

/// Builds a run at `level` directly from presorted records.
pub fn build_run(root: &Path, level: u32, records: &[Record]) -> PathBuf {
    let level_dir = layout::level_dir(root, level);
    let mut builder = RunBuilder::create(&level_dir, level, records.len(), FP_RATE).unwrap();
    for rec in records {
        builder.push(rec).unwrap();
    }
    builder.finish().unwrap()
}

pub fn put(key: &str, value: &[u8], ts: i64) -> Record {
    Record::new(key, value.to_vec(), ts, false)
}

pub fn tomb(key: &str, ts: i64) -> Record {
    Record::new(key, Vec::new(), ts, true)
}

/// Full Filter → Summary → Index → Data lookup against one run.
pub fn chain_lookup(run_dir: &Path, level: u32, key: &str) -> Option<Record> {
    let filter = crate::read_filter(run_dir, level).unwrap();
    if !filter.contains(key) {
        return None;
    }
    let summary = layout::run_file(run_dir, level, FileKind::Summary);
    let index_off = crate::read_summary(&summary, key).unwrap()?;
    let index = layout::run_file(run_dir, level, FileKind::Index);
    let data_off = crate::read_index(&index, key, index_off).unwrap();
    let data = layout::run_file(run_dir, level, FileKind::Data);
    Some(crate::read_data(&data, key, data_off).unwrap())
}

pub fn tempdir() -> TempDir {
    TempDir::new().unwrap()
}
