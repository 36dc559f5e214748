//! Two-way merge of run pairs — the workhorse of compaction.
//!
//! Both inputs are already sorted, so the merge reads one record at a time
//! from each Data file:
//!
//! - differing keys: the smaller key is emitted, only that side advances;
//! - equal keys: the record with the strictly greater timestamp wins (a
//!   timestamp tie favors the second input) and both sides advance — but a
//!   tombstoned winner is dropped, not emitted;
//! - one side exhausted: the record still in hand gets the same
//!   drop-if-tombstoned check, then the rest of the surviving stream is
//!   carried over verbatim.
//!
//! Index, Summary, Filter and Merkle metadata are rebuilt through the shared
//! [`RunBuilder`], which also records the true first/last emitted key.

use record::{Record, StorageError, RECORD_OVERHEAD};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::write::RunBuilder;

/// Sequential record stream over one Data file.
struct DataStream {
    rdr: BufReader<File>,
}

impl DataStream {
    fn open(path: &Path) -> Result<Self, StorageError> {
        Ok(Self {
            rdr: BufReader::new(File::open(path)?),
        })
    }

    fn next(&mut self) -> Result<Option<Record>, StorageError> {
        match Record::read_next(&mut self.rdr) {
            // A Data file is written whole and renamed into place; a short
            // tail is corruption here, not a crash artifact.
            Err(StorageError::Truncated) => Err(StorageError::Corrupt(
                "truncated record in sstable data file".into(),
            )),
            other => other,
        }
    }
}

/// Merges the Data files of two same-level runs into a new run under
/// `target_level_dir`.
///
/// Returns the new run's directory, or `None` when every record was
/// tombstone-dropped and there was nothing to write (no run is created in
/// that case). The inputs are left untouched — the caller deletes them once
/// the merge has succeeded.
pub fn merge_runs(
    target_level_dir: &Path,
    target_level: u32,
    data_a: &Path,
    data_b: &Path,
    fp_rate: f64,
) -> Result<Option<PathBuf>, StorageError> {
    // Size the bloom filter from the input byte sizes: each record costs at
    // least the fixed overhead, so this bounds the merged record count.
    let bytes = File::open(data_a)?.metadata()?.len() + File::open(data_b)?.metadata()?.len();
    let expected = (bytes / RECORD_OVERHEAD + 1) as usize;

    let mut sa = DataStream::open(data_a)?;
    let mut sb = DataStream::open(data_b)?;
    let mut builder = RunBuilder::create(target_level_dir, target_level, expected, fp_rate)?;

    let mut a = sa.next()?;
    let mut b = sb.next()?;

    loop {
        let (ra, rb) = match (&a, &b) {
            (Some(ra), Some(rb)) => (ra, rb),
            _ => break,
        };
        match ra.key.cmp(&rb.key) {
            std::cmp::Ordering::Less => {
                builder.push(ra)?;
                a = sa.next()?;
            }
            std::cmp::Ordering::Greater => {
                builder.push(rb)?;
                b = sb.next()?;
            }
            std::cmp::Ordering::Equal => {
                let winner = if ra.timestamp > rb.timestamp { ra } else { rb };
                if !winner.tombstone {
                    builder.push(winner)?;
                }
                a = sa.next()?;
                b = sb.next()?;
            }
        }
    }

    // Boundary handoff: the in-hand record of the surviving side gets the
    // tombstone check; everything after it drains verbatim.
    if let Some(rec) = a.take() {
        if !rec.tombstone {
            builder.push(&rec)?;
        }
        drain_into(&mut sa, &mut builder)?;
    }
    if let Some(rec) = b.take() {
        if !rec.tombstone {
            builder.push(&rec)?;
        }
        drain_into(&mut sb, &mut builder)?;
    }

    if builder.count() == 0 {
        builder.abort();
        return Ok(None);
    }

    let count = builder.count();
    let run_dir = builder.finish()?;
    info!(
        run = %run_dir.display(),
        records = count,
        "merged run pair into level {target_level}"
    );
    Ok(Some(run_dir))
}

fn drain_into(stream: &mut DataStream, builder: &mut RunBuilder) -> Result<(), StorageError> {
    while let Some(rec) = stream.next()? {
        builder.push(&rec)?;
    }
    Ok(())
}
