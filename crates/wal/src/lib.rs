//! # WAL — Write-Ahead Log
//!
//! Crash-safe durability for SiltKV. Every mutation is encoded as a
//! [`Record`] and appended to the log **before** the corresponding memtable
//! update; on restart the segments are replayed to reconstruct the memtable,
//! so no acknowledged write is lost.
//!
//! ## Segments
//!
//! The log is a directory of segment files named `wal_{n}.db` with `n`
//! increasing from 1. A segment holds at most `segment_size` records; the
//! writer rotates to `wal_{n+1}.db` before an append would exceed that.
//! Segments are retained until their contents are durably reflected in a
//! flushed SSTable — recovery (in the engine) works out which trailing
//! segments are still live and deletes only the fully-flushed prefix.
//!
//! A record that was cut off by a crash mid-append is treated as a clean end
//! of segment during replay; everything before it is still recovered.

use record::{Record, StorageError};
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during WAL operations.
#[derive(Debug, Error)]
pub enum WalError {
    /// An underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A record failed its checksum or carried invalid fields.
    #[error("corrupt wal record: {0}")]
    Corrupt(String),
}

impl From<StorageError> for WalError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::Io(io) => WalError::Io(io),
            StorageError::Corrupt(msg) => WalError::Corrupt(msg),
            StorageError::Truncated => WalError::Corrupt("truncated record".into()),
        }
    }
}

/// Builds the file name of segment `n`.
#[must_use]
pub fn segment_file_name(n: u64) -> String {
    format!("wal_{n}.db")
}

/// Parses a segment number out of a `wal_{n}.db` file name.
#[must_use]
pub fn parse_segment_number(name: &str) -> Option<u64> {
    name.strip_prefix("wal_")?.strip_suffix(".db")?.parse().ok()
}

/// Lists the segments in `dir` as `(number, path)` pairs, ascending by
/// number. Files that do not match the naming scheme are ignored.
pub fn list_segments(dir: &Path) -> std::io::Result<Vec<(u64, PathBuf)>> {
    let mut segments = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if let Some(n) = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(parse_segment_number)
        {
            segments.push((n, path));
        }
    }
    segments.sort_by_key(|(n, _)| *n);
    Ok(segments)
}

/// Counts the complete records in a segment file.
///
/// Used when recovery resumes appending into a surviving segment, to learn
/// how many appends it already holds.
pub fn count_records(path: &Path) -> Result<u64, WalError> {
    let mut reader = SegmentReader::open(path)?;
    let mut count = 0;
    reader.replay(|_| count += 1)?;
    Ok(count)
}

/// Append handle over the segment directory.
///
/// Tracks the active segment and its record count; [`append`](Wal::append)
/// rotates before the count would exceed the configured segment size. Each
/// append is flushed and fsynced before returning — the record is durable
/// once `append` succeeds.
pub struct Wal {
    dir: PathBuf,
    segment_size: u64,
    active: u64,
    /// Records already in the active segment.
    segment_elements: u64,
}

impl Wal {
    /// Attaches to `dir`, continuing in segment `active` which already holds
    /// `segment_elements` records.
    ///
    /// Recovery decides the starting point; a fresh database starts at
    /// segment 1 with zero elements.
    pub fn attach(dir: impl Into<PathBuf>, segment_size: u64, active: u64, segment_elements: u64) -> Self {
        Self {
            dir: dir.into(),
            segment_size: segment_size.max(1),
            active,
            segment_elements,
        }
    }

    /// Path of the segment currently being appended to.
    #[must_use]
    pub fn active_segment(&self) -> PathBuf {
        self.dir.join(segment_file_name(self.active))
    }

    /// Number of records in the active segment.
    #[must_use]
    pub fn segment_elements(&self) -> u64 {
        self.segment_elements
    }

    /// Appends one record, rotating to a new segment first if the active one
    /// is full. The record is durable (flushed + fsynced) on `Ok`.
    ///
    /// On error the record is **not** committed and the caller must not
    /// apply the corresponding memtable mutation.
    pub fn append(&mut self, rec: &Record) -> Result<(), WalError> {
        if self.segment_elements + 1 > self.segment_size {
            self.rotate();
        }

        let path = self.active_segment();
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        rec.write_to(&mut file)?;
        file.flush()?;
        file.sync_all()?;

        self.segment_elements += 1;
        Ok(())
    }

    /// Switches to the next segment number; the file is created lazily by
    /// the first append.
    fn rotate(&mut self) {
        self.active += 1;
        self.segment_elements = 0;
        debug!(segment = self.active, "wal segment rotated");
    }

    /// Removes every segment file and restarts numbering at 1.
    ///
    /// Called after a successful flush, when everything the log protected is
    /// durably in an SSTable.
    pub fn delete_all(&mut self) -> Result<(), WalError> {
        for (_, path) in list_segments(&self.dir)? {
            fs::remove_file(&path)?;
        }
        self.active = 1;
        self.segment_elements = 0;
        debug!("wal segments deleted after flush");
        Ok(())
    }
}

impl std::fmt::Debug for Wal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wal")
            .field("dir", &self.dir)
            .field("active", &self.active)
            .field("segment_elements", &self.segment_elements)
            .field("segment_size", &self.segment_size)
            .finish()
    }
}

/// Sequential reader over one segment file.
pub struct SegmentReader {
    rdr: BufReader<File>,
}

impl SegmentReader {
    /// Opens a segment for replay.
    pub fn open(path: &Path) -> Result<Self, WalError> {
        let file = File::open(path)?;
        Ok(Self {
            rdr: BufReader::new(file),
        })
    }

    /// Replays every complete record, calling `apply` for each.
    ///
    /// # Termination
    ///
    /// - Clean end of file → `Ok(())`.
    /// - Truncated tail record (crash mid-append) → `Ok(())` after yielding
    ///   everything before it.
    /// - CRC mismatch or invalid field → `Err(WalError::Corrupt)`.
    pub fn replay<F>(&mut self, mut apply: F) -> Result<(), WalError>
    where
        F: FnMut(Record),
    {
        loop {
            match Record::read_next(&mut self.rdr) {
                Ok(Some(rec)) => apply(rec),
                Ok(None) => return Ok(()),
                Err(StorageError::Truncated) => {
                    debug!("truncated tail record, treating as end of segment");
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests;
