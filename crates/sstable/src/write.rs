//! Run construction: the streaming [`RunBuilder`] and the memtable flush.

use bloom::BloomFilter;
use byteorder::{LittleEndian, WriteBytesExt};
use memtable::Memtable;
use merkle::{MerkleTree, HASH_SIZE};
use record::{Record, StorageError};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::layout::{self, FileKind, RUN_PREFIX, TMP_RUN_PREFIX};

/// Streaming writer for one SSTable run.
///
/// Records are pushed in ascending key order. Data and Index bytes stream to
/// disk as they arrive; the Summary map, bloom filter and Merkle leaves
/// accumulate in memory and are written by [`finish`](RunBuilder::finish).
///
/// # Crash safety
///
/// The run is built inside a `.tmp-SSTable{n}` directory and renamed to
/// `SSTable{n}` only after every file is written and fsynced. A crash
/// mid-build leaves a temp directory that startup sweeps away; readers never
/// observe a partial run.
pub struct RunBuilder {
    level: u32,
    tmp_dir: PathBuf,
    final_dir: PathBuf,
    data: BufWriter<File>,
    index: BufWriter<File>,
    bloom: BloomFilter,
    leaves: Vec<[u8; HASH_SIZE]>,
    /// `key -> index offset`, in emission (= key) order.
    summary: Vec<(String, u64)>,
    first_key: Option<String>,
    last_key: Option<String>,
    data_offset: u64,
    index_offset: u64,
    count: u64,
}

impl RunBuilder {
    /// Allocates the next run number in `level_dir` and opens the Data and
    /// Index files inside the temp directory.
    ///
    /// `expected_items` sizes the bloom filter; over-estimating is safe,
    /// under-estimating raises the realized false-positive rate.
    pub fn create(
        level_dir: &Path,
        level: u32,
        expected_items: usize,
        fp_rate: f64,
    ) -> Result<Self, StorageError> {
        fs::create_dir_all(level_dir)?;
        let number = layout::next_run_number(level_dir)?;
        let final_dir = level_dir.join(format!("{RUN_PREFIX}{number}"));
        let tmp_dir = level_dir.join(format!("{TMP_RUN_PREFIX}{number}"));
        fs::create_dir_all(&tmp_dir)?;

        let data = BufWriter::new(File::create(layout::run_file(&tmp_dir, level, FileKind::Data))?);
        let index =
            BufWriter::new(File::create(layout::run_file(&tmp_dir, level, FileKind::Index))?);

        Ok(Self {
            level,
            tmp_dir,
            final_dir,
            data,
            index,
            bloom: BloomFilter::new(expected_items.max(1), fp_rate),
            leaves: Vec::new(),
            summary: Vec::new(),
            first_key: None,
            last_key: None,
            data_offset: 0,
            index_offset: 0,
            count: 0,
        })
    }

    /// Appends one record. Records must arrive in ascending key order.
    pub fn push(&mut self, rec: &Record) -> Result<(), StorageError> {
        // Data file: the record itself.
        let mut buf = Vec::with_capacity(rec.encoded_len() as usize);
        rec.write_to(&mut buf)?;
        self.data.write_all(&buf)?;

        // Index file: key_size | key | data_offset.
        self.index.write_u64::<LittleEndian>(rec.key.len() as u64)?;
        self.index.write_all(rec.key.as_bytes())?;
        self.index.write_u64::<LittleEndian>(self.data_offset)?;

        // Summary map points at the Index entry just written.
        self.summary.push((rec.key.clone(), self.index_offset));

        self.bloom.add(&rec.key);
        self.leaves.push(merkle::leaf_hash(&rec.value));

        if self.first_key.is_none() {
            self.first_key = Some(rec.key.clone());
        }
        self.last_key = Some(rec.key.clone());

        self.data_offset += buf.len() as u64;
        self.index_offset += 8 + rec.key.len() as u64 + 8;
        self.count += 1;
        Ok(())
    }

    /// Number of records pushed so far.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Writes the derived files, fsyncs everything and renames the run into
    /// place. Returns the final run directory.
    pub fn finish(mut self) -> Result<PathBuf, StorageError> {
        if self.count == 0 {
            self.discard();
            return Err(StorageError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                "refusing to write an empty run",
            )));
        }

        self.data.flush()?;
        self.data.get_ref().sync_all()?;
        self.index.flush()?;
        self.index.get_ref().sync_all()?;

        // Metadata: preorder Merkle dump over the values.
        let tree = MerkleTree::from_leaves(std::mem::take(&mut self.leaves));
        let mut metadata = BufWriter::new(File::create(layout::run_file(
            &self.tmp_dir,
            self.level,
            FileKind::Metadata,
        ))?);
        tree.write_preorder(&mut metadata)?;
        metadata.flush()?;
        metadata.get_ref().sync_all()?;

        // Filter: the serialized bloom filter.
        let mut filter = BufWriter::new(File::create(layout::run_file(
            &self.tmp_dir,
            self.level,
            FileKind::Filter,
        ))?);
        self.bloom.write_to(&mut filter)?;
        filter.flush()?;
        filter.get_ref().sync_all()?;

        // Summary: first/last key, then the ordered key -> index-offset map.
        let mut summary = BufWriter::new(File::create(layout::run_file(
            &self.tmp_dir,
            self.level,
            FileKind::Summary,
        ))?);
        let first = self.first_key.as_deref().unwrap_or("");
        let last = self.last_key.as_deref().unwrap_or("");
        write_key(&mut summary, first)?;
        write_key(&mut summary, last)?;
        for (key, offset) in &self.summary {
            write_key(&mut summary, key)?;
            summary.write_u64::<LittleEndian>(*offset)?;
        }
        summary.flush()?;
        summary.get_ref().sync_all()?;

        layout::write_toc(&self.tmp_dir, self.level)?;

        fs::rename(&self.tmp_dir, &self.final_dir)?;

        // Make the rename durable; best-effort where directories cannot be
        // opened for sync.
        if let Some(parent) = self.final_dir.parent() {
            if let Ok(dir) = File::open(parent) {
                let _ = dir.sync_all();
            }
        }

        Ok(self.final_dir)
    }

    /// Abandons the run, removing the temp directory.
    pub fn abort(mut self) {
        self.discard();
    }

    fn discard(&mut self) {
        let _ = fs::remove_dir_all(&self.tmp_dir);
    }
}

fn write_key<W: Write>(w: &mut W, key: &str) -> io::Result<()> {
    w.write_u64::<LittleEndian>(key.len() as u64)?;
    w.write_all(key.as_bytes())
}

/// Flushes a full memtable into a brand-new Level 1 run.
///
/// Every slot is written in key order, tombstoned slots included — a flushed
/// tombstone is what lets compaction drop the deletion later. The caller is
/// expected to replace the memtable with a fresh one afterwards.
pub fn flush_memtable(
    root: &Path,
    mem: &Memtable,
    fp_rate: f64,
) -> Result<PathBuf, StorageError> {
    if mem.is_empty() {
        return Err(StorageError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            "refusing to flush an empty memtable",
        )));
    }

    let level_dir = layout::level_dir(root, 1);
    let mut builder = RunBuilder::create(&level_dir, 1, mem.len(), fp_rate)?;
    for entry in mem.iter() {
        let rec = Record::new(entry.key, entry.value.to_vec(), entry.timestamp, entry.tombstone);
        builder.push(&rec)?;
    }
    let run_dir = builder.finish()?;
    info!(run = %run_dir.display(), records = mem.len(), "memtable flushed to level 1");
    Ok(run_dir)
}
