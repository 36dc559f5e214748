//! Point-lookup chain over one run: Filter → Summary → Index → Data.
//!
//! The Summary narrows a key to an offset in the Index; the Index entry at
//! that offset must match the key exactly and names the record's offset in
//! the Data file; the record there must match the key exactly and pass its
//! CRC. Offsets are exact, never approximate — a mismatch at a computed
//! position means the run is inconsistent and surfaces as
//! [`StorageError::Corrupt`].

use bloom::BloomFilter;
use byteorder::{LittleEndian, ReadBytesExt};
use record::{Record, StorageError, MAX_KEY_BYTES};
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use crate::layout::{self, FileKind};

/// Loads and deserializes a run's bloom filter.
pub fn read_filter(run_dir: &Path, level: u32) -> Result<BloomFilter, StorageError> {
    let path = layout::run_file(run_dir, level, FileKind::Filter);
    let mut rdr = BufReader::new(File::open(path)?);
    Ok(BloomFilter::read_from(&mut rdr)?)
}

/// Looks a key up in a Summary file, returning its offset into the Index.
///
/// The first/last key header prunes keys outside the run's range without
/// scanning further; otherwise the entry list is scanned for an exact match.
/// `Ok(None)` means the run does not contain the key.
pub fn read_summary(path: &Path, key: &str) -> Result<Option<u64>, StorageError> {
    let mut rdr = BufReader::new(File::open(path)?);

    let first = read_key(&mut rdr)?;
    if key < first.as_str() {
        return Ok(None);
    }
    let last = read_key(&mut rdr)?;
    if key > last.as_str() {
        return Ok(None);
    }

    loop {
        // A clean end of the entry list means the key fell in range but is
        // not present (it lives in some other run).
        let key_size = match rdr.read_u64::<LittleEndian>() {
            Ok(v) => v,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(StorageError::Io(e)),
        };
        let current = read_key_of(&mut rdr, key_size)?;
        let offset = rdr.read_u64::<LittleEndian>()?;
        if current == key {
            return Ok(Some(offset));
        }
    }
}

/// Reads the Index entry at `offset`, returning the record's Data offset.
///
/// The entry's key must equal `key`: the offset came from the Summary and is
/// exact by construction, so a mismatch is storage inconsistency.
pub fn read_index(path: &Path, key: &str, offset: u64) -> Result<u64, StorageError> {
    let mut rdr = BufReader::new(File::open(path)?);
    rdr.seek(SeekFrom::Start(offset))?;

    let current = read_key(&mut rdr)?;
    if current != key {
        return Err(StorageError::Corrupt(format!(
            "key not found at estimated position: index offset {offset} holds {current:?}, wanted {key:?}"
        )));
    }
    Ok(rdr.read_u64::<LittleEndian>()?)
}

/// Reads the record at `offset` in a Data file.
///
/// The stored key must equal `key` (same exact-offset contract as
/// [`read_index`]); the record decoder verifies `crc32(value)` and reports a
/// mismatch as corruption.
pub fn read_data(path: &Path, key: &str, offset: u64) -> Result<Record, StorageError> {
    let mut rdr = BufReader::new(File::open(path)?);
    rdr.seek(SeekFrom::Start(offset))?;

    let rec = match Record::read_next(&mut rdr)? {
        Some(rec) => rec,
        None => {
            return Err(StorageError::Corrupt(format!(
                "data offset {offset} points past the end of {}",
                path.display()
            )))
        }
    };
    if rec.key != key {
        return Err(StorageError::Corrupt(format!(
            "key not found at estimated position: data offset {offset} holds {:?}, wanted {key:?}",
            rec.key
        )));
    }
    Ok(rec)
}

// ---- Key field helpers ----

fn read_key<R: Read>(r: &mut R) -> Result<String, StorageError> {
    let size = r.read_u64::<LittleEndian>()?;
    read_key_of(r, size)
}

fn read_key_of<R: Read>(r: &mut R, size: u64) -> Result<String, StorageError> {
    if size > MAX_KEY_BYTES {
        return Err(StorageError::Corrupt(format!(
            "key size {size} exceeds maximum {MAX_KEY_BYTES}"
        )));
    }
    let mut buf = vec![0u8; size as usize];
    r.read_exact(&mut buf)?;
    String::from_utf8(buf).map_err(|_| StorageError::Corrupt("key is not valid UTF-8".into()))
}
