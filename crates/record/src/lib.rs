//! # Record — the persisted unit of SiltKV
//!
//! A `Record` is what both the WAL and an SSTable Data file store: one
//! key-value slot with its deletion marker, write timestamp and a checksum
//! over the value. Keeping the codec in one crate guarantees the two file
//! formats can never drift apart.
//!
//! ## Binary layout (little-endian)
//!
//! ```text
//! +----------+-----------------+--------------+--------------+----------------+-...-+--...--+
//! | CRC (4B) | Timestamp (16B) | Tombstone 1B | Key Size 8B  | Value Size 8B  | Key | Value |
//! +----------+-----------------+--------------+--------------+----------------+-...-+--...--+
//! ```
//!
//! The CRC is computed over the **value only**. The timestamp field is 16
//! bytes wide with the i64 seconds value stored in the low 8 bytes; the high
//! 8 bytes are zero.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};
use thiserror::Error;

/// Maximum key size accepted on decode (64 KiB). Guards against allocating
/// from a corrupt length prefix.
pub const MAX_KEY_BYTES: u64 = 64 * 1024;
/// Maximum value size accepted on decode (10 MiB).
pub const MAX_VALUE_BYTES: u64 = 10 * 1024 * 1024;

/// Fixed per-record overhead: CRC + timestamp + tombstone + both size fields.
pub const RECORD_OVERHEAD: u64 = 4 + 16 + 1 + 8 + 8;

/// Storage error taxonomy shared by every on-disk codec.
///
/// Not-found is never an error — lookups return `Ok(None)`. `Corrupt` and
/// `Truncated` both mean the bytes on disk cannot be trusted; they are kept
/// apart because a truncated tail in a WAL segment is survivable (crash
/// mid-append) while a truncated SSTable is not.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An underlying I/O failure.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// The bytes on disk are inconsistent: CRC mismatch, absurd length
    /// prefix, or a key that does not match its indexed position.
    #[error("corrupt or inconsistent storage: {0}")]
    Corrupt(String),

    /// A record ended mid-way through its fields.
    #[error("truncated record at end of file")]
    Truncated,
}

/// One persisted key-value slot.
///
/// `crc` always equals `CRC32(value)`; [`Record::new`] computes it and the
/// decoder re-verifies it on every read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub crc: u32,
    pub timestamp: i64,
    pub tombstone: bool,
    pub key: String,
    pub value: Vec<u8>,
}

impl Record {
    /// Builds a record, computing the value checksum.
    pub fn new(key: impl Into<String>, value: Vec<u8>, timestamp: i64, tombstone: bool) -> Self {
        let crc = crc32(&value);
        Self {
            crc,
            timestamp,
            tombstone,
            key: key.into(),
            value,
        }
    }

    /// Encoded size in bytes.
    #[must_use]
    pub fn encoded_len(&self) -> u64 {
        RECORD_OVERHEAD + self.key.len() as u64 + self.value.len() as u64
    }

    /// Serializes the record to `w` in the fixed layout.
    pub fn write_to<W: Write>(&self, w: &mut W) -> Result<(), StorageError> {
        w.write_u32::<LittleEndian>(self.crc)?;
        // 16-byte timestamp field, value in the low 8 bytes.
        w.write_u64::<LittleEndian>(self.timestamp as u64)?;
        w.write_u64::<LittleEndian>(0)?;
        w.write_u8(u8::from(self.tombstone))?;
        w.write_u64::<LittleEndian>(self.key.len() as u64)?;
        w.write_u64::<LittleEndian>(self.value.len() as u64)?;
        w.write_all(self.key.as_bytes())?;
        w.write_all(&self.value)?;
        Ok(())
    }

    /// Reads the next record from `r`.
    ///
    /// Returns `Ok(None)` on a clean end of stream (no bytes before the CRC
    /// field). A stream that ends anywhere *inside* a record yields
    /// [`StorageError::Truncated`]; a CRC mismatch, a non-UTF-8 key or an
    /// oversized length prefix yields [`StorageError::Corrupt`].
    pub fn read_next<R: Read>(r: &mut R) -> Result<Option<Record>, StorageError> {
        let crc = match r.read_u32::<LittleEndian>() {
            Ok(v) => v,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(StorageError::Io(e)),
        };

        let low = read_field(r, |r| r.read_u64::<LittleEndian>())?;
        let _high = read_field(r, |r| r.read_u64::<LittleEndian>())?;
        let timestamp = low as i64;

        let tombstone = match read_field(r, |r| r.read_u8())? {
            0 => false,
            1 => true,
            other => {
                return Err(StorageError::Corrupt(format!(
                    "invalid tombstone byte {other:#04x}"
                )))
            }
        };

        let key_size = read_field(r, |r| r.read_u64::<LittleEndian>())?;
        let value_size = read_field(r, |r| r.read_u64::<LittleEndian>())?;
        if key_size > MAX_KEY_BYTES {
            return Err(StorageError::Corrupt(format!(
                "key size {key_size} exceeds maximum {MAX_KEY_BYTES}"
            )));
        }
        if value_size > MAX_VALUE_BYTES {
            return Err(StorageError::Corrupt(format!(
                "value size {value_size} exceeds maximum {MAX_VALUE_BYTES}"
            )));
        }

        let mut key_buf = vec![0u8; key_size as usize];
        read_field(r, |r| r.read_exact(&mut key_buf))?;
        let mut value = vec![0u8; value_size as usize];
        read_field(r, |r| r.read_exact(&mut value))?;

        let key = String::from_utf8(key_buf)
            .map_err(|_| StorageError::Corrupt("key is not valid UTF-8".into()))?;

        if crc != crc32(&value) {
            return Err(StorageError::Corrupt(format!(
                "CRC mismatch for key {key:?}: stored {crc:#010x}, computed {:#010x}",
                crc32(&value)
            )));
        }

        Ok(Some(Record {
            crc,
            timestamp,
            tombstone,
            key,
            value,
        }))
    }
}

/// CRC32 (IEEE) of `data`.
#[must_use]
pub fn crc32(data: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

// A field read that hits EOF means the record was cut off mid-way.
fn read_field<R, T, F>(r: &mut R, f: F) -> Result<T, StorageError>
where
    R: Read,
    F: FnOnce(&mut R) -> io::Result<T>,
{
    f(r).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            StorageError::Truncated
        } else {
            StorageError::Io(e)
        }
    })
}
