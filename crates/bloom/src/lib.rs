//! # Bloom Filter
//!
//! A space-efficient probabilistic set-membership structure. It can say with
//! certainty that a key is **not** present (no false negatives) but may
//! occasionally claim presence for a key that was never added (false
//! positives, bounded by the configured rate at the designed element count).
//!
//! ## Usage in SiltKV
//!
//! Every SSTable run carries a filter built from its keys, persisted in the
//! run's Filter file. Point lookups consult the filter before touching the
//! Summary/Index/Data chain — a negative answer skips the run entirely.
//!
//! ## Probing scheme
//!
//! The filter holds `k` seed values, each derived by FNV-hashing the filter's
//! creation time plus the seed index. A key probes bit
//! `|seed_i − fnv1a(key)| mod m` for each seed.

use std::io::{self, Read, Write};
use std::time::{SystemTime, UNIX_EPOCH};

/// A bloom filter backed by a packed bit vector and `k` probe seeds.
pub struct BloomFilter {
    /// Packed bit vector, `num_bits` bits rounded up to whole bytes.
    bits: Vec<u8>,
    /// Number of usable bits (`m`).
    num_bits: u64,
    /// One seed per hash function (`k` of them).
    seeds: Vec<u32>,
}

impl BloomFilter {
    /// Creates a filter sized for `expected_items` at the given target
    /// `false_positive_rate`.
    ///
    /// `m = ceil(n * |ln p| / ln(2)^2)`, `k = ceil((m/n) * ln 2)`.
    ///
    /// # Panics
    ///
    /// Panics if `expected_items` is 0 or `false_positive_rate` is not in `(0, 1)`.
    pub fn new(expected_items: usize, false_positive_rate: f64) -> Self {
        assert!(expected_items > 0, "expected_items must be > 0");
        assert!(
            false_positive_rate > 0.0 && false_positive_rate < 1.0,
            "false_positive_rate must be in (0, 1)"
        );

        let n = expected_items as f64;
        let m = (n * false_positive_rate.ln().abs() / std::f64::consts::LN_2.powi(2)).ceil() as u64;
        let m = m.max(8);

        let k = ((m as f64 / n) * std::f64::consts::LN_2).ceil() as u32;
        let k = k.max(1);

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0) as u32;
        let seeds = (0..k)
            .map(|i| fnv1a_32(&(now.wrapping_add(i)).to_le_bytes()))
            .collect();

        let byte_len = ((m + 7) / 8) as usize;

        Self {
            bits: vec![0u8; byte_len],
            num_bits: m,
            seeds,
        }
    }

    fn from_raw(bits: Vec<u8>, num_bits: u64, seeds: Vec<u32>) -> Self {
        Self {
            bits,
            num_bits,
            seeds,
        }
    }

    /// Adds a key to the filter. Bits only ever go from 0 to 1.
    pub fn add(&mut self, key: &str) {
        let h = fnv1a_32(key.as_bytes());
        for i in 0..self.seeds.len() {
            let idx = self.probe_index(i, h);
            self.set_bit(idx);
        }
    }

    /// Returns `true` if the key **might** have been added, `false` if it
    /// definitely was not.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        let h = fnv1a_32(key.as_bytes());
        for i in 0..self.seeds.len() {
            if !self.get_bit(self.probe_index(i, h)) {
                return false;
            }
        }
        true
    }

    /// Returns the number of bits in the filter (`m`).
    #[must_use]
    pub fn num_bits(&self) -> u64 {
        self.num_bits
    }

    /// Returns the number of hash functions (`k`).
    #[must_use]
    pub fn num_hashes(&self) -> u32 {
        self.seeds.len() as u32
    }

    /// Serializes the filter.
    ///
    /// Wire format (all little-endian):
    /// ```text
    /// [num_bits: u64][k: u32][seeds: k x u32][bits_len: u32][bits: bytes]
    /// ```
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.num_bits.to_le_bytes())?;
        w.write_all(&(self.seeds.len() as u32).to_le_bytes())?;
        for seed in &self.seeds {
            w.write_all(&seed.to_le_bytes())?;
        }
        w.write_all(&(self.bits.len() as u32).to_le_bytes())?;
        w.write_all(&self.bits)?;
        Ok(())
    }

    /// Deserializes a filter written by [`write_to`](BloomFilter::write_to).
    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let mut buf8 = [0u8; 8];
        let mut buf4 = [0u8; 4];

        r.read_exact(&mut buf8)?;
        let num_bits = u64::from_le_bytes(buf8);

        r.read_exact(&mut buf4)?;
        let k = u32::from_le_bytes(buf4) as usize;

        // Safety caps: reject absurd headers before allocating.
        const MAX_HASHES: usize = 64;
        const MAX_BLOOM_BYTES: usize = 128 * 1024 * 1024;
        if k == 0 || k > MAX_HASHES {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("bloom filter hash count out of range: {k}"),
            ));
        }
        if num_bits == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "bloom filter with zero bits",
            ));
        }

        let mut seeds = Vec::with_capacity(k);
        for _ in 0..k {
            r.read_exact(&mut buf4)?;
            seeds.push(u32::from_le_bytes(buf4));
        }

        r.read_exact(&mut buf4)?;
        let bits_len = u32::from_le_bytes(buf4) as usize;
        if bits_len > MAX_BLOOM_BYTES {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("bloom filter too large: {bits_len} bytes"),
            ));
        }

        let mut bits = vec![0u8; bits_len];
        r.read_exact(&mut bits)?;

        Ok(Self::from_raw(bits, num_bits, seeds))
    }

    // ---- Internal helpers ----

    /// Probe position for seed `i` and key hash `h`: `|seed - h| mod m`.
    fn probe_index(&self, i: usize, h: u32) -> u64 {
        let diff = (i64::from(self.seeds[i]) - i64::from(h)).unsigned_abs();
        diff % self.num_bits
    }

    fn set_bit(&mut self, idx: u64) {
        let byte_idx = (idx / 8) as usize;
        let bit_offset = (idx % 8) as u8;
        self.bits[byte_idx] |= 1 << bit_offset;
    }

    fn get_bit(&self, idx: u64) -> bool {
        let byte_idx = (idx / 8) as usize;
        let bit_offset = (idx % 8) as u8;
        (self.bits[byte_idx] >> bit_offset) & 1 == 1
    }
}

impl std::fmt::Debug for BloomFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BloomFilter")
            .field("num_bits", &self.num_bits)
            .field("num_hashes", &self.seeds.len())
            .field("bytes", &self.bits.len())
            .finish()
    }
}

/// FNV-1a 32-bit hash.
fn fnv1a_32(data: &[u8]) -> u32 {
    const FNV_OFFSET: u32 = 0x811c_9dc5;
    const FNV_PRIME: u32 = 0x0100_0193;
    let mut hash = FNV_OFFSET;
    for &byte in data {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}
