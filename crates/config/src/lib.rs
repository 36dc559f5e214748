//! # Configuration
//!
//! The immutable settings struct built once at startup and passed by
//! reference into the engine. There are no global mutable settings anywhere
//! in the system.
//!
//! Settings load from a JSON file; a missing or malformed file silently
//! falls back to the documented defaults (absence of configuration is not an
//! error). Fields omitted from the file individually default too.
//!
//! ```json
//! {
//!     "wal_segment_size": 100,
//!     "memtable_capacity": 1000,
//!     "memtable_max_height": 10,
//!     "bloom_fp_rate": 0.05,
//!     "cache_capacity": 50,
//!     "max_level": 5
//! }
//! ```

use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// Records per WAL segment before rotation.
pub const DEFAULT_WAL_SEGMENT_SIZE: u64 = 100;
/// Memtable key slots before a flush is triggered.
pub const DEFAULT_MEMTABLE_CAPACITY: usize = 1000;
/// Skip-list level cap.
pub const DEFAULT_MEMTABLE_MAX_HEIGHT: usize = 10;
/// Bloom filter target false-positive rate.
pub const DEFAULT_BLOOM_FP_RATE: f64 = 0.05;
/// LRU cache entry capacity.
pub const DEFAULT_CACHE_CAPACITY: usize = 50;
/// Deepest SSTable level.
pub const DEFAULT_MAX_LEVEL: u32 = 5;

/// Engine settings, fixed for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub wal_segment_size: u64,
    pub memtable_capacity: usize,
    pub memtable_max_height: usize,
    pub bloom_fp_rate: f64,
    pub cache_capacity: usize,
    pub max_level: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            wal_segment_size: DEFAULT_WAL_SEGMENT_SIZE,
            memtable_capacity: DEFAULT_MEMTABLE_CAPACITY,
            memtable_max_height: DEFAULT_MEMTABLE_MAX_HEIGHT,
            bloom_fp_rate: DEFAULT_BLOOM_FP_RATE,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            max_level: DEFAULT_MAX_LEVEL,
        }
    }
}

impl Config {
    /// Loads settings from a JSON file, falling back to defaults when the
    /// file is absent or cannot be parsed.
    pub fn load(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(_) => {
                debug!(path = %path.display(), "no config file, using defaults");
                return Self::default();
            }
        };
        match serde_json::from_str(&text) {
            Ok(config) => config,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "unreadable config, using defaults");
                Self::default()
            }
        }
    }
}
