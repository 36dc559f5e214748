use crate::Engine;
use config::Config;
use tempfile::TempDir;

/// Small limits so tests can hit flush and rotation boundaries quickly.
pub fn small_config() -> Config {
    Config {
        wal_segment_size: 4,
        memtable_capacity: 4,
        memtable_max_height: 4,
        bloom_fp_rate: 0.05,
        cache_capacity: 8,
        max_level: 3,
    }
}

/// Limits high enough that nothing flushes unless a test asks for it.
pub fn roomy_config() -> Config {
    Config {
        memtable_capacity: 1000,
        ..small_config()
    }
}

pub fn open_engine(config: Config) -> (TempDir, Engine) {
    let dir = TempDir::new().unwrap();
    let engine = Engine::open(dir.path(), config).unwrap();
    (dir, engine)
}

/// Reopens an engine on the same directory, as a restart would.
pub fn reopen(dir: &TempDir, config: Config) -> Engine {
    Engine::open(dir.path(), config).unwrap()
}
