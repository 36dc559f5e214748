//! End-to-end scenarios driving the full engine stack on a real directory.

use config::Config;
use engine::Engine;
use tempfile::TempDir;

fn test_config() -> Config {
    Config {
        wal_segment_size: 8,
        memtable_capacity: 8,
        memtable_max_height: 6,
        bloom_fp_rate: 0.05,
        cache_capacity: 16,
        max_level: 3,
    }
}

#[test]
fn create_delete_read_scenario() {
    let dir = TempDir::new().unwrap();
    let mut engine = Engine::open(dir.path(), test_config()).unwrap();

    engine.create("a", b"1").unwrap();
    engine.create("b", b"2").unwrap();
    engine.delete("a").unwrap();

    assert!(engine.read("a").unwrap().is_none());
    assert_eq!(engine.read("b").unwrap().unwrap().value, b"2");
}

#[test]
fn workload_spanning_memtable_disk_and_compaction() {
    let dir = TempDir::new().unwrap();
    let mut engine = Engine::open(dir.path(), test_config()).unwrap();

    // Enough writes to force several flushes (capacity 8).
    for i in 0..40 {
        engine
            .create(&format!("key{i:02}"), format!("value{i}").as_bytes())
            .unwrap();
    }
    engine.update("key05", b"rewritten").unwrap();
    engine.delete("key10").unwrap();
    engine.flush().unwrap();
    engine.compact().unwrap();

    assert_eq!(engine.read("key05").unwrap().unwrap().value, b"rewritten");
    assert!(engine.read("key10").unwrap().is_none());
    for i in 11..40 {
        assert_eq!(
            engine.read(&format!("key{i:02}")).unwrap().unwrap().value,
            format!("value{i}").as_bytes()
        );
    }
}

#[test]
fn state_survives_restart() {
    let dir = TempDir::new().unwrap();
    {
        let mut engine = Engine::open(dir.path(), test_config()).unwrap();
        for i in 0..20 {
            engine
                .create(&format!("k{i:02}"), format!("v{i}").as_bytes())
                .unwrap();
        }
        engine.delete("k07").unwrap();
        // Drop flushes whatever the capacity flushes did not.
    }

    let mut engine = Engine::open(dir.path(), test_config()).unwrap();
    assert!(engine.read("k07").unwrap().is_none());
    for i in (0..20).filter(|&i| i != 7) {
        assert_eq!(
            engine.read(&format!("k{i:02}")).unwrap().unwrap().value,
            format!("v{i}").as_bytes(),
            "k{i:02} lost across restart"
        );
    }
}

#[test]
fn compaction_after_restart_keeps_newest_values() {
    let dir = TempDir::new().unwrap();
    {
        let mut engine = Engine::open(dir.path(), test_config()).unwrap();
        engine.create("k", b"old").unwrap();
        engine.flush().unwrap();
        engine.create("k", b"new").unwrap();
        engine.flush().unwrap();
    }

    let mut engine = Engine::open(dir.path(), test_config()).unwrap();
    engine.compact().unwrap();
    assert_eq!(engine.read("k").unwrap().unwrap().value, b"new");
}
