use super::helpers::*;
use sstable::layout;

#[test]
fn absent_key_reads_as_none() {
    let (_dir, mut engine) = open_engine(roomy_config());
    assert!(engine.read("nothing").unwrap().is_none());
}

#[test]
fn memtable_tombstone_shadows_older_disk_value() {
    let (_dir, mut engine) = open_engine(roomy_config());
    engine.create("k", b"on-disk").unwrap();
    engine.flush().unwrap();

    engine.delete("k").unwrap();
    assert!(engine.read("k").unwrap().is_none());
}

#[test]
fn newest_run_wins_across_same_level_runs() {
    let (_dir, mut engine) = open_engine(roomy_config());
    engine.create("k", b"old").unwrap();
    engine.flush().unwrap();
    engine.create("k", b"new").unwrap();
    engine.flush().unwrap();

    // Both Level 1 runs hold "k"; the higher-numbered (newer) run answers.
    assert_eq!(engine.run_count(1).unwrap(), 2);
    assert_eq!(engine.read("k").unwrap().unwrap().value, b"new");
}

#[test]
fn disk_hit_populates_the_cache() {
    let (dir, mut engine) = open_engine(roomy_config());
    engine.create("hot", b"value").unwrap();
    engine.flush().unwrap();

    // First read comes from the run and caches the entry.
    assert_eq!(engine.read("hot").unwrap().unwrap().value, b"value");
    assert_eq!(engine.cache_len(), 1);

    // With the run gone, the cache still answers.
    let level1 = layout::level_dir(dir.path(), 1);
    for (_, run_dir) in layout::list_runs(&level1).unwrap() {
        std::fs::remove_dir_all(run_dir).unwrap();
    }
    assert_eq!(engine.read("hot").unwrap().unwrap().value, b"value");
}

#[test]
fn memtable_hit_populates_the_cache() {
    let (_dir, mut engine) = open_engine(roomy_config());
    engine.create("k", b"v").unwrap();

    assert_eq!(engine.cache_len(), 0);
    engine.read("k").unwrap();
    assert_eq!(engine.cache_len(), 1);
}

#[test]
fn write_refreshes_an_already_cached_key() {
    let (_dir, mut engine) = open_engine(roomy_config());
    engine.create("k", b"v1").unwrap();
    engine.read("k").unwrap(); // now cached
    engine.update("k", b"v2").unwrap();

    // Push the key out of the memtable so the cache answers.
    engine.flush().unwrap();
    assert_eq!(engine.read("k").unwrap().unwrap().value, b"v2");
}

#[test]
fn cached_tombstone_reads_as_absent() {
    let (dir, mut engine) = open_engine(roomy_config());
    engine.create("k", b"v").unwrap();
    engine.delete("k").unwrap();
    engine.read("k").unwrap(); // caches the tombstone
    engine.flush().unwrap();

    // Remove the flushed run: only the cached tombstone knows the key now.
    let level1 = layout::level_dir(dir.path(), 1);
    for (_, run_dir) in layout::list_runs(&level1).unwrap() {
        std::fs::remove_dir_all(run_dir).unwrap();
    }
    assert!(engine.read("k").unwrap().is_none());
}

#[test]
fn end_to_end_create_delete_read() {
    let (_dir, mut engine) = open_engine(roomy_config());
    engine.create("a", b"1").unwrap();
    engine.create("b", b"2").unwrap();
    engine.delete("a").unwrap();

    assert!(engine.read("a").unwrap().is_none());
    assert_eq!(engine.read("b").unwrap().unwrap().value, b"2");
}
