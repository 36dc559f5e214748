use super::helpers::*;

#[test]
fn a_single_run_is_left_alone() {
    let (_dir, mut engine) = open_engine(roomy_config());
    engine.create("k", b"v").unwrap();
    engine.flush().unwrap();

    engine.compact().unwrap();
    assert_eq!(engine.run_count(1).unwrap(), 1);
    assert_eq!(engine.run_count(2).unwrap(), 0);
}

#[test]
fn a_pair_merges_into_the_next_level() {
    let (_dir, mut engine) = open_engine(roomy_config());
    engine.create("apple", b"1").unwrap();
    engine.create("mango", b"2").unwrap();
    engine.flush().unwrap();
    engine.create("banana", b"3").unwrap();
    engine.flush().unwrap();

    engine.compact().unwrap();

    assert_eq!(engine.run_count(1).unwrap(), 0);
    assert_eq!(engine.run_count(2).unwrap(), 1);
    for (key, value) in [("apple", b"1"), ("banana", b"3"), ("mango", b"2")] {
        assert_eq!(engine.read(key).unwrap().unwrap().value, value);
    }
}

#[test]
fn an_odd_run_waits_for_the_next_cycle() {
    let (_dir, mut engine) = open_engine(roomy_config());
    for i in 0..3 {
        engine.create(&format!("k{i}"), b"v").unwrap();
        engine.flush().unwrap();
    }

    engine.compact().unwrap();

    assert_eq!(engine.run_count(1).unwrap(), 1);
    assert_eq!(engine.run_count(2).unwrap(), 1);
}

#[test]
fn four_runs_cascade_to_the_third_level() {
    let (_dir, mut engine) = open_engine(roomy_config());
    for i in 0..4 {
        engine.create(&format!("k{i}"), format!("v{i}").as_bytes()).unwrap();
        engine.flush().unwrap();
    }

    // One cycle: Level 1's two pairs land in Level 2, and the same cycle
    // then merges that Level 2 pair into Level 3.
    engine.compact().unwrap();

    assert_eq!(engine.run_count(1).unwrap(), 0);
    assert_eq!(engine.run_count(2).unwrap(), 0);
    assert_eq!(engine.run_count(3).unwrap(), 1);
    for i in 0..4 {
        assert_eq!(
            engine.read(&format!("k{i}")).unwrap().unwrap().value,
            format!("v{i}").as_bytes()
        );
    }
}

#[test]
fn newer_value_survives_the_merge() {
    let (_dir, mut engine) = open_engine(roomy_config());
    engine.create("k", b"old").unwrap();
    engine.flush().unwrap();
    engine.update("k", b"new").unwrap();
    engine.flush().unwrap();

    engine.compact().unwrap();
    assert_eq!(engine.read("k").unwrap().unwrap().value, b"new");
}

#[test]
fn deletion_is_dropped_at_merge() {
    let (_dir, mut engine) = open_engine(roomy_config());
    engine.create("k", b"v").unwrap();
    engine.flush().unwrap();
    engine.delete("k").unwrap();
    engine.flush().unwrap();

    engine.compact().unwrap();

    // The tombstone won the merge and was dropped; with "k" the only key,
    // no merged run was written at all.
    assert_eq!(engine.run_count(1).unwrap(), 0);
    assert_eq!(engine.run_count(2).unwrap(), 0);
    assert!(engine.read("k").unwrap().is_none());
}

#[test]
fn merge_mixing_live_and_dead_keys() {
    let (_dir, mut engine) = open_engine(roomy_config());
    engine.create("keep", b"1").unwrap();
    engine.create("drop", b"2").unwrap();
    engine.flush().unwrap();
    engine.delete("drop").unwrap();
    engine.flush().unwrap();

    engine.compact().unwrap();

    assert_eq!(engine.run_count(2).unwrap(), 1);
    assert_eq!(engine.read("keep").unwrap().unwrap().value, b"1");
    assert!(engine.read("drop").unwrap().is_none());
}
