use super::*;
use tempfile::tempdir;

fn put(key: &str, value: &[u8], ts: i64) -> Record {
    Record::new(key, value.to_vec(), ts, false)
}

fn del(key: &str, ts: i64) -> Record {
    Record::new(key, Vec::new(), ts, true)
}

fn replay_all(path: &Path) -> Result<Vec<Record>, WalError> {
    let mut reader = SegmentReader::open(path)?;
    let mut recs = Vec::new();
    reader.replay(|r| recs.push(r))?;
    Ok(recs)
}

// -------------------- Append & replay --------------------

#[test]
fn append_and_replay_round_trip() {
    let dir = tempdir().unwrap();
    let mut wal = Wal::attach(dir.path(), 100, 1, 0);

    wal.append(&put("a", b"1", 1)).unwrap();
    wal.append(&put("b", b"2", 2)).unwrap();
    wal.append(&del("a", 3)).unwrap();

    let recs = replay_all(&wal.active_segment()).unwrap();
    assert_eq!(recs, vec![put("a", b"1", 1), put("b", b"2", 2), del("a", 3)]);
}

#[test]
fn truncated_tail_is_tolerated() {
    let dir = tempdir().unwrap();
    let mut wal = Wal::attach(dir.path(), 100, 1, 0);
    wal.append(&put("a", b"1", 1)).unwrap();
    wal.append(&put("b", b"2", 2)).unwrap();

    // Chop bytes off the end, as a crash mid-append would.
    let path = wal.active_segment();
    let bytes = fs::read(&path).unwrap();
    fs::write(&path, &bytes[..bytes.len() - 5]).unwrap();

    let recs = replay_all(&path).unwrap();
    assert_eq!(recs, vec![put("a", b"1", 1)]);
}

#[test]
fn corrupt_value_is_an_error() {
    let dir = tempdir().unwrap();
    let mut wal = Wal::attach(dir.path(), 100, 1, 0);
    wal.append(&put("key", b"value", 1)).unwrap();

    let path = wal.active_segment();
    let mut bytes = fs::read(&path).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xff;
    fs::write(&path, &bytes).unwrap();

    assert!(matches!(replay_all(&path), Err(WalError::Corrupt(_))));
}

// -------------------- Rotation --------------------

#[test]
fn rotates_when_segment_is_full() {
    let dir = tempdir().unwrap();
    let mut wal = Wal::attach(dir.path(), 2, 1, 0);

    wal.append(&put("a", b"1", 1)).unwrap();
    wal.append(&put("b", b"2", 2)).unwrap();
    assert_eq!(wal.active_segment(), dir.path().join("wal_1.db"));

    wal.append(&put("c", b"3", 3)).unwrap();
    assert_eq!(wal.active_segment(), dir.path().join("wal_2.db"));
    assert_eq!(wal.segment_elements(), 1);

    let segments = list_segments(dir.path()).unwrap();
    assert_eq!(segments.iter().map(|(n, _)| *n).collect::<Vec<_>>(), vec![1, 2]);
}

#[test]
fn segment_numbers_sort_numerically() {
    let dir = tempdir().unwrap();
    for n in [1u64, 2, 10, 11] {
        fs::write(dir.path().join(segment_file_name(n)), b"").unwrap();
    }
    // A stray file must be ignored.
    fs::write(dir.path().join("notes.txt"), b"").unwrap();

    let nums: Vec<u64> = list_segments(dir.path()).unwrap().into_iter().map(|(n, _)| n).collect();
    assert_eq!(nums, vec![1, 2, 10, 11]);
}

#[test]
fn parse_segment_number_rejects_noise() {
    assert_eq!(parse_segment_number("wal_7.db"), Some(7));
    assert_eq!(parse_segment_number("wal_.db"), None);
    assert_eq!(parse_segment_number("wal_7.txt"), None);
    assert_eq!(parse_segment_number("segment_7.db"), None);
}

// -------------------- Maintenance --------------------

#[test]
fn count_records_matches_appends() {
    let dir = tempdir().unwrap();
    let mut wal = Wal::attach(dir.path(), 100, 1, 0);
    for i in 0..7 {
        wal.append(&put(&format!("k{i}"), b"v", i)).unwrap();
    }
    assert_eq!(count_records(&wal.active_segment()).unwrap(), 7);
}

#[test]
fn delete_all_clears_and_restarts_numbering() {
    let dir = tempdir().unwrap();
    let mut wal = Wal::attach(dir.path(), 1, 1, 0);
    for i in 0..4 {
        wal.append(&put(&format!("k{i}"), b"v", i)).unwrap();
    }
    assert!(list_segments(dir.path()).unwrap().len() > 1);

    wal.delete_all().unwrap();
    assert!(list_segments(dir.path()).unwrap().is_empty());
    assert_eq!(wal.active_segment(), dir.path().join("wal_1.db"));

    wal.append(&put("fresh", b"v", 9)).unwrap();
    let recs = replay_all(&wal.active_segment()).unwrap();
    assert_eq!(recs.len(), 1);
}
