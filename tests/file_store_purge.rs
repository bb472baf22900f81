//! File store compaction tests
//!
//! After `purge`:
//! - no tombstoned slots remain
//! - the live records (ids and fields) are exactly those before
//! - file length == live count * slot width
//! - the store reopens to the same state

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use filecabinet::record::{Income, Record, RecordDraft};
use filecabinet::storage::slot::{SLOT_SIZE, SLOT_STRIDE};
use filecabinet::storage::{FileStore, RecordStore, SlotReader, StoreStat};
use filecabinet::validation::ValidatorBuilder;
use tempfile::TempDir;

fn open(path: &Path) -> FileStore {
    FileStore::open(path, Box::new(ValidatorBuilder::new().validate_height(50, 250).build()))
        .unwrap()
}

fn draft(n: usize) -> RecordDraft {
    RecordDraft::new(
        format!("First{}", n),
        format!("Last{}", n),
        NaiveDate::from_ymd_opt(1960 + n as i32, 1 + (n % 12) as u32, 1 + (n % 28) as u32).unwrap(),
        100 + n as i16,
        Income::from_hundredths(n as i128 * 1_001),
        (b'A' + (n % 26) as u8) as char,
    )
}

fn sorted(mut records: Vec<Record>) -> Vec<Record> {
    records.sort_by_key(|r| r.id);
    records
}

/// Store with `count` records, removing those whose 1-based index is in `dead`.
fn populated(path: &Path, count: usize, dead: &[i32]) -> FileStore {
    let mut store = open(path);
    for n in 0..count {
        store.create(draft(n)).unwrap();
    }
    for id in dead {
        assert!(store.remove(*id).unwrap());
    }
    store
}

#[test]
fn test_purge_preserves_live_records() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cabinet.db");
    let mut store = populated(&path, 12, &[1, 2, 5, 6, 7, 10, 12]);
    let before = sorted(store.get_all().unwrap());

    let purged = store.purge().unwrap();

    assert_eq!(purged, 7);
    assert_eq!(sorted(store.get_all().unwrap()), before);
    assert_eq!(store.get_stat().unwrap(), StoreStat { live: 5, removed: 0 });
    assert_eq!(fs::metadata(&path).unwrap().len(), 5 * SLOT_SIZE as u64);
}

#[test]
fn test_purge_keeps_relative_order() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cabinet.db");
    let mut store = populated(&path, 6, &[1, 3, 4]);

    store.purge().unwrap();

    let ids: Vec<i32> = store.get_all().unwrap().iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![2, 5, 6]);
    for (position, id) in ids.iter().enumerate() {
        assert_eq!(store.offset_of(*id), Some(position as u64 * SLOT_STRIDE));
    }
}

#[test]
fn test_purge_on_fresh_file_returns_zero() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cabinet.db");
    let mut store = open(&path);

    assert_eq!(store.purge().unwrap(), 0);
    assert_eq!(fs::metadata(&path).unwrap().len(), 0);
}

#[test]
fn test_purge_all_tombstoned() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cabinet.db");
    let mut store = populated(&path, 4, &[1, 2, 3, 4]);

    assert_eq!(store.purge().unwrap(), 4);
    assert_eq!(fs::metadata(&path).unwrap().len(), 0);
    assert!(store.get_all().unwrap().is_empty());
}

#[test]
fn test_purge_only_trailing_tombstones_truncates() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cabinet.db");
    let mut store = populated(&path, 5, &[4, 5]);
    let head = fs::read(&path).unwrap()[..3 * SLOT_SIZE].to_vec();

    assert_eq!(store.purge().unwrap(), 2);
    assert_eq!(fs::read(&path).unwrap(), head);
}

#[test]
fn test_purged_file_reopens_to_same_state() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cabinet.db");
    let expected = {
        let mut store = populated(&path, 8, &[2, 3, 7]);
        store.purge().unwrap();
        store.get_all().unwrap()
    };

    let mut store = open(&path);
    assert_eq!(store.get_all().unwrap(), expected);
    assert_eq!(store.create(draft(99)).unwrap(), 9);
}

#[test]
fn test_purge_then_append_and_remove() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cabinet.db");
    let mut store = populated(&path, 3, &[1]);
    store.purge().unwrap();

    let id = store.create(draft(3)).unwrap();
    assert_eq!(id, 4);
    assert_eq!(store.offset_of(4), Some(2 * SLOT_STRIDE));
    assert!(store.remove(2).unwrap());
    assert_eq!(store.get_stat().unwrap(), StoreStat { live: 2, removed: 1 });
}

#[test]
fn test_slot_scan_after_purge_sees_no_tombstones() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cabinet.db");
    let mut store = populated(&path, 10, &[1, 4, 9]);
    store.purge().unwrap();
    drop(store);

    let file = fs::File::open(&path).unwrap();
    let mut reader = SlotReader::new(&file).unwrap();
    let mut count = 0;
    while let Some((_, deleted)) = reader.next_flag().unwrap() {
        assert!(!deleted);
        count += 1;
    }
    assert_eq!(count, 7);
}
