//! Tests for open/close lifecycle and on-disk validation
//!
//! These tests verify:
//! - Reopen reproduces header and traversal
//! - Magic/version mismatch fails with InvalidFormat
//! - Truncated files fail with an I/O error
//! - Truncate flag resets an existing list
//! - Stored page size wins over configuration
//! - Sync strategy

use std::fs;
use std::io::ErrorKind;

use disklist::{
    AddressingScheme, DiskList, ListConfig, ListError, OffsetList, OffsetScheme, PagedList,
    PagedScheme, SyncStrategy,
};
use tempfile::TempDir;

use crate::common::{fill_mixed, reopen, setup_list, setup_list_with_page_size};

// =============================================================================
// Reopen Tests
// =============================================================================

fn check_reopen_reproduces_state<S: AddressingScheme>() {
    let temp = TempDir::new().unwrap();
    let mut list = setup_list::<S>(&temp, "list.llst");
    fill_mixed(&mut list);
    list.delete_first(0).unwrap();

    let header = list.header();
    let values = list.traverse().unwrap();
    let path = list.path().to_path_buf();
    list.close().unwrap();

    let mut reopened = reopen::<S>(&path);
    assert_eq!(reopened.header(), header);
    assert_eq!(reopened.read_header().unwrap(), header);
    assert_eq!(reopened.traverse().unwrap(), values);
    assert_eq!(reopened.len(), 5);

    // And it keeps working after reopen
    reopened.append_tail(6).unwrap();
    assert_eq!(reopened.traverse().unwrap(), vec![2, 1, 3, 4, 5, 6]);
}

#[test]
fn test_offset_reopen_reproduces_state() {
    check_reopen_reproduces_state::<OffsetScheme>();
}

#[test]
fn test_paged_reopen_reproduces_state() {
    check_reopen_reproduces_state::<PagedScheme>();
}

#[test]
fn test_in_memory_header_matches_disk_after_each_op() {
    let temp = TempDir::new().unwrap();
    let mut list: PagedList = setup_list(&temp, "paged.llst");

    list.append_tail(1).unwrap();
    assert_eq!(list.read_header().unwrap(), list.header());
    list.prepend_head(2).unwrap();
    assert_eq!(list.read_header().unwrap(), list.header());
    list.delete_first(1).unwrap();
    assert_eq!(list.read_header().unwrap(), list.header());
}

#[test]
fn test_truncate_resets_existing_list() {
    let temp = TempDir::new().unwrap();
    let mut list: OffsetList = setup_list(&temp, "offset.llst");
    fill_mixed(&mut list);
    let path = list.path().to_path_buf();
    list.close().unwrap();

    let mut list = OffsetList::open_path(&path, true).unwrap();
    assert!(list.is_empty());
    assert!(list.traverse().unwrap().is_empty());
    assert_eq!(fs::metadata(&path).unwrap().len(), 40);
}

#[test]
fn test_open_creates_missing_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("new.llst");
    assert!(!path.exists());

    let list = PagedList::open_path(&path, false).unwrap();

    assert!(path.exists());
    assert!(list.is_empty());
}

// =============================================================================
// Validation Tests
// =============================================================================

#[test]
fn test_paged_file_rejected_by_offset_list() {
    let temp = TempDir::new().unwrap();
    let mut paged: PagedList = setup_list(&temp, "list.llst");
    // Make the file at least as long as an offset header
    paged.append_tail(1).unwrap();
    let path = paged.path().to_path_buf();
    paged.close().unwrap();

    match OffsetList::open_path(&path, false) {
        Err(ListError::InvalidFormat(msg)) => assert!(msg.contains("magic")),
        Err(other) => panic!("expected InvalidFormat, got {other}"),
        Ok(_) => panic!("expected InvalidFormat, got an open list"),
    }
}

#[test]
fn test_offset_file_rejected_by_paged_list() {
    let temp = TempDir::new().unwrap();
    let list: OffsetList = setup_list(&temp, "list.llst");
    let path = list.path().to_path_buf();
    list.close().unwrap();

    let err = PagedList::open_path(&path, false).err().unwrap();
    assert!(err.is_format());
}

#[test]
fn test_garbage_file_rejected() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("garbage.llst");
    fs::write(&path, vec![b'X'; 64]).unwrap();

    assert!(OffsetList::open_path(&path, false).err().unwrap().is_format());
    assert!(PagedList::open_path(&path, false).err().unwrap().is_format());
}

#[test]
fn test_unsupported_version_rejected() {
    let temp = TempDir::new().unwrap();
    let list: PagedList = setup_list(&temp, "paged.llst");
    let path = list.path().to_path_buf();
    list.close().unwrap();

    let mut bytes = fs::read(&path).unwrap();
    bytes[4..6].copy_from_slice(&9u16.to_be_bytes());
    fs::write(&path, bytes).unwrap();

    let err = PagedList::open_path(&path, false).err().unwrap();
    assert!(err.to_string().contains("version"));
}

#[test]
fn test_truncated_header_is_io_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("short.llst");
    fs::write(&path, b"LLOF\x00\x01").unwrap();

    match OffsetList::open_path(&path, false) {
        Err(ListError::Io(e)) => assert_eq!(e.kind(), ErrorKind::UnexpectedEof),
        Err(other) => panic!("expected Io error, got {other}"),
        Ok(_) => panic!("expected Io error, got an open list"),
    }
}

#[test]
fn test_dangling_tail_is_io_error() {
    let temp = TempDir::new().unwrap();
    let mut list: OffsetList = setup_list(&temp, "offset.llst");
    list.append_tail(1).unwrap();
    list.append_tail(2).unwrap();
    let path = list.path().to_path_buf();
    list.close().unwrap();

    // Cut the last record in half
    let file = fs::OpenOptions::new().write(true).open(&path).unwrap();
    file.set_len(40 + 16 + 8).unwrap();
    drop(file);

    let mut list = OffsetList::open_path(&path, false).unwrap();
    assert!(matches!(list.traverse(), Err(ListError::Io(_))));
}

// =============================================================================
// Configuration Tests
// =============================================================================

#[test]
fn test_invalid_page_size_rejected_before_touching_disk() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("tiny.llst");
    let config = ListConfig::builder().path(&path).page_size(10).build();

    let err = PagedList::open(config).err().unwrap();
    assert!(matches!(err, ListError::Config(_)));
    assert!(!path.exists());
}

#[test]
fn test_stored_page_size_wins_on_reopen() {
    let temp = TempDir::new().unwrap();
    let mut list: PagedList = setup_list_with_page_size(&temp, "paged.llst", 128);
    for v in 0..25 {
        list.append_tail(v).unwrap();
    }
    let path = list.path().to_path_buf();
    list.close().unwrap();

    // Default config asks for 4096
    let mut list = PagedList::open_path(&path, false).unwrap();
    assert_eq!(list.scheme().slots_per_page(), 10);
    assert_eq!(list.page_count(), 3);
    assert_eq!(list.traverse().unwrap(), (0..25).collect::<Vec<u32>>());
}

#[test]
fn test_every_commit_syncs_each_mutation() {
    let temp = TempDir::new().unwrap();
    let config = ListConfig::builder()
        .path(temp.path().join("synced.llst"))
        .truncate(true)
        .sync_strategy(SyncStrategy::EveryCommit)
        .build();
    let mut list = DiskList::<OffsetScheme>::open(config).unwrap();
    let before = list.io_stats();

    list.append_tail(1).unwrap();
    list.prepend_head(2).unwrap();
    list.delete_first(1).unwrap();
    list.delete_first(42).unwrap(); // miss: no commit

    assert_eq!(list.io_stats().delta(&before).syncs, 3);
}

#[test]
fn test_on_close_strategy_does_not_sync_per_op() {
    let temp = TempDir::new().unwrap();
    let mut list: OffsetList = setup_list(&temp, "offset.llst");

    list.append_tail(1).unwrap();
    list.append_tail(2).unwrap();

    assert_eq!(list.io_stats().syncs, 0);
}

// =============================================================================
// Corruption Tests
// =============================================================================

fn patch(path: &std::path::Path, at: usize, bytes: &[u8]) {
    let mut data = fs::read(path).unwrap();
    data[at..at + bytes.len()].copy_from_slice(bytes);
    fs::write(path, data).unwrap();
}

fn expect_format_error<T>(result: disklist::Result<T>, needle: &str) {
    match result {
        Err(ListError::InvalidFormat(msg)) => assert!(msg.contains(needle), "{msg}"),
        Err(other) => panic!("expected InvalidFormat, got {other}"),
        Ok(_) => panic!("expected InvalidFormat, got Ok"),
    }
}

#[test]
fn test_size_without_head_rejected_on_open() {
    let temp = TempDir::new().unwrap();
    let list: PagedList = setup_list(&temp, "paged.llst");
    let path = list.path().to_path_buf();
    list.close().unwrap();

    // size lives at bytes 24..32 of the paged header
    patch(&path, 24, &u64::MAX.to_be_bytes());

    expect_format_error(PagedList::open_path(&path, false), "inconsistent header");
}

#[test]
fn test_head_without_size_rejected_on_open() {
    let temp = TempDir::new().unwrap();
    let mut list: OffsetList = setup_list(&temp, "offset.llst");
    list.append_tail(1).unwrap();
    let path = list.path().to_path_buf();
    list.close().unwrap();

    patch(&path, 24, &0i64.to_be_bytes());

    expect_format_error(OffsetList::open_path(&path, false), "inconsistent header");
}

#[test]
fn test_oversized_size_does_not_panic_traversal() {
    let temp = TempDir::new().unwrap();
    let mut list: OffsetList = setup_list(&temp, "offset.llst");
    list.append_tail(1).unwrap();
    list.append_tail(2).unwrap();
    let path = list.path().to_path_buf();
    list.close().unwrap();

    patch(&path, 24, &i64::MAX.to_be_bytes());

    let mut list = OffsetList::open_path(&path, false).unwrap();
    assert_eq!(list.traverse().unwrap(), vec![1, 2]);
    assert_eq!(list.traverse_buffered().unwrap(), vec![1, 2]);
    assert_eq!(list.page_visits().unwrap().values, vec![1, 2]);
}

#[test]
fn test_offset_cycle_detected() {
    let temp = TempDir::new().unwrap();
    let mut list: OffsetList = setup_list(&temp, "offset.llst");
    for v in 0..3 {
        list.append_tail(v).unwrap();
    }
    let path = list.path().to_path_buf();
    list.close().unwrap();

    // Point the tail record (offset 72) back at the head (offset 40)
    patch(&path, 72 + 4, &40i64.to_be_bytes());

    let mut list = OffsetList::open_path(&path, false).unwrap();
    expect_format_error(list.traverse(), "chain holds more than");
    expect_format_error(list.traverse_buffered(), "chain holds more than");
    expect_format_error(list.page_visits(), "chain holds more than");
    expect_format_error(list.delete_first(99), "chain holds more than");
}

#[test]
fn test_paged_cycle_detected_by_delete() {
    let temp = TempDir::new().unwrap();
    let mut list: PagedList = setup_list(&temp, "paged.llst");
    for v in 0..3 {
        list.append_tail(v).unwrap();
    }
    let path = list.path().to_path_buf();
    list.close().unwrap();

    // Slot (0, 2): header 32 + page header 2 + 2 * 12; next follows the value
    let next_at = 32 + 2 + 2 * 12 + 4;
    patch(&path, next_at, &0u32.to_be_bytes());
    patch(&path, next_at + 4, &0u16.to_be_bytes());

    let mut list = PagedList::open_path(&path, false).unwrap();
    expect_format_error(list.delete_first(99), "chain holds more than");
    expect_format_error(list.traverse_buffered(), "chain holds more than");
}
