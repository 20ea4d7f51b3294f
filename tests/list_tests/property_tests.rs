//! Model-checked operation sequences
//!
//! Drives both schemes with the same pseudo-random workload and compares
//! them against an in-memory `VecDeque` after every step.

use std::collections::VecDeque;

use disklist::{AddressingScheme, OffsetScheme, PagedScheme};
use tempfile::TempDir;

use crate::common::{file_len, reopen, setup_list_with_page_size};

/// Small deterministic LCG so failures reproduce
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u32 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 33) as u32
    }
}

fn model_delete(model: &mut VecDeque<u32>, value: u32) -> bool {
    match model.iter().position(|&v| v == value) {
        Some(idx) => {
            model.remove(idx);
            true
        }
        None => false,
    }
}

fn run_workload<S: AddressingScheme>(page_size: u16, seed: u64, steps: usize) {
    let temp = TempDir::new().unwrap();
    let mut list = setup_list_with_page_size::<S>(&temp, "model.llst", page_size);
    let mut model = VecDeque::new();
    let mut rng = Lcg(seed);
    let mut inserted = 0u64;
    let mut deleted = 0u64;
    let mut last_len = file_len(list.path());

    for _ in 0..steps {
        // Small value range so duplicates and hits are common
        let value = rng.next() % 16;
        match rng.next() % 4 {
            0 => {
                list.prepend_head(value).unwrap();
                model.push_front(value);
                inserted += 1;
            }
            1 => {
                list.append_tail(value).unwrap();
                model.push_back(value);
                inserted += 1;
            }
            _ => {
                let found = list.delete_first(value).unwrap();
                assert_eq!(found, model_delete(&mut model, value));
                if found {
                    deleted += 1;
                }
            }
        }

        let expected: Vec<u32> = model.iter().copied().collect();
        assert_eq!(list.traverse().unwrap(), expected);
        assert_eq!(list.len(), inserted - deleted);
        assert_eq!(list.len() as usize, expected.len());
        assert_eq!(
            list.is_empty(),
            S::is_null(list.head()) && S::is_null(list.tail())
        );

        let len = file_len(list.path());
        assert!(len >= last_len, "file shrank from {} to {}", last_len, len);
        last_len = len;
    }

    // Physical scan sees the same multiset of live values
    let mut physical = list.traverse_physical().unwrap();
    let mut logical = list.traverse_buffered().unwrap();
    physical.sort_unstable();
    logical.sort_unstable();
    assert_eq!(physical, logical);

    // And everything survives a reopen
    let path = list.path().to_path_buf();
    let header = list.header();
    list.close().unwrap();
    let mut reopened = reopen::<S>(&path);
    assert_eq!(reopened.header(), header);
    assert_eq!(
        reopened.traverse().unwrap(),
        model.into_iter().collect::<Vec<u32>>()
    );
}

#[test]
fn test_offset_matches_model() {
    run_workload::<OffsetScheme>(4096, 7, 300);
}

#[test]
fn test_paged_matches_model() {
    run_workload::<PagedScheme>(4096, 7, 300);
}

#[test]
fn test_paged_small_pages_match_model() {
    // Three slots per page: many page boundaries
    run_workload::<PagedScheme>(40, 42, 300);
}

#[test]
fn test_both_schemes_agree() {
    let temp = TempDir::new().unwrap();
    let mut offset = setup_list_with_page_size::<OffsetScheme>(&temp, "o.llst", 4096);
    let mut paged = setup_list_with_page_size::<PagedScheme>(&temp, "p.llst", 64);
    let mut rng = Lcg(99);

    for _ in 0..200 {
        let value = rng.next() % 10;
        match rng.next() % 3 {
            0 => {
                offset.prepend_head(value).unwrap();
                paged.prepend_head(value).unwrap();
            }
            1 => {
                offset.append_tail(value).unwrap();
                paged.append_tail(value).unwrap();
            }
            _ => {
                assert_eq!(
                    offset.delete_first(value).unwrap(),
                    paged.delete_first(value).unwrap()
                );
            }
        }
    }

    assert_eq!(offset.traverse().unwrap(), paged.traverse().unwrap());
    assert_eq!(offset.len(), paged.len());
}
