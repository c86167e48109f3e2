/*
 * This file is a part of tallycore.
 *
 * tallycore is a bounded-memory, embeddable word-frequency counter.
 *
 * Copyright (c) 2024, tallycore contributors
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 *
*/

//! Composes the allocator, arena and hash index into the single public
//! entry point, and owns parameter tuning and the construction-time
//! dry-run precheck.

use core::ptr::NonNull;

use crate::{
    alloc::AllocatorState,
    arena::Arena,
    build_info::MAX_TOKEN_CEILING,
    config::{self, CounterConfig},
    enumerate::{self, Cursor, Snapshot},
    error::{Error, ErrorKind, TallyResult},
    hash::seeded_basis,
    index::{HashIndex, InsertOutcome, SLOT_SIZE},
    scanner,
};

/// Selects where the per-scan scratch buffer lives, mirroring the
/// `stack-scan-buffer` build-time flag. Recorded as a plain field (rather
/// than `#[cfg]`-ing the whole struct) so a single build can be introspected
/// the same way [`crate::build_info::BuildInfo`] already reports it.
#[derive(Clone, Copy)]
enum ScanBuffer {
    Stack,
    Heap { ptr: NonNull<u8>, len: usize },
}

/// A bounded-memory word-frequency counter.
///
/// `'a` is the lifetime of an optional caller-supplied static region: when
/// [`CounterConfig::static_region`] is set, the borrow checker enforces that
/// the region outlives the counter, which is what a C API would otherwise
/// have to enforce by convention (and a misused convention at that) with a
/// raw base pointer.
pub struct Counter<'a> {
    allocator: AllocatorState,
    arena: Arena,
    index: HashIndex,
    max_token_len: usize,
    hash_basis: u32,
    is_static: bool,
    total: u64,
    scan_buffer: ScanBuffer,
    _region: core::marker::PhantomData<&'a mut [u8]>,
}

impl Counter<'static> {
    /// Convenience constructor: dynamic mode, platform-default tuning, no
    /// byte budget.
    pub fn open(max_token_len: usize) -> TallyResult<Self> {
        Self::open_with_config(max_token_len, CounterConfig::default())
    }
}

impl<'a> Counter<'a> {
    /// Full-control constructor. See [`CounterConfig`] for the zero-means-
    /// default fields.
    pub fn open_with_config(max_token_len: usize, mut config: CounterConfig<'a>) -> TallyResult<Self> {
        let region = config.static_region.take();
        let is_static = region.is_some();
        let static_region_size = region.as_ref().map(|r| r.len());

        let tuning = config::derive_tuning(
            max_token_len,
            config.initial_capacity,
            config.block_size,
            config.byte_budget,
            static_region_size,
            SLOT_SIZE,
        );

        let heap_scan_buf_len = if cfg!(feature = "stack-scan-buffer") {
            0
        } else {
            tuning.max_token_len
        };

        let mut allocator = match region {
            Some(region) => {
                let base = NonNull::new(region.as_mut_ptr()).ok_or_else(|| Error::new(ErrorKind::InvalidArg))?;
                let region_size = region.len();
                let scratch = AllocatorState::new_static(base, region_size, config.byte_budget)?;
                Self::dry_run(scratch, tuning.capacity, tuning.block_size, heap_scan_buf_len)?;
                AllocatorState::new_static(base, region_size, config.byte_budget)?
            }
            None => AllocatorState::new_heap(config.byte_budget),
        };

        let index = HashIndex::new(&mut allocator, tuning.capacity)?;
        let arena = Arena::new(&mut allocator, tuning.block_size, is_static)?;
        let scan_buffer = if heap_scan_buf_len > 0 {
            let ptr = allocator.allocate(heap_scan_buf_len)?;
            ScanBuffer::Heap {
                ptr,
                len: heap_scan_buf_len,
            }
        } else {
            ScanBuffer::Stack
        };

        log::debug!(
            target: "tallycore::counter",
            "counter opened: static={is_static} capacity={} block_size={} max_token_len={}",
            tuning.capacity, tuning.block_size, tuning.max_token_len
        );

        Ok(Self {
            allocator,
            arena,
            index,
            max_token_len: tuning.max_token_len,
            hash_basis: seeded_basis(config.hash_seed),
            is_static,
            total: 0,
            scan_buffer,
            _region: core::marker::PhantomData,
        })
    }

    /// Simulates construction's allocations on a scratch copy of the
    /// allocator state, to fail fast on an infeasible static region before
    /// any allocation the caller would have to unwind. The scratch copy is
    /// a plain value (`AllocatorState` is `Copy`) and is discarded when this
    /// returns; any zero-writes it performs land on the same byte offsets
    /// the real construction immediately repeats, so they're harmless.
    fn dry_run(mut scratch: AllocatorState, capacity: usize, block_size: usize, heap_scan_buf_len: usize) -> TallyResult<()> {
        let slots_bytes = capacity
            .checked_mul(SLOT_SIZE)
            .ok_or_else(|| Error::new(ErrorKind::OutOfMemory))?;
        scratch.allocate(slots_bytes)?;
        scratch.allocate(block_size)?;
        if heap_scan_buf_len > 0 {
            scratch.allocate(heap_scan_buf_len)?;
        }
        log::trace!(target: "tallycore::counter", "dry-run precheck succeeded");
        Ok(())
    }

    /// Case-sensitive single-token insertion. Empty input is a no-op
    /// success. `key` is truncated to `max_token_len` bytes, unchanged in
    /// case.
    pub fn add(&mut self, key: &[u8]) -> TallyResult<()> {
        if key.is_empty() {
            return Ok(());
        }
        let (prefix, hash) = scanner::prepare_add(key, self.max_token_len, self.hash_basis);
        self.insert_token(prefix, hash)
    }

    /// Case-insensitive bulk tokenization. `bytes.is_empty()` is a no-op
    /// success even if a caller's wrapper passed a null pointer alongside a
    /// zero length. Aborts at the first insertion failure; tokens already
    /// committed during this call remain counted.
    pub fn scan(&mut self, bytes: &[u8]) -> TallyResult<()> {
        if bytes.is_empty() {
            return Ok(());
        }
        match self.scan_buffer {
            ScanBuffer::Stack => {
                let mut stack_buf = [0u8; MAX_TOKEN_CEILING];
                let max_token_len = self.max_token_len;
                let hash_basis = self.hash_basis;
                scanner::scan_tokens(bytes, max_token_len, hash_basis, &mut stack_buf[..max_token_len], |tok, hash| {
                    self.insert_token(tok, hash)
                })
            }
            ScanBuffer::Heap { ptr, len } => {
                // SAFETY: `ptr`/`len` were returned by this counter's own
                // allocator and are released only by `Drop`, never aliased
                // elsewhere.
                let buf = unsafe { core::slice::from_raw_parts_mut(ptr.as_ptr(), len) };
                let max_token_len = self.max_token_len;
                let hash_basis = self.hash_basis;
                scanner::scan_tokens(bytes, max_token_len, hash_basis, buf, |tok, hash| self.insert_token(tok, hash))
            }
        }
    }

    fn insert_token(&mut self, bytes: &[u8], hash: u32) -> TallyResult<()> {
        let _: InsertOutcome = self.index.insert(&mut self.allocator, &mut self.arena, self.is_static, bytes, hash)?;
        self.total += 1;
        Ok(())
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn unique(&self) -> usize {
        self.index.unique()
    }

    pub fn max_token_len(&self) -> usize {
        self.max_token_len
    }

    /// Resets to empty without destroying the counter: releases (dynamic
    /// mode) or rewinds (static mode) every arena block but the first, and
    /// zeroes the slot array in place.
    pub fn clear(&mut self) {
        self.arena.clear(&mut self.allocator);
        self.index.clear();
        self.total = 0;
    }

    /// A sorted snapshot: count descending, lexicographic-ascending tie
    /// break. Fails with `InvariantViolation` if the occupied-slot walk
    /// disagrees with the tracked unique count.
    pub fn snapshot(&self) -> TallyResult<Snapshot<'_>> {
        enumerate::snapshot(&self.index)
    }

    /// The first `n` entries of the sorted snapshot, without materializing
    /// and fully sorting the whole `unique`-sized array when `n` is small.
    pub fn top_n(&self, n: usize) -> TallyResult<Vec<(&[u8], u64)>> {
        enumerate::top_n(&self.index, n)
    }

    /// A zero-allocation, borrowing iterator over occupied slots in
    /// implementation-defined but stable order.
    pub fn cursor(&self) -> Cursor<'_> {
        Cursor::new(&self.index)
    }
}

impl Drop for Counter<'_> {
    fn drop(&mut self) {
        self.arena.release(&mut self.allocator);
        self.index.release(&mut self.allocator);
        if let ScanBuffer::Heap { ptr, len } = self.scan_buffer {
            self.allocator.release(ptr, len);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_defaults_then_add_and_scan() {
        let mut c = Counter::open(0).unwrap();
        c.scan(b"Hello World").unwrap();
        assert_eq!(c.total(), 2);
        assert_eq!(c.unique(), 2);
    }

    #[test]
    fn case_insensitive_scan_merges() {
        let mut c = Counter::open(23).unwrap();
        c.scan(b"Hello HELLO hello HeLLo").unwrap();
        assert_eq!(c.total(), 4);
        assert_eq!(c.unique(), 1);
    }

    #[test]
    fn add_is_case_sensitive() {
        let mut c = Counter::open(0).unwrap();
        c.add(b"Foo").unwrap();
        c.add(b"foo").unwrap();
        assert_eq!(c.unique(), 2);
    }

    #[test]
    fn empty_inputs_are_neutral() {
        let mut c = Counter::open(0).unwrap();
        c.scan(b"").unwrap();
        c.add(b"").unwrap();
        assert_eq!(c.total(), 0);
        assert_eq!(c.unique(), 0);
    }

    #[test]
    fn clear_resets_counts_and_stays_usable() {
        let mut c = Counter::open(0).unwrap();
        c.scan(b"apple banana apple").unwrap();
        c.clear();
        assert_eq!(c.total(), 0);
        assert_eq!(c.unique(), 0);
        c.add(b"cherry").unwrap();
        assert_eq!(c.total(), 1);
    }

    #[test]
    fn static_region_one_byte_short_fails_but_minimum_succeeds() {
        let mut find_min = None;
        for size in 64..8192 {
            let mut buf = vec![0u8; size];
            let config = CounterConfig::builder().static_region(&mut buf).build();
            if Counter::open_with_config(0, config).is_ok() {
                find_min = Some(size);
                break;
            }
        }
        let s_min = find_min.expect("some size in the probed range must admit construction");
        let mut too_small = vec![0u8; s_min - 1];
        let config = CounterConfig::builder().static_region(&mut too_small).build();
        assert!(Counter::open_with_config(0, config).is_err());
    }

    #[test]
    fn snapshot_is_sorted_count_desc_then_lex_asc() {
        let mut c = Counter::open(0).unwrap();
        c.scan(b"apple banana apple cherry apple banana").unwrap();
        let snap = c.snapshot().unwrap();
        let entries: Vec<_> = snap.entries().iter().map(|(k, n)| (*k, *n)).collect();
        assert_eq!(
            entries,
            vec![(&b"apple"[..], 3), (&b"banana"[..], 2), (&b"cherry"[..], 1)]
        );
    }

    #[test]
    fn top_n_matches_prefix_of_full_snapshot() {
        let mut c = Counter::open(0).unwrap();
        c.scan(b"apple banana apple cherry apple banana date").unwrap();
        let full = c.snapshot().unwrap();
        let top2 = c.top_n(2).unwrap();
        assert_eq!(top2, full.entries()[..2].to_vec());
    }

    #[test]
    fn cursor_covers_exactly_unique_entries_summing_to_total() {
        let mut c = Counter::open(0).unwrap();
        c.scan(b"one two two three three three").unwrap();
        let mut count = 0u64;
        let mut seen = 0usize;
        for (_, n) in c.cursor() {
            count += n;
            seen += 1;
        }
        assert_eq!(seen, c.unique());
        assert_eq!(count, c.total());
    }
}
