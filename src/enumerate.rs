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

//! Sorted snapshot extraction and a zero-allocation streaming cursor, both
//! borrowing from the owning counter's hash index.

use crate::{
    error::{Error, ErrorKind, TallyResult},
    index::HashIndex,
};

/// A sorted, caller-held view of a counter's state at the moment of the
/// call: count descending, lexicographic-ascending tie break. Since every
/// stored key is unique, the ordering is fully deterministic.
///
/// Unlike the allocator-owned token bytes it points into, the snapshot's own
/// backing array lives outside the budgeted allocator. It's a plain `Vec`
/// dropped the ordinary way when the snapshot goes out of scope.
pub struct Snapshot<'a> {
    entries: Vec<(&'a [u8], u64)>,
}

impl<'a> Snapshot<'a> {
    pub fn entries(&self) -> &[(&'a [u8], u64)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn sort_key(a: &(&[u8], u64), b: &(&[u8], u64)) -> core::cmp::Ordering {
    b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0))
}

/// Builds a sorted snapshot of `index`. The occupied-slot count observed
/// during the walk is checked against [`HashIndex::unique`]; a mismatch
/// means corruption and is reported rather than silently truncated.
pub fn snapshot(index: &HashIndex) -> TallyResult<Snapshot<'_>> {
    let mut entries: Vec<(&[u8], u64)> = index.iter().collect();
    if entries.len() != index.unique() {
        return Err(Error::new(ErrorKind::InvariantViolation));
    }
    entries.sort_by(sort_key);
    Ok(Snapshot { entries })
}

/// The first `n` entries of the sorted snapshot. Uses a partial selection
/// rather than a full sort when `n` is smaller than `unique`, since a
/// caller asking for a top-K list shouldn't pay for ordering entries it
/// will never read.
pub fn top_n(index: &HashIndex, n: usize) -> TallyResult<Vec<(&[u8], u64)>> {
    let mut entries: Vec<(&[u8], u64)> = index.iter().collect();
    if entries.len() != index.unique() {
        return Err(Error::new(ErrorKind::InvariantViolation));
    }
    let n = n.min(entries.len());
    if n == 0 {
        return Ok(Vec::new());
    }
    if n < entries.len() {
        entries.select_nth_unstable_by(n - 1, sort_key);
        entries.truncate(n);
    }
    entries.sort_by(sort_key);
    Ok(entries)
}

/// A borrowing iterator over occupied slots, in implementation-defined but
/// stable order. Yields no allocations.
pub struct Cursor<'a> {
    index: &'a HashIndex,
    next_slot: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(index: &'a HashIndex) -> Self {
        Self { index, next_slot: 0 }
    }
}

impl<'a> Iterator for Cursor<'a> {
    type Item = (&'a [u8], u64);

    fn next(&mut self) -> Option<Self::Item> {
        let (slot, key, count) = self.index.next_occupied_from(self.next_slot)?;
        self.next_slot = slot + 1;
        Some((key, count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{alloc::AllocatorState, arena::Arena, hash::{hash_bytes, seeded_basis}};

    fn indexed(words: &[&str]) -> (AllocatorState, Arena, HashIndex) {
        let mut allocator = AllocatorState::new_heap(0);
        let mut arena = Arena::new(&mut allocator, 4096, false).unwrap();
        let mut index = HashIndex::new(&mut allocator, 16).unwrap();
        let basis = seeded_basis(0);
        for w in words {
            let h = hash_bytes(basis, w.as_bytes());
            index.insert(&mut allocator, &mut arena, false, w.as_bytes(), h).unwrap();
        }
        (allocator, arena, index)
    }

    #[test]
    fn snapshot_orders_by_count_desc_then_key_asc() {
        let (_a, _arena, index) = indexed(&["banana", "apple", "apple", "cherry"]);
        let snap = snapshot(&index).unwrap();
        let words: Vec<_> = snap.entries().iter().map(|(k, n)| (*k, *n)).collect();
        assert_eq!(words, vec![(&b"apple"[..], 2), (&b"banana"[..], 1), (&b"cherry"[..], 1)]);
    }

    #[test]
    fn empty_index_yields_empty_snapshot() {
        let (_a, _arena, index) = indexed(&[]);
        let snap = snapshot(&index).unwrap();
        assert!(snap.is_empty());
    }

    #[test]
    fn top_n_is_prefix_of_full_order() {
        let (_a, _arena, index) = indexed(&["one", "two", "two", "three", "three", "three"]);
        let full = snapshot(&index).unwrap();
        let top1 = top_n(&index, 1).unwrap();
        assert_eq!(top1, full.entries()[..1].to_vec());
    }

    #[test]
    fn cursor_yields_every_occupied_slot_once() {
        let (_a, _arena, index) = indexed(&["a", "b", "c"]);
        let seen: Vec<_> = Cursor::new(&index).collect();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen.iter().map(|(_, n)| n).sum::<u64>(), 3);
    }
}
