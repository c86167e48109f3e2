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

//! A power-of-two, open-addressed hash table with linear probing,
//! FNV-1a(+seed) hashing, and 0.7 load-factor growth in dynamic mode.
//!
//! Slots live in a single allocator-owned array rather than individually
//! boxed, so the whole array can be released (or rehashed into a fresh
//! array) in one allocator call. Zero-initialized memory is a valid empty
//! slot for free: `Option<NonNull<u8>>` has the null-pointer niche, so an
//! all-zero `Slot` decodes as `key_ptr: None`.

use crate::{
    alloc::AllocatorState,
    arena::Arena,
    error::{Error, ErrorKind, TallyResult},
};
use core::{mem, ptr::NonNull, slice};

/// Strict 0.7 load factor: `unique * 10 < capacity * 7` must hold after
/// every successful insert.
const LOAD_FACTOR_NUM: usize = 7;
const LOAD_FACTOR_DEN: usize = 10;

#[derive(Clone, Copy)]
#[repr(C)]
struct Slot {
    key_ptr: Option<NonNull<u8>>,
    key_len: u32,
    hash: u32,
    count: u64,
}

/// Bytes occupied by one slot, used by [`crate::config`] to cap table size
/// against the construction-time table budget.
pub const SLOT_SIZE: usize = mem::size_of::<Slot>();

impl Slot {
    #[inline(always)]
    fn is_occupied(&self) -> bool {
        self.key_ptr.is_some()
    }
    #[inline(always)]
    fn key(&self) -> &[u8] {
        debug_assert!(self.is_occupied());
        unsafe {
            // SAFETY: only called on occupied slots, whose key_ptr/key_len
            // were populated together from an arena copy of this length.
            slice::from_raw_parts(self.key_ptr.unwrap_unchecked().as_ptr(), self.key_len as usize)
        }
    }
}

pub enum InsertOutcome {
    /// The key already existed; its count was incremented.
    Existing,
    /// The key was new; it now occupies a fresh slot with count 1.
    New,
}

pub struct HashIndex {
    slots: NonNull<Slot>,
    capacity: usize,
    unique: usize,
}

impl HashIndex {
    pub fn new(allocator: &mut AllocatorState, capacity: usize) -> TallyResult<Self> {
        debug_assert!(capacity.is_power_of_two());
        let bytes = capacity
            .checked_mul(mem::size_of::<Slot>())
            .ok_or_else(|| Error::new(ErrorKind::OutOfMemory))?;
        let raw = allocator.allocate(bytes)?;
        Ok(Self {
            slots: raw.cast(),
            capacity,
            unique: 0,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn unique(&self) -> usize {
        self.unique
    }

    #[inline(always)]
    fn as_slice(&self) -> &[Slot] {
        unsafe { slice::from_raw_parts(self.slots.as_ptr(), self.capacity) }
    }

    #[inline(always)]
    fn as_slice_mut(&mut self) -> &mut [Slot] {
        unsafe { slice::from_raw_parts_mut(self.slots.as_ptr(), self.capacity) }
    }

    fn over_load_factor(&self, extra_units: usize) -> bool {
        (self.unique + extra_units) * LOAD_FACTOR_DEN >= self.capacity * LOAD_FACTOR_NUM
    }

    /// Finds the slot a key with this hash/bytes currently occupies, or the
    /// first empty slot on its probe sequence.
    fn probe(slots: &[Slot], mask: usize, hash: u32, bytes: &[u8]) -> Option<Probe> {
        let mut idx = hash as usize & mask;
        for _ in 0..=mask {
            let slot = &slots[idx];
            if !slot.is_occupied() {
                return Some(Probe::Empty(idx));
            }
            // Length is checked before the byte comparison: this is
            // load-bearing for memory safety, since FNV-1a collisions
            // across differing lengths do occur in practice.
            if slot.hash == hash && slot.key_len as usize == bytes.len() && slot.key() == bytes {
                return Some(Probe::Match(idx));
            }
            idx = (idx + 1) & mask;
        }
        None
    }

    /// Finds the first empty slot for `hash`, assuming no matching key can
    /// exist (used only while rehashing into a fresh array).
    fn probe_empty(slots: &[Slot], mask: usize, hash: u32) -> Option<usize> {
        let mut idx = hash as usize & mask;
        for _ in 0..=mask {
            if !slots[idx].is_occupied() {
                return Some(idx);
            }
            idx = (idx + 1) & mask;
        }
        None
    }

    /// Inserts or bumps the count for `bytes` (already truncated/folded by
    /// the tokenizer), hashed to `hash`.
    ///
    /// The 0.7 load-factor check runs unconditionally before probing, even
    /// when the call will turn out to just increment an existing key. In
    /// static mode this means operations on an already-full table fail
    /// with `OutOfMemory` even for keys already present.
    pub fn insert(
        &mut self,
        allocator: &mut AllocatorState,
        arena: &mut Arena,
        is_static: bool,
        bytes: &[u8],
        hash: u32,
    ) -> TallyResult<InsertOutcome> {
        if self.over_load_factor(1) {
            if is_static {
                return Err(Error::new(ErrorKind::OutOfMemory));
            }
            self.grow(allocator)?;
        }
        let mask = self.capacity - 1;
        match Self::probe(self.as_slice(), mask, hash, bytes) {
            Some(Probe::Match(idx)) => {
                self.as_slice_mut()[idx].count += 1;
                Ok(InsertOutcome::Existing)
            }
            Some(Probe::Empty(idx)) => {
                let ptr = arena.copy_bytes(allocator, bytes)?;
                self.as_slice_mut()[idx] = Slot {
                    key_ptr: Some(ptr),
                    key_len: bytes.len() as u32,
                    hash,
                    count: 1,
                };
                self.unique += 1;
                Ok(InsertOutcome::New)
            }
            None => Err(Error::new(ErrorKind::OutOfMemory)),
        }
    }

    /// Doubles capacity, re-probing every occupied slot into a freshly
    /// allocated, zero-initialized array. Leaves `self` untouched on
    /// failure (the new array is either fully built and swapped, or
    /// discarded entirely).
    fn grow(&mut self, allocator: &mut AllocatorState) -> TallyResult<()> {
        let new_capacity = self.capacity * 2;
        let new_bytes = new_capacity
            .checked_mul(mem::size_of::<Slot>())
            .ok_or_else(|| Error::new(ErrorKind::OutOfMemory))?;
        let new_raw = allocator.allocate(new_bytes)?;
        let new_mask = new_capacity - 1;
        {
            let new_slots = unsafe { slice::from_raw_parts_mut(new_raw.as_ptr() as *mut Slot, new_capacity) };
            for slot in self.as_slice().iter().filter(|s| s.is_occupied()) {
                let idx = Self::probe_empty(new_slots, new_mask, slot.hash)
                    .expect("load factor guarantees room in a doubled table");
                new_slots[idx] = *slot;
            }
        }
        let old_ptr = self.slots;
        let old_bytes = self.capacity * mem::size_of::<Slot>();
        self.slots = new_raw.cast();
        self.capacity = new_capacity;
        allocator.release(old_ptr.cast(), old_bytes);
        log::trace!(target: "tallycore::index", "grew hash index: {old_bytes} -> {new_bytes} bytes");
        Ok(())
    }

    /// Releases the slot array back to the allocator. Called exactly once,
    /// by the owning counter's `Drop` impl.
    pub fn release(&mut self, allocator: &mut AllocatorState) {
        let bytes = self.capacity * mem::size_of::<Slot>();
        allocator.release(self.slots.cast(), bytes);
    }

    /// Zeroes every slot in place and resets the occupied count, without
    /// touching capacity or talking to the allocator.
    pub fn clear(&mut self) {
        for slot in self.as_slice_mut() {
            *slot = Slot {
                key_ptr: None,
                key_len: 0,
                hash: 0,
                count: 0,
            };
        }
        self.unique = 0;
    }

    /// Visits every occupied slot as `(key_bytes, count)`.
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], u64)> {
        self.as_slice()
            .iter()
            .filter(|s| s.is_occupied())
            .map(|s| (s.key(), s.count))
    }

    /// Returns the occupied slot at or after `start`, along with its index
    /// (for the next call), or `None` past the end.
    pub fn next_occupied_from(&self, start: usize) -> Option<(usize, &[u8], u64)> {
        self.as_slice()[start..]
            .iter()
            .enumerate()
            .find(|(_, s)| s.is_occupied())
            .map(|(i, s)| (start + i, s.key(), s.count))
    }

    pub fn count_occupied(&self) -> usize {
        self.as_slice().iter().filter(|s| s.is_occupied()).count()
    }
}

enum Probe {
    Match(usize),
    Empty(usize),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::{hash_bytes, seeded_basis};

    fn fresh(capacity: usize) -> (AllocatorState, Arena, HashIndex) {
        let mut allocator = AllocatorState::new_heap(0);
        let arena = Arena::new(&mut allocator, 4096, false).unwrap();
        let index = HashIndex::new(&mut allocator, capacity).unwrap();
        (allocator, arena, index)
    }

    #[test]
    fn insert_new_then_existing() {
        let (mut allocator, mut arena, mut index) = fresh(16);
        let basis = seeded_basis(0);
        let h = hash_bytes(basis, b"hello");
        matches!(
            index.insert(&mut allocator, &mut arena, false, b"hello", h).unwrap(),
            InsertOutcome::New
        );
        matches!(
            index.insert(&mut allocator, &mut arena, false, b"hello", h).unwrap(),
            InsertOutcome::Existing
        );
        assert_eq!(index.unique(), 1);
        assert_eq!(index.iter().next().unwrap().1, 2);
    }

    #[test]
    fn grows_past_load_factor() {
        let (mut allocator, mut arena, mut index) = fresh(16);
        let basis = seeded_basis(0);
        for i in 0..12u32 {
            let word = format!("word{i}");
            let h = hash_bytes(basis, word.as_bytes());
            index
                .insert(&mut allocator, &mut arena, false, word.as_bytes(), h)
                .unwrap();
        }
        assert!(index.capacity() > 16);
        assert_eq!(index.unique(), 12);
        assert_eq!(index.count_occupied(), 12);
    }

    #[test]
    fn static_mode_fails_past_load_factor() {
        let mut buf = vec![0u8; 1 << 16];
        let base = NonNull::new(buf.as_mut_ptr()).unwrap();
        let mut allocator = AllocatorState::new_static(base, buf.len(), 0).unwrap();
        let mut arena = Arena::new(&mut allocator, 4096, true).unwrap();
        let mut index = HashIndex::new(&mut allocator, 16).unwrap();
        let basis = seeded_basis(0);
        let mut inserted = 0;
        for i in 0..20u32 {
            let word = format!("word{i}");
            let h = hash_bytes(basis, word.as_bytes());
            if index
                .insert(&mut allocator, &mut arena, true, word.as_bytes(), h)
                .is_ok()
            {
                inserted += 1;
            } else {
                break;
            }
        }
        assert!(inserted < 20);
        assert!((index.unique() * 10) < index.capacity() * 7);
    }

    #[test]
    fn distinct_length_collision_is_not_merged() {
        let (mut allocator, mut arena, mut index) = fresh(16);
        let basis = seeded_basis(0);
        let a = b"svhpy";
        let b = b"znycrycwqhztadbhsrdok";
        let ha = hash_bytes(basis, a);
        let hb = hash_bytes(basis, b);
        assert_eq!(ha, hb);
        index.insert(&mut allocator, &mut arena, false, a, ha).unwrap();
        index.insert(&mut allocator, &mut arena, false, b, hb).unwrap();
        assert_eq!(index.unique(), 2);
    }

    #[test]
    fn clear_resets_without_touching_capacity() {
        let (mut allocator, mut arena, mut index) = fresh(16);
        let basis = seeded_basis(0);
        let h = hash_bytes(basis, b"hello");
        index.insert(&mut allocator, &mut arena, false, b"hello", h).unwrap();
        let cap_before = index.capacity();
        index.clear();
        assert_eq!(index.unique(), 0);
        assert_eq!(index.capacity(), cap_before);
        assert_eq!(index.iter().count(), 0);
    }
}
