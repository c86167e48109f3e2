/*
 * This file is a part of tallycore.
 *
 * tallycore is a bounded-memory, embeddable word-frequency counter: it
 * ingests byte streams, tokenizes them into case-folded words, and tracks
 * per-word counts under a caller-chosen memory budget, in either a
 * dynamically growing heap-backed mode or a fixed-capacity static mode
 * suitable for allocator-free environments.
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

//! A two-mode bump/heap allocator with overflow-checked accounting and
//! alignment enforcement.
//!
//! The contract is a small trait-shaped pair of operations,
//! [`AllocatorState::allocate`] and [`AllocatorState::release`], kept as an
//! enum rather than a `dyn Trait` because dispatch happens on every
//! allocation and both variants share almost all of their bookkeeping.

pub mod unsafe_apis;

use crate::error::{Error, ErrorKind, TallyResult};
use core::{mem, ptr::NonNull};

/// Strictest alignment required internally: the widest of pointer-size,
/// `usize`, and the widest integer type the core uses (`u64`). Every
/// allocator-produced region is aligned to this value.
pub const STRICT_ALIGN: usize = strict_align();

const fn strict_align() -> usize {
    let p = mem::align_of::<*const u8>();
    let u = mem::align_of::<usize>();
    let w = mem::align_of::<u64>();
    let m = if p > u { p } else { u };
    if m > w {
        m
    } else {
        w
    }
}

/// Dynamic-mode bookkeeping: a thin wrapper around the global allocator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapState {
    bytes_used: usize,
    /// `0` means unlimited.
    bytes_limit: usize,
}

/// Static-mode bookkeeping: a bump pointer into a caller-supplied region.
///
/// Does not own the region; the borrow is enforced by the lifetime on
/// [`crate::counter::Counter`], not by this type (which only ever sees a
/// raw pointer so that the dry-run precheck can cheaply clone it).
#[derive(Debug, Clone, Copy)]
pub struct StaticState {
    base: NonNull<u8>,
    region_size: usize,
    region_used: usize,
    bytes_used: usize,
    /// `0` means "no cap beyond the region itself".
    bytes_limit: usize,
}

/// The allocator's mode-tagged state. Mode is fixed at construction and
/// immutable for the object's lifetime.
#[derive(Debug, Clone, Copy)]
pub enum AllocatorState {
    Heap(HeapState),
    Static(StaticState),
}

impl AllocatorState {
    pub fn new_heap(bytes_limit: usize) -> Self {
        AllocatorState::Heap(HeapState {
            bytes_used: 0,
            bytes_limit,
        })
    }

    /// ## Errors
    /// Returns [`ErrorKind::InvalidArg`] if `base` is misaligned to
    /// [`STRICT_ALIGN`].
    pub fn new_static(base: NonNull<u8>, region_size: usize, bytes_limit: usize) -> TallyResult<Self> {
        if (base.as_ptr() as usize) % STRICT_ALIGN != 0 {
            return Err(Error::new(ErrorKind::InvalidArg));
        }
        Ok(AllocatorState::Static(StaticState {
            base,
            region_size,
            region_used: 0,
            bytes_used: 0,
            bytes_limit,
        }))
    }

    pub fn bytes_used(&self) -> usize {
        match self {
            AllocatorState::Heap(h) => h.bytes_used,
            AllocatorState::Static(s) => s.bytes_used,
        }
    }

    pub fn is_static(&self) -> bool {
        matches!(self, AllocatorState::Static(_))
    }

    /// Allocates `n` zero-initialized, [`STRICT_ALIGN`]-aligned bytes, or
    /// fails with [`ErrorKind::OutOfMemory`]. Side-effect-free on failure.
    pub fn allocate(&mut self, n: usize) -> TallyResult<NonNull<u8>> {
        if n == 0 {
            return Err(Error::new(ErrorKind::OutOfMemory));
        }
        match self {
            AllocatorState::Heap(h) => {
                let new_used = h
                    .bytes_used
                    .checked_add(n)
                    .ok_or_else(|| Error::new(ErrorKind::OutOfMemory))?;
                if h.bytes_limit != 0 && new_used > h.bytes_limit {
                    return Err(Error::new(ErrorKind::OutOfMemory));
                }
                let ptr = unsafe {
                    // SAFETY: n != 0, STRICT_ALIGN is a nonzero power of two
                    unsafe_apis::alloc_zeroed(n, STRICT_ALIGN)
                }
                .ok_or_else(|| Error::new(ErrorKind::OutOfMemory))?;
                h.bytes_used = new_used;
                Ok(ptr)
            }
            AllocatorState::Static(s) => {
                let align = STRICT_ALIGN;
                let misalignment = s.region_used % align;
                let padding = if misalignment == 0 {
                    0
                } else {
                    align - misalignment
                };
                let region_after_padding = s
                    .region_used
                    .checked_add(padding)
                    .ok_or_else(|| Error::new(ErrorKind::OutOfMemory))?;
                let region_after_alloc = region_after_padding
                    .checked_add(n)
                    .ok_or_else(|| Error::new(ErrorKind::OutOfMemory))?;
                if region_after_alloc > s.region_size {
                    return Err(Error::new(ErrorKind::OutOfMemory));
                }
                let bytes_after_alloc = s
                    .bytes_used
                    .checked_add(padding)
                    .and_then(|v| v.checked_add(n))
                    .ok_or_else(|| Error::new(ErrorKind::OutOfMemory))?;
                if s.bytes_limit != 0 && bytes_after_alloc > s.bytes_limit {
                    return Err(Error::new(ErrorKind::OutOfMemory));
                }
                let offset = region_after_padding - n; // == region_used + padding
                let ptr = unsafe {
                    // SAFETY: offset + n <= region_size, which was itself
                    // validated against the base pointer at construction.
                    NonNull::new_unchecked(s.base.as_ptr().add(offset))
                };
                unsafe {
                    core::ptr::write_bytes(ptr.as_ptr(), 0, n);
                }
                s.region_used = region_after_alloc;
                s.bytes_used = bytes_after_alloc;
                Ok(ptr)
            }
        }
    }

    /// Releases a region previously returned by [`Self::allocate`] with the
    /// same `n`. A no-op in static mode. Saturates `bytes_used` at zero in
    /// dynamic mode.
    pub fn release(&mut self, ptr: NonNull<u8>, n: usize) {
        match self {
            AllocatorState::Heap(h) => {
                if n == 0 {
                    return;
                }
                unsafe {
                    // SAFETY: caller contract (same ptr/len as `allocate`)
                    unsafe_apis::dealloc(ptr, n, STRICT_ALIGN);
                }
                h.bytes_used = h.bytes_used.saturating_sub(n);
            }
            AllocatorState::Static(_) => {}
        }
    }
}
