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

//! Thin, panicking-on-logic-error wrappers over the raw global allocator.
//!
//! Mirrors the shape of a typical low-level `unsafe_apis` module: every
//! function here is `unsafe` and trusts its caller to have already checked
//! budgets and overflow (that's [`super::AllocatorState::allocate`]'s job).
//! This module only deals with `Layout` construction and the raw
//! zero-initialized `alloc`/`dealloc` calls.

use core::{alloc::Layout, ptr::NonNull};

/// Builds a `Layout` for `size` bytes at alignment `align`. Both must
/// already be known-valid (non-zero alignment, power of two, no overflow);
/// this is checked by the caller's budget arithmetic, not here.
#[inline(always)]
pub unsafe fn layout_for(size: usize, align: usize) -> Layout {
    Layout::from_size_align_unchecked(size, align)
}

/// Allocates `size` zero-initialized bytes at `align`.
///
/// ## Safety
/// `size` must be nonzero and `align` must be a nonzero power of two; the
/// resulting layout must not overflow `isize`.
#[inline]
pub unsafe fn alloc_zeroed(size: usize, align: usize) -> Option<NonNull<u8>> {
    let layout = layout_for(size, align);
    let ptr = std::alloc::alloc_zeroed(layout);
    NonNull::new(ptr)
}

/// Deallocates a region previously returned by [`alloc_zeroed`] with the
/// same `size`/`align`.
///
/// ## Safety
/// `ptr` must have been returned by [`alloc_zeroed`] with this exact
/// `size`/`align` and not yet deallocated.
#[inline]
pub unsafe fn dealloc(ptr: NonNull<u8>, size: usize, align: usize) {
    let layout = layout_for(size, align);
    std::alloc::dealloc(ptr.as_ptr(), layout)
}
