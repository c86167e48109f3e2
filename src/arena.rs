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

//! A chain of zero-initialized blocks that bump-allocates NUL-terminated
//! copies of token bytes.
//!
//! Tokens are pinned to their block for the arena's lifetime: there is no
//! reuse or compaction. That's what lets [`crate::enumerate::Snapshot`] and
//! [`crate::enumerate::Cursor`] hand back borrowed pointers safely.

use crate::{
    alloc::{AllocatorState, STRICT_ALIGN},
    error::{Error, ErrorKind, TallyResult},
};
use core::ptr::NonNull;

struct ArenaBlock {
    ptr: NonNull<u8>,
    cap: usize,
    cursor: usize,
}

impl ArenaBlock {
    #[inline(always)]
    fn remaining(&self) -> usize {
        self.cap - self.cursor
    }
}

pub struct Arena {
    blocks: Vec<ArenaBlock>,
    first_block_size: usize,
    is_static: bool,
}

impl Arena {
    /// Allocates the first block immediately, so construction-time failure
    /// is reported at `Arena::new` rather than on the first `copy_bytes`.
    pub fn new(
        allocator: &mut AllocatorState,
        first_block_size: usize,
        is_static: bool,
    ) -> TallyResult<Self> {
        let ptr = allocator.allocate(first_block_size)?;
        Ok(Self {
            blocks: vec![ArenaBlock {
                ptr,
                cap: first_block_size,
                cursor: 0,
            }],
            first_block_size,
            is_static,
        })
    }

    /// Copies `bytes` plus a trailing NUL into arena-owned storage,
    /// returning a pointer to the first byte of the copy.
    ///
    /// The returned pointer is valid for as long as this arena is not
    /// dropped (enforced by borrowing through [`crate::counter::Counter`]'s
    /// lifetime, not by this type).
    pub fn copy_bytes(
        &mut self,
        allocator: &mut AllocatorState,
        bytes: &[u8],
    ) -> TallyResult<NonNull<u8>> {
        let required = bytes
            .len()
            .checked_add(1)
            .ok_or_else(|| Error::new(ErrorKind::OutOfMemory))?;
        if self
            .blocks
            .last()
            .map(|b| b.remaining() >= required)
            .unwrap_or(false)
        {
            let block = self.blocks.last_mut().unwrap();
            return Ok(unsafe { Self::bump_write(block, bytes) });
        }
        if self.is_static {
            // In static mode no second block is ever attempted.
            return Err(Error::new(ErrorKind::OutOfMemory));
        }
        let new_cap = core::cmp::max(
            self.first_block_size,
            required
                .checked_add(STRICT_ALIGN)
                .ok_or_else(|| Error::new(ErrorKind::OutOfMemory))?,
        );
        let ptr = allocator.allocate(new_cap)?;
        self.blocks.push(ArenaBlock {
            ptr,
            cap: new_cap,
            cursor: 0,
        });
        log::trace!(target: "tallycore::arena", "grew arena: new block of {new_cap} bytes");
        let block = self.blocks.last_mut().unwrap();
        Ok(unsafe { Self::bump_write(block, bytes) })
    }

    /// ## Safety
    /// `block.remaining() >= bytes.len() + 1` must hold; the byte
    /// immediately following the copy relies on the block having been
    /// zero-initialized (by the allocator) and never overwritten, so it
    /// reads back as the NUL terminator.
    unsafe fn bump_write(block: &mut ArenaBlock, bytes: &[u8]) -> NonNull<u8> {
        let dst = block.ptr.as_ptr().add(block.cursor);
        core::ptr::copy_nonoverlapping(bytes.as_ptr(), dst, bytes.len());
        block.cursor += bytes.len() + 1;
        NonNull::new_unchecked(dst)
    }

    /// Releases every block back to the allocator. Called exactly once, by
    /// the owning counter's `Drop` impl.
    pub fn release(&mut self, allocator: &mut AllocatorState) {
        for block in self.blocks.drain(..) {
            allocator.release(block.ptr, block.cap);
        }
    }

    /// Resets the arena to empty without returning the first block to the
    /// allocator, so a subsequent `copy_bytes` doesn't have to reallocate
    /// it. Any additional blocks grown beyond the first are released.
    pub fn clear(&mut self, allocator: &mut AllocatorState) {
        if self.blocks.len() > 1 {
            let first = self.blocks.remove(0);
            for extra in self.blocks.drain(..) {
                allocator.release(extra.ptr, extra.cap);
            }
            self.blocks.push(first);
        }
        if let Some(block) = self.blocks.first_mut() {
            unsafe {
                core::ptr::write_bytes(block.ptr.as_ptr(), 0, block.cursor);
            }
            block.cursor = 0;
        }
    }

    #[cfg(test)]
    fn block_count(&self) -> usize {
        self.blocks.len()
    }
}
