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

//! Construction-time configuration and the parameter-tuning rules that
//! turn a (possibly all-zero) [`CounterConfig`] into concrete capacity,
//! block-size and budget numbers.

use crate::build_info::{DEFAULT_TOKEN_LEN, MAX_TOKEN_CEILING, MIN_BLOCK_SIZE, MIN_INIT_CAPACITY, MIN_TOKEN_LEN};

cfg_if::cfg_if! {
    if #[cfg(target_pointer_width = "16")] {
        const PLATFORM_DEFAULT_CAPACITY: usize = 128;
        const PLATFORM_DEFAULT_BLOCK_SIZE: usize = 1024;
    } else if #[cfg(target_pointer_width = "32")] {
        const PLATFORM_DEFAULT_CAPACITY: usize = 1024;
        const PLATFORM_DEFAULT_BLOCK_SIZE: usize = 16384;
    } else {
        const PLATFORM_DEFAULT_CAPACITY: usize = 4096;
        const PLATFORM_DEFAULT_BLOCK_SIZE: usize = 65536;
    }
}

/// Construction-time configuration. Every field's zero value requests a
/// derived default, matching the external-interface sketch's wire shape,
/// except that `static_region_pointer`/`static_region_size` there collapse
/// into a single borrowed slice here, since a Rust slice already carries
/// its own length and there's no pointer/length pair to let fall out of
/// sync.
#[derive(Default)]
pub struct CounterConfig<'a> {
    /// `0` means unlimited.
    pub byte_budget: usize,
    /// `0` means derive from the platform default and the budget.
    pub initial_capacity: usize,
    /// `0` means derive from the platform default and the budget.
    pub block_size: usize,
    /// `Some` puts the counter in static mode, bump-allocating out of this
    /// caller-owned region for the counter's lifetime.
    pub static_region: Option<&'a mut [u8]>,
    /// `0` reproduces the unseeded FNV-1a basis.
    pub hash_seed: u32,
}

impl<'a> CounterConfig<'a> {
    pub fn builder() -> CounterConfigBuilder<'a> {
        CounterConfigBuilder::default()
    }
}

/// Fluent builder for [`CounterConfig`]. Most invalid combinations are
/// actually unreachable once the inputs are numeric (every field is
/// already well-typed and zero-defaults cleanly), so `build` is infallible;
/// it exists to give construction call sites field names instead of a
/// positional argument list.
#[derive(Default)]
pub struct CounterConfigBuilder<'a> {
    inner: CounterConfig<'a>,
}

impl<'a> CounterConfigBuilder<'a> {
    pub fn byte_budget(mut self, n: usize) -> Self {
        self.inner.byte_budget = n;
        self
    }
    pub fn initial_capacity(mut self, n: usize) -> Self {
        self.inner.initial_capacity = n;
        self
    }
    pub fn block_size(mut self, n: usize) -> Self {
        self.inner.block_size = n;
        self
    }
    pub fn static_region(mut self, region: &'a mut [u8]) -> Self {
        self.inner.static_region = Some(region);
        self
    }
    pub fn hash_seed(mut self, seed: u32) -> Self {
        self.inner.hash_seed = seed;
        self
    }
    pub fn build(self) -> CounterConfig<'a> {
        self.inner
    }
}

/// The fully-derived, concrete parameters construction proceeds with.
#[derive(Debug, Clone, Copy)]
pub struct Tuning {
    pub max_token_len: usize,
    pub capacity: usize,
    pub block_size: usize,
    pub effective_budget: usize,
}

#[inline]
fn floor_pow2(n: usize) -> usize {
    if n <= 1 {
        1
    } else {
        1usize << (usize::BITS - 1 - n.leading_zeros())
    }
}

/// `max_token_len = clamp(requested_or_default, MIN_TOKEN_LEN, MAX_TOKEN_CEILING)`.
pub fn clamp_token_len(requested: usize) -> usize {
    let base = if requested == 0 { DEFAULT_TOKEN_LEN } else { requested };
    base.clamp(MIN_TOKEN_LEN, MAX_TOKEN_CEILING)
}

/// `min(byte_budget, static_region_size)` when both are nonzero, else
/// whichever is nonzero, else `0` (unlimited).
pub fn effective_budget(byte_budget: usize, static_region_size: Option<usize>) -> usize {
    match (byte_budget, static_region_size) {
        (0, None) => 0,
        (0, Some(s)) => s,
        (b, None) => b,
        (b, Some(s)) if b == 0 || s == 0 => b.max(s),
        (b, Some(s)) => b.min(s),
    }
}

/// Derives the full concrete parameter set for construction.
pub fn derive_tuning(
    requested_token_len: usize,
    requested_capacity: usize,
    requested_block_size: usize,
    byte_budget: usize,
    static_region_size: Option<usize>,
    slot_size: usize,
) -> Tuning {
    let max_token_len = clamp_token_len(requested_token_len);
    let effective_budget = self::effective_budget(byte_budget, static_region_size);

    let mut capacity = if requested_capacity == 0 {
        PLATFORM_DEFAULT_CAPACITY
    } else {
        requested_capacity
    };

    let table_budget = if effective_budget > 0 { effective_budget / 2 } else { 0 };
    if effective_budget > 0 && slot_size > 0 {
        let table_bytes = capacity.saturating_mul(slot_size);
        if table_bytes > table_budget {
            let max_capacity = (table_budget / slot_size).max(1);
            capacity = floor_pow2(max_capacity);
        }
    }
    capacity = capacity.max(MIN_INIT_CAPACITY).next_power_of_two();

    let mut block_size = if requested_block_size == 0 {
        PLATFORM_DEFAULT_BLOCK_SIZE
    } else {
        requested_block_size
    };
    if effective_budget > 0 {
        let remaining = effective_budget.saturating_sub(table_budget);
        let cap = remaining / 4;
        block_size = block_size.min(cap);
    }
    block_size = block_size.max(MIN_BLOCK_SIZE);
    block_size = block_size.max(max_token_len + 1);

    log::debug!(
        target: "tallycore::config",
        "tuned: max_token_len={max_token_len} capacity={capacity} block_size={block_size} effective_budget={effective_budget}"
    );

    Tuning {
        max_token_len,
        capacity,
        block_size,
        effective_budget,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_len_clamps_both_ends() {
        assert_eq!(clamp_token_len(0), DEFAULT_TOKEN_LEN);
        assert_eq!(clamp_token_len(1), MIN_TOKEN_LEN);
        assert_eq!(clamp_token_len(MAX_TOKEN_CEILING + 1000), MAX_TOKEN_CEILING);
        assert_eq!(clamp_token_len(8), 8);
    }

    #[test]
    fn effective_budget_takes_the_min_when_both_set() {
        assert_eq!(effective_budget(100, Some(50)), 50);
        assert_eq!(effective_budget(0, Some(50)), 50);
        assert_eq!(effective_budget(100, None), 100);
        assert_eq!(effective_budget(0, None), 0);
    }

    #[test]
    fn capacity_floors_at_minimum_under_tiny_budget() {
        let t = derive_tuning(0, 0, 0, 64, None, 16);
        assert!(t.capacity.is_power_of_two());
        assert!(t.capacity >= MIN_INIT_CAPACITY);
    }

    #[test]
    fn block_size_is_never_smaller_than_one_full_token() {
        let t = derive_tuning(900, 0, 0, 512, None, 16);
        assert!(t.block_size >= t.max_token_len + 1);
    }

    #[test]
    fn builder_round_trips_fields() {
        let cfg = CounterConfig::builder().byte_budget(4096).hash_seed(7).build();
        assert_eq!(cfg.byte_budget, 4096);
        assert_eq!(cfg.hash_seed, 7);
        assert!(cfg.static_region.is_none());
    }
}
