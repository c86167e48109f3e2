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

//! Process-global, immutable build configuration.
//!
//! The only process-global state in this crate: the build-info value below
//! and the static diagnostic strings in [`crate::error`]. Both are
//! read-only and thread-safe by construction (no interior mutability, no
//! lazy initialization).

/// Compile-time ceiling on `max_token_len`. Tokens are truncated to at most
/// this many bytes regardless of what a caller requests.
pub const MAX_TOKEN_CEILING: usize = 1024;

/// Floor applied to an explicitly requested `max_token_len`.
pub const MIN_TOKEN_LEN: usize = 4;

/// Default `max_token_len` used when the caller passes `0`.
pub const DEFAULT_TOKEN_LEN: usize = 64;

/// Floor on the hash index's initial capacity, regardless of budget.
pub const MIN_INIT_CAPACITY: usize = 16;

/// Floor on an arena block's size, regardless of budget.
pub const MIN_BLOCK_SIZE: usize = 256;

/// Semantic version of the core, as a literal.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Immutable, process-wide description of how this build of the core was
/// configured. Exposes exactly the compile-time constants a caller would
/// need to reason about tuning decisions made in [`crate::config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildInfo {
    pub version: &'static str,
    pub max_token_ceiling: usize,
    pub min_init_capacity: usize,
    pub min_block_size: usize,
    /// `true` when `scan` uses a per-call on-stack buffer (the
    /// `stack-scan-buffer` feature); `false` when it uses a per-counter
    /// heap buffer charged against the byte budget.
    pub stack_scan_buffer: bool,
    /// Bits in a pointer on the platform this was compiled for. Exposed so
    /// a caller can correlate with the capacity/block-size tuning tables
    /// in [`crate::config`], which are keyed off this value.
    pub pointer_width: u32,
    pub little_endian: bool,
}

const BUILD_INFO: BuildInfo = BuildInfo {
    version: VERSION,
    max_token_ceiling: MAX_TOKEN_CEILING,
    min_init_capacity: MIN_INIT_CAPACITY,
    min_block_size: MIN_BLOCK_SIZE,
    stack_scan_buffer: cfg!(feature = "stack-scan-buffer"),
    pointer_width: usize::BITS,
    little_endian: cfg!(target_endian = "little"),
};

/// Returns the immutable, process-wide build descriptor.
pub const fn build_info() -> &'static BuildInfo {
    &BUILD_INFO
}

/// Semantic version literal, matching the external-interface sketch's
/// `version_string()`.
pub const fn version_string() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ceiling_is_at_least_default() {
        assert!(MAX_TOKEN_CEILING >= DEFAULT_TOKEN_LEN);
        assert!(DEFAULT_TOKEN_LEN >= MIN_TOKEN_LEN);
    }

    #[test]
    fn build_info_is_self_consistent() {
        let info = build_info();
        assert_eq!(info.max_token_ceiling, MAX_TOKEN_CEILING);
        assert_eq!(info.pointer_width, usize::BITS);
    }
}
