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

//! `tallycore`: an embeddable, bounded-memory word-frequency counter.
//!
//! Ingests byte streams, extracts ASCII-letter tokens, and maintains
//! per-token occurrence counts under a strict memory budget: in dynamic
//! mode (backed by the global allocator) or static mode (bump-allocated out
//! of a caller-supplied fixed region, for use without a general-purpose
//! allocator). See [`Counter`] for the main entry point.
//!
//! ```
//! use tallycore::Counter;
//!
//! let mut counter = Counter::open(0).unwrap();
//! counter.scan(b"the quick brown fox the lazy dog the").unwrap();
//! assert_eq!(counter.total(), 8);
//! assert_eq!(counter.unique(), 6);
//! let snapshot = counter.snapshot().unwrap();
//! assert_eq!(snapshot.entries()[0].0, &b"the"[..]);
//! ```

pub mod alloc;
pub mod arena;
pub mod build_info;
pub mod config;
pub mod counter;
pub mod enumerate;
pub mod error;
pub mod hash;
pub mod index;
pub mod scanner;

pub use build_info::{build_info, version_string, BuildInfo};
pub use config::{CounterConfig, CounterConfigBuilder};
pub use counter::Counter;
pub use enumerate::{Cursor, Snapshot};
pub use error::{error_string, Error, ErrorKind, TallyResult};
