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

//! Error taxonomy for the counter core.
//!
//! Errors are returned, never logged and never thrown, by any public entry
//! point. Every kind has a single, static diagnostic string (see
//! [`ErrorKind::as_str`]) so callers embedding this in a constrained runtime
//! never need to format a message at the error site.

use core::fmt;

/// The three ways a core operation can fail to complete as requested.
///
/// `Ok` is not a variant here: fallible operations return `Result<T,
/// Error>`, so success is the `Ok(T)` arm of that `Result`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ErrorKind {
    /// A null/absent required argument, an empty key where one was
    /// required, or internally detected corruption (distinct slot count
    /// disagrees with `unique`).
    InvalidArg,
    /// The allocator returned a failure, a size computation overflowed, or
    /// a byte/region budget was exhausted.
    OutOfMemory,
    /// A post-condition that must always hold did not (e.g. the occupied
    /// slot count disagreed with `unique` during a snapshot walk).
    InvariantViolation,
}

impl ErrorKind {
    /// Static diagnostic string for this kind. Stable across releases.
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidArg => "invalid argument",
            ErrorKind::OutOfMemory => "out of memory",
            ErrorKind::InvariantViolation => "invariant violation",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The error type returned by every fallible core operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Error(ErrorKind);

impl Error {
    pub const fn new(kind: ErrorKind) -> Self {
        Self(kind)
    }
    pub const fn kind(self) -> ErrorKind {
        self.0
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for Error {}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

/// Shorthand used throughout the crate.
pub type TallyResult<T> = Result<T, Error>;

/// Public, stable accessor matching the external-interface sketch's
/// `error_string(code)`.
pub const fn error_string(kind: ErrorKind) -> &'static str {
    kind.as_str()
}
