// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors reported by the recorder.
//!
//! Most recording problems are not errors at all: non-finite input and
//! unbalanced restores are dropped silently. What remains is the arena running
//! out of memory and queries made while the bounds stack is still open.

use core::fmt;

/// Failure conditions surfaced by the op buffer, bounds accumulators and
/// record decoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplayListError {
    /// Growing the op arena (or its resource table) failed.
    ///
    /// The arena keeps every record written before the failed push.
    AllocationFailed {
        /// Bytes the failed push tried to reserve.
        requested: usize,
    },
    /// Bounds were requested while `depth` saves were still open.
    UnbalancedSave {
        /// Number of outstanding saves.
        depth: usize,
    },
    /// A record header at `offset` had an unknown type or an impossible size.
    Malformed {
        /// Byte offset of the bad record.
        offset: usize,
    },
}

impl fmt::Display for DisplayListError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllocationFailed { requested } => {
                write!(f, "op buffer allocation of {requested} bytes failed")
            }
            Self::UnbalancedSave { depth } => {
                write!(f, "bounds queried with {depth} unmatched save(s)")
            }
            Self::Malformed { offset } => write!(f, "malformed op record at byte {offset}"),
        }
    }
}

impl core::error::Error for DisplayListError {}
