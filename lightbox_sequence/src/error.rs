// Copyright 2026 the Lightbox Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use thiserror::Error;

/// Errors produced when resolving a [`PathAddress`](crate::PathAddress) against a sequence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequenceError {
    /// The address ended before reaching a resource.
    #[error("address ends at depth {depth}, but resources live at depth {expected}")]
    AddressTooShort {
        /// Depth at which the address ran out.
        depth: usize,
        /// Depth the sequence stores resources at.
        expected: usize,
    },
    /// The address continues past a resource.
    #[error("address has {extra} index(es) past a resource")]
    AddressTooLong {
        /// Number of unused trailing indices.
        extra: usize,
    },
    /// One segment of the address does not exist.
    #[error("index {index} out of bounds for length {len} at depth {depth}")]
    OutOfBounds {
        /// Offending index.
        index: usize,
        /// Length of the collection at that depth.
        len: usize,
        /// Zero-based depth of the offending segment.
        depth: usize,
    },
}
