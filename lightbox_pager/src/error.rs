// Copyright 2026 the Lightbox Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use lightbox_sequence::SequenceError;
use thiserror::Error;

/// Errors produced by a [`PageNavigator`](crate::PageNavigator).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigatorError {
    /// A viewer needs at least one resource.
    #[error("cannot page through an empty sequence")]
    EmptySequence,
    /// An address did not resolve.
    #[error(transparent)]
    Sequence(#[from] SequenceError),
    /// The resource is already being deleted.
    #[error("a deletion of this resource is already in flight")]
    AlreadyRemoving,
}
