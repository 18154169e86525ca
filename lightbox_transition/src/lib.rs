// Copyright 2026 the Lightbox Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lightbox Transition: moving between a thumbnail and the viewer.
//!
//! - [`ZoomTransition`] animates a temporary image view between a thumbnail frame and the
//!   viewer's frame, over snapshots of the scenes involved. The host provides the views
//!   through [`TransitionStage`] and [`LargeViewProvider`].
//! - [`InteractiveDismissController`] carries progress and a transform from a live gesture to
//!   whoever is animating, and tells them once whether the gesture finished or was cancelled.
//! - [`DismissGestureTracker`] turns raw pan and pinch input into controller updates.
//! - [`TransitionCoordinator`] picks the right zoom for presentation, dismissal, push and pop.
//! - [`Animator`] is the tick-driven timing underneath it all.
//!
//! Nothing here owns a clock or a display. The host calls [`ZoomTransition::tick`] from its
//! frame callback and applies what the stage is told.
//!
//! ## Features
//!
//! - `serde`: derives `Serialize`/`Deserialize` for [`TransitionConfig`], [`AnimationOption`],
//!   [`ContentMode`] and [`DismissDirection`].

mod animator;
mod coordinator;
mod gesture;
mod interactive;
mod zoom;

pub use animator::{AnimationOption, Animator, AnimatorState, Curve};
pub use coordinator::{NavigationOperation, TransitionCoordinator, TransitionFactory};
pub use gesture::{
    DismissDirection, DismissGestureTracker, GesturePhase, GestureResponse, GestureSettings,
};
pub use interactive::{Continuation, DismissObserver, DismissOutcome, InteractiveDismissController};
pub use zoom::{
    AbortReason, ContentMode, LargeViewProvider, NavigationDelegateTransfer, SmallViewDescriptor,
    SnapshotLayer, TransitionConfig, TransitionDelegate, TransitionOutcome, TransitionPhase,
    TransitionStage, UserAnimation, ViewId, ZoomDirection, ZoomTransition,
};
