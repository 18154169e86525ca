// Copyright 2026 the Lightbox Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Choosing a zoom transition for presentation, dismissal and navigation.
//!
//! The host's navigation machinery asks a [`TransitionCoordinator`] for an
//! animator whenever a scene is presented, dismissed, pushed or popped. The
//! coordinator asks the [`TransitionFactory`] for the scene that owns the
//! viewer end of the zoom and remembers the transition it got back, so the
//! host can also ask for the interactive controller of an outgoing zoom.

use std::fmt;
use std::sync::Weak;

use parking_lot::Mutex;

use crate::{InteractiveDismissController, ZoomDirection, ZoomTransition};

/// Builds transitions for scenes.
pub trait TransitionFactory<Scene: ?Sized>: Send + Sync {
    /// Returns the zoom for `scene` moving in `direction`, or `None` to let
    /// the host animate normally.
    fn build_transition(&self, direction: ZoomDirection, scene: &Scene) -> Option<ZoomTransition>;
}

/// A navigation stack change.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NavigationOperation {
    /// A scene was pushed.
    Push,
    /// A scene was popped.
    Pop,
    /// Anything else.
    None,
}

/// Hands out zoom transitions to the host.
///
/// The factory is held weakly; once it is gone every request yields `None`.
pub struct TransitionCoordinator<Scene: ?Sized> {
    factory: Weak<dyn TransitionFactory<Scene>>,
    active: Mutex<Option<ZoomTransition>>,
}

impl<Scene: ?Sized> TransitionCoordinator<Scene> {
    /// Creates a coordinator asking `factory` for transitions.
    pub fn new(factory: Weak<dyn TransitionFactory<Scene>>) -> Self {
        Self {
            factory,
            active: Mutex::new(None),
        }
    }

    /// Transition for presenting `presented`: it zooms in.
    pub fn presentation(&self, presented: &Scene) -> Option<ZoomTransition> {
        self.build(ZoomDirection::Incoming, presented)
    }

    /// Transition for dismissing `dismissed`: it zooms out.
    pub fn dismissal(&self, dismissed: &Scene) -> Option<ZoomTransition> {
        self.build(ZoomDirection::Outgoing, dismissed)
    }

    /// Transition for a navigation stack change from `from` to `to`.
    ///
    /// A push zooms `to` in, a pop zooms `from` out.
    pub fn navigation(
        &self,
        operation: NavigationOperation,
        from: &Scene,
        to: &Scene,
    ) -> Option<ZoomTransition> {
        match operation {
            NavigationOperation::Push => self.build(ZoomDirection::Incoming, to),
            NavigationOperation::Pop => self.build(ZoomDirection::Outgoing, from),
            NavigationOperation::None => None,
        }
    }

    /// Controller for driving `transition` interactively.
    ///
    /// Only outgoing transitions with a live gesture are interactive.
    pub fn interaction_for(
        &self,
        transition: &ZoomTransition,
    ) -> Option<InteractiveDismissController> {
        if transition.direction() != ZoomDirection::Outgoing {
            return None;
        }
        transition
            .interactive_controller()
            .or_else(|| transition.large_interactive_controller())
            .filter(InteractiveDismissController::is_live)
    }

    /// The last transition handed out that has not finished.
    pub fn active(&self) -> Option<ZoomTransition> {
        let mut active = self.active.lock();
        if active.as_ref().is_some_and(|t| t.outcome().is_some()) {
            *active = None;
        }
        active.clone()
    }

    fn build(&self, direction: ZoomDirection, scene: &Scene) -> Option<ZoomTransition> {
        let Some(factory) = self.factory.upgrade() else {
            tracing::debug!(?direction, "transition factory is gone");
            return None;
        };
        let transition = factory.build_transition(direction, scene)?;
        tracing::debug!(?direction, "zoom transition built");
        *self.active.lock() = Some(transition.clone());
        Some(transition)
    }
}

impl<Scene: ?Sized> fmt::Debug for TransitionCoordinator<Scene> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionCoordinator")
            .field("factory_alive", &(self.factory.strong_count() > 0))
            .field("active", &*self.active.lock())
            .finish()
    }
}
