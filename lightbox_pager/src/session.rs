// Copyright 2026 the Lightbox Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Presentation state shared by everything inside one viewer.

use parking_lot::Mutex;

use lightbox_sequence::{ObserverList, Subscription};

use crate::{ImmersiveMode, ImmersiveModes, TapAction, ViewerOptions};

#[derive(Debug)]
struct SessionState {
    mode: ImmersiveMode,
    default_mode: ImmersiveMode,
    enabled: ImmersiveModes,
    tap_action: TapAction,
}

/// Immersive mode and tap behaviour for one viewer.
///
/// Whoever creates the viewer owns the session and passes it to the pieces
/// that need it. Observers hear about every mode change and re-query
/// [`mode`](Self::mode).
///
/// ```rust
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use lightbox_pager::{ImmersiveMode, ViewerOptions, ViewerSession};
///
/// let session = ViewerSession::new(&ViewerOptions::default());
/// let changes = Arc::new(AtomicUsize::new(0));
/// let seen = changes.clone();
/// let _subscription = session.observe(move || {
///     seen.fetch_add(1, Ordering::SeqCst);
/// });
///
/// session.toggle();
/// assert_eq!(session.mode(), ImmersiveMode::Immersive);
/// session.reset();
/// assert_eq!(session.mode(), ImmersiveMode::Normal);
/// assert_eq!(changes.load(Ordering::SeqCst), 2);
/// ```
#[derive(Debug)]
pub struct ViewerSession {
    state: Mutex<SessionState>,
    observers: ObserverList<()>,
}

impl ViewerSession {
    /// A session in the options' default mode.
    ///
    /// If the default mode is not enabled the session starts in the first
    /// enabled mode, or in [`ImmersiveMode::Normal`] when none is.
    pub fn new(options: &ViewerOptions) -> Self {
        let enabled = options.enabled_immersive_modes;
        let mode = [
            options.default_immersive_mode,
            ImmersiveMode::Normal,
            ImmersiveMode::Immersive,
        ]
        .into_iter()
        .find(|mode| enabled.allows(*mode))
        .unwrap_or_default();
        Self {
            state: Mutex::new(SessionState {
                mode,
                default_mode: options.default_immersive_mode,
                enabled,
                tap_action: options.view_tap_action,
            }),
            observers: ObserverList::new(),
        }
    }

    /// Current mode.
    pub fn mode(&self) -> ImmersiveMode {
        self.state.lock().mode
    }

    /// What a single tap does.
    pub fn tap_action(&self) -> TapAction {
        self.state.lock().tap_action
    }

    /// Changes what a single tap does.
    pub fn set_tap_action(&self, action: TapAction) {
        self.state.lock().tap_action = action;
    }

    /// Modes the session may enter.
    pub fn enabled_modes(&self) -> ImmersiveModes {
        self.state.lock().enabled
    }

    /// Restricts the modes the session may enter. The current mode is kept.
    pub fn set_enabled_modes(&self, enabled: ImmersiveModes) {
        self.state.lock().enabled = enabled;
    }

    /// Switches to the other mode if it is enabled.
    ///
    /// Returns `true` if the mode changed.
    pub fn toggle(&self) -> bool {
        let target = self.mode().toggled();
        self.set(target)
    }

    /// Switches to `mode` if it is enabled.
    pub fn force(&self, mode: ImmersiveMode) -> bool {
        self.set(mode)
    }

    /// Returns to the default mode if it is enabled.
    pub fn reset(&self) -> bool {
        let target = self.state.lock().default_mode;
        self.set(target)
    }

    /// Calls `callback` after every mode change until the subscription is dropped.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn observe(&self, callback: impl Fn() + Send + Sync + 'static) -> Subscription {
        self.observers.subscribe(move |_: &()| callback())
    }

    fn set(&self, mode: ImmersiveMode) -> bool {
        {
            let mut state = self.state.lock();
            if !state.enabled.allows(mode) {
                tracing::debug!(?mode, "immersive mode not enabled");
                return false;
            }
            if state.mode == mode {
                return false;
            }
            state.mode = mode;
        }
        tracing::debug!(?mode, "immersive mode changed");
        self.observers.notify(&());
        true
    }
}

impl Default for ViewerSession {
    fn default() -> Self {
        Self::new(&ViewerOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn disabled_modes_are_never_entered() {
        let options = ViewerOptions {
            enabled_immersive_modes: ImmersiveModes::NORMAL,
            ..ViewerOptions::default()
        };
        let session = ViewerSession::new(&options);
        assert!(!session.toggle());
        assert!(!session.force(ImmersiveMode::Immersive));
        assert_eq!(session.mode(), ImmersiveMode::Normal);
    }

    #[test]
    fn start_falls_back_when_the_default_is_disabled() {
        let options = ViewerOptions {
            default_immersive_mode: ImmersiveMode::Normal,
            enabled_immersive_modes: ImmersiveModes::IMMERSIVE,
            ..ViewerOptions::default()
        };
        let session = ViewerSession::new(&options);
        assert_eq!(session.mode(), ImmersiveMode::Immersive);
        assert!(!session.reset());
    }

    #[test]
    fn observers_hear_only_real_changes() {
        let session = ViewerSession::default();
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();
        let subscription = session.observe(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        assert!(!session.force(ImmersiveMode::Normal));
        assert!(session.force(ImmersiveMode::Immersive));
        assert!(session.toggle());
        drop(subscription);
        assert!(session.toggle());
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
