// Copyright 2026 the Lightbox Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bridges a live dismissal gesture into a running transition.
//!
//! The gesture side calls [`InteractiveDismissController::update`] and
//! [`InteractiveDismissController::set_transform`] as touches move, then
//! exactly one of [`finish`](InteractiveDismissController::finish) or
//! [`cancel`](InteractiveDismissController::cancel). The transition side
//! attaches a [`DismissObserver`] and a continuation.
//!
//! ## Delivery rules
//!
//! - Values are delivered in the order they are set. If a new value arrives
//!   while the observer is still handling an older one, only the newest value
//!   of each kind is delivered next.
//! - Updates after the gesture has resolved are dropped.
//! - The continuation runs exactly once: immediately when the outcome is
//!   decided, or when it is installed if the outcome was decided first.
//! - Resolving the gesture releases the observer.

use std::fmt;
use std::sync::Arc;

use kurbo::Affine;
use parking_lot::Mutex;

/// How a dismissal gesture ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DismissOutcome {
    /// The user confirmed the dismissal.
    Finished,
    /// The user backed out; the content returns to where it was.
    Cancelled,
}

/// Receives live gesture values.
pub trait DismissObserver: Send + Sync {
    /// Progress changed; always within `[0, 1]`.
    fn progress_changed(&self, progress: f64);
    /// The provisional transform of the moving content changed.
    fn transform_changed(&self, transform: Affine);
}

/// Runs the rest of the animation once the gesture ends.
///
/// Receives the outcome and the progress at the moment the gesture ended.
pub type Continuation = Box<dyn FnOnce(DismissOutcome, f64) + Send>;

#[derive(Default)]
struct Pending {
    progress: Option<f64>,
    transform: Option<Affine>,
}

impl Pending {
    fn is_empty(&self) -> bool {
        self.progress.is_none() && self.transform.is_none()
    }
}

struct ControllerState {
    progress: f64,
    transform: Affine,
    outcome: Option<DismissOutcome>,
    continuation: Option<Continuation>,
    continued: bool,
    observer: Option<Arc<dyn DismissObserver>>,
    delivering: bool,
    pending: Pending,
}

/// Tracks a live dismissal gesture.
///
/// Cheap to clone; clones share state.
///
/// ```rust
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use lightbox_transition::{DismissOutcome, InteractiveDismissController};
///
/// let controller = InteractiveDismissController::new();
/// controller.update(1.4);
/// assert_eq!(controller.progress(), 1.0);
///
/// let ran = Arc::new(AtomicBool::new(false));
/// let flag = ran.clone();
/// controller.set_continuation(Box::new(move |outcome, progress| {
///     assert_eq!(outcome, DismissOutcome::Cancelled);
///     assert_eq!(progress, 1.0);
///     flag.store(true, Ordering::SeqCst);
/// }));
///
/// assert!(controller.cancel());
/// assert!(ran.load(Ordering::SeqCst));
/// assert!(!controller.finish());
/// assert!(!controller.update(0.2));
/// ```
#[derive(Clone)]
pub struct InteractiveDismissController {
    state: Arc<Mutex<ControllerState>>,
}

impl InteractiveDismissController {
    /// Creates a live controller with zero progress and an identity transform.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ControllerState {
                progress: 0.0,
                transform: Affine::IDENTITY,
                outcome: None,
                continuation: None,
                continued: false,
                observer: None,
                delivering: false,
                pending: Pending::default(),
            })),
        }
    }

    /// Latest progress, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        self.state.lock().progress
    }

    /// Latest provisional transform.
    pub fn transform(&self) -> Affine {
        self.state.lock().transform
    }

    /// The outcome, once the gesture has ended.
    pub fn outcome(&self) -> Option<DismissOutcome> {
        self.state.lock().outcome
    }

    /// Returns `true` until the gesture ends.
    pub fn is_live(&self) -> bool {
        self.state.lock().outcome.is_none()
    }

    /// Returns `true` if both handles refer to the same controller.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    /// Sets the progress, clamped to `[0, 1]`.
    ///
    /// Returns `false`, without notifying anyone, once the gesture has ended.
    pub fn update(&self, progress: f64) -> bool {
        let progress = if progress.is_nan() { 0.0 } else { progress.clamp(0.0, 1.0) };
        {
            let mut state = self.state.lock();
            if state.outcome.is_some() {
                tracing::trace!(progress, "dropping progress after the gesture ended");
                return false;
            }
            state.progress = progress;
            state.pending.progress = Some(progress);
        }
        self.deliver();
        true
    }

    /// Sets the provisional transform of the moving content.
    ///
    /// Returns `false`, without notifying anyone, once the gesture has ended.
    pub fn set_transform(&self, transform: Affine) -> bool {
        {
            let mut state = self.state.lock();
            if state.outcome.is_some() {
                tracing::trace!("dropping transform after the gesture ended");
                return false;
            }
            state.transform = transform;
            state.pending.transform = Some(transform);
        }
        self.deliver();
        true
    }

    /// Ends the gesture as confirmed.
    ///
    /// Returns `false` if the gesture had already ended.
    pub fn finish(&self) -> bool {
        self.resolve(DismissOutcome::Finished)
    }

    /// Ends the gesture as cancelled.
    ///
    /// Returns `false` if the gesture had already ended.
    pub fn cancel(&self) -> bool {
        self.resolve(DismissOutcome::Cancelled)
    }

    /// Installs the observer that receives live values, replacing any previous one.
    ///
    /// Ignored once the gesture has ended.
    pub fn attach_observer(&self, observer: Arc<dyn DismissObserver>) {
        let mut state = self.state.lock();
        if state.outcome.is_none() {
            state.observer = Some(observer);
        }
    }

    /// Installs the continuation.
    ///
    /// If the gesture has already ended and no continuation has run, it runs
    /// right away. A continuation installed after one has run is dropped.
    pub fn set_continuation(&self, continuation: Continuation) {
        let (outcome, progress) = {
            let mut state = self.state.lock();
            if state.continued {
                tracing::debug!("continuation already ran; dropping the new one");
                return;
            }
            match state.outcome {
                Some(outcome) => {
                    state.continued = true;
                    (outcome, state.progress)
                }
                None => {
                    state.continuation = Some(continuation);
                    return;
                }
            }
        };
        continuation(outcome, progress);
    }

    fn resolve(&self, outcome: DismissOutcome) -> bool {
        let (run, progress, released) = {
            let mut state = self.state.lock();
            if state.outcome.is_some() {
                return false;
            }
            state.outcome = Some(outcome);
            state.pending = Pending::default();
            let released = state.observer.take();
            let run = if state.continued {
                None
            } else {
                let run = state.continuation.take();
                state.continued = run.is_some();
                run
            };
            (run, state.progress, released)
        };
        drop(released);
        tracing::debug!(?outcome, progress, "dismissal gesture resolved");
        if let Some(run) = run {
            run(outcome, progress);
        }
        true
    }

    fn deliver(&self) {
        {
            let mut state = self.state.lock();
            if state.delivering {
                return;
            }
            state.delivering = true;
        }
        loop {
            let (observer, batch) = {
                let mut state = self.state.lock();
                let batch = core::mem::take(&mut state.pending);
                if batch.is_empty() || state.outcome.is_some() {
                    state.delivering = false;
                    return;
                }
                (state.observer.clone(), batch)
            };
            let Some(observer) = observer else {
                continue;
            };
            if let Some(transform) = batch.transform {
                observer.transform_changed(transform);
            }
            if let Some(progress) = batch.progress {
                observer.progress_changed(progress);
            }
        }
    }
}

impl Default for InteractiveDismissController {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for InteractiveDismissController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("InteractiveDismissController")
            .field("progress", &state.progress)
            .field("transform", &state.transform)
            .field("outcome", &state.outcome)
            .field("observer", &state.observer.is_some())
            .field("continued", &state.continued)
            .finish_non_exhaustive()
    }
}
