// Copyright 2026 the Lightbox Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The snapshot-based zoom transition between a thumbnail and the viewer.
//!
//! A [`ZoomTransition`] moves a temporary image view between a *small* frame
//! (a thumbnail, described by [`SmallViewDescriptor`]) and the *large* frame
//! of the viewer (queried from a [`LargeViewProvider`]). The host supplies a
//! [`TransitionStage`] that owns real views and snapshots; the transition only
//! tells it what to add, move, fade and remove.
//!
//! ## Phases
//!
//! ```text
//! Idle → Preparing → AnimatingDiscrete ─────┐
//!                  → AnimatingInteractive ──┴→ Committing | Reversing → Finished
//! ```
//!
//! Any missing prerequisite while preparing aborts straight to
//! [`TransitionPhase::Finished`]: every temporary view created so far is
//! removed, the real content is shown again and the delegate hears
//! `completed = false`.
//!
//! ## Layering
//!
//! An outgoing transition stacks, bottom to top: the destination snapshot,
//! the source page snapshot, the moving image view, and the source chrome
//! snapshot. The two source snapshots fade out as progress grows.
//!
//! ## Callbacks
//!
//! State changes are computed under the transition's lock; delegate and
//! navigation callbacks are dispatched afterwards, so a delegate may query the
//! transition freely. Stages and providers are called with the lock held and
//! must not call back into the transition.

use core::time::Duration;
use std::fmt;
use std::sync::{Arc, Weak};

use kurbo::{Affine, Rect};
use lightbox_sequence::MediaResource;
use parking_lot::Mutex;
use thiserror::Error;

use crate::{
    AnimationOption, Animator, DismissObserver, DismissOutcome, InteractiveDismissController,
};

/// Host handle for a view created on a [`TransitionStage`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ViewId(pub u64);

/// How an image is fitted into its frame.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ContentMode {
    /// Letterboxed, whole image visible.
    #[default]
    AspectFit,
    /// Cropped to cover the frame.
    AspectFill,
    /// Stretched to the frame.
    ScaleToFill,
    /// Natural size, centred.
    Center,
}

/// Which scene a snapshot captures.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SnapshotLayer {
    /// The scene being revealed, placed at its final frame.
    Destination,
    /// The viewer's paging region only.
    SourcePage,
    /// The viewer without its paging region (bars, buttons).
    SourceChrome,
}

/// Direction of a zoom.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ZoomDirection {
    /// Thumbnail grows into the viewer.
    Incoming,
    /// Viewer shrinks back into the thumbnail.
    Outgoing,
}

/// Lifecycle of a [`ZoomTransition`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TransitionPhase {
    /// Created, not started.
    Idle,
    /// Checking prerequisites and building temporary views.
    Preparing,
    /// Running a fixed-duration animation.
    AnimatingDiscrete,
    /// Following a live gesture.
    AnimatingInteractive,
    /// Finishing towards the destination.
    Committing,
    /// Returning to the source.
    Reversing,
    /// Done; temporary views are gone.
    Finished,
}

/// Why a transition gave up before animating.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
pub enum AbortReason {
    /// No image to draw in the moving view.
    #[error("no image to animate")]
    MissingImage,
    /// The frame the image starts from is unknown.
    #[error("source frame is unknown")]
    MissingSourceFrame,
    /// The frame the image should land on is unknown.
    #[error("destination frame is unknown")]
    MissingDestinationFrame,
    /// The stage could not snapshot a scene.
    #[error("stage could not snapshot {0:?}")]
    MissingSnapshot(SnapshotLayer),
    /// The host aborted the transition.
    #[error("aborted by the host")]
    Host,
}

/// Final result of a transition.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TransitionOutcome {
    /// Ran to the destination.
    Completed,
    /// Reversed back to the source.
    Cancelled,
    /// Never animated.
    Aborted(AbortReason),
}

impl TransitionOutcome {
    /// Returns `true` only for [`TransitionOutcome::Completed`].
    pub fn completed(self) -> bool {
        self == Self::Completed
    }
}

/// The thumbnail end of a transition.
#[derive(Clone, Debug, Default)]
pub struct SmallViewDescriptor {
    /// Frame in screen space, if the thumbnail is on screen.
    pub frame: Option<Rect>,
    /// How the thumbnail fits its image.
    pub content_mode: ContentMode,
    /// The image the thumbnail shows.
    pub image: Option<MediaResource>,
}

/// The viewer end of a transition.
pub trait LargeViewProvider: Send + Sync {
    /// Frame of the current item's image in screen space.
    fn current_frame(&self) -> Option<Rect>;
    /// The image shown for the current item.
    fn current_image(&self) -> Option<MediaResource>;
    /// Hides or shows the real image view while the temporary one moves.
    fn set_current_hidden(&self, hidden: bool);
    /// Whether the real image view is hidden.
    fn is_current_hidden(&self) -> bool;
    /// Controller of a live dismissal gesture, if any.
    fn interactive_controller(&self) -> Option<InteractiveDismissController> {
        None
    }
}

/// The host's view layer for the duration of one transition.
///
/// Views are stacked in the order they are created.
pub trait TransitionStage: Send {
    /// Whether progress is driven by a gesture rather than a timer.
    fn is_interactive(&self) -> bool;
    /// Snapshots a scene and adds it to the stage.
    fn snapshot(&mut self, layer: SnapshotLayer) -> Option<ViewId>;
    /// Adds a clipped image view showing `image`.
    fn add_image_view(&mut self, image: &MediaResource, frame: Rect, mode: ContentMode) -> ViewId;
    /// Moves a view.
    fn set_frame(&mut self, view: ViewId, frame: Rect);
    /// Changes how an image view fits its image.
    fn set_content_mode(&mut self, view: ViewId, mode: ContentMode);
    /// Applies a transform on top of a view's frame.
    fn set_transform(&mut self, view: ViewId, transform: Affine);
    /// Sets a view's opacity.
    fn set_opacity(&mut self, view: ViewId, opacity: f64);
    /// Removes a view from the stage.
    fn remove(&mut self, view: ViewId);
    /// Hands control back to the host's navigation machinery.
    fn complete_transition(&mut self, completed: bool);
}

/// Values passed to [`TransitionDelegate::user_animation`] on every applied frame.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct UserAnimation {
    /// Driven by a gesture.
    pub interactive: bool,
    /// Heading back to the source.
    pub cancelled: bool,
    /// Visual progress towards the destination, in `[0, 1]`.
    pub progress: f64,
    /// The moving image view.
    pub image_view: ViewId,
}

/// Observes a transition; every method defaults to doing nothing.
pub trait TransitionDelegate: Send + Sync {
    /// Preparation succeeded far enough that the real content was hidden.
    fn will_begin(&self, transition: &ZoomTransition) {
        let _ = transition;
    }
    /// The moving image view exists; last chance to style it.
    fn will_begin_animation(&self, transition: &ZoomTransition, image_view: ViewId) {
        let _ = (transition, image_view);
    }
    /// A frame was applied; re-express host overlays for this progress.
    fn user_animation(&self, transition: &ZoomTransition, frame: &UserAnimation) {
        let _ = (transition, frame);
    }
    /// Animation ended and temporary views are gone.
    fn did_finish_animation(&self, transition: &ZoomTransition, completed: bool) {
        let _ = (transition, completed);
    }
    /// The transition is over.
    fn did_finish(&self, transition: &ZoomTransition, completed: bool) {
        let _ = (transition, completed);
    }
}

/// Lends navigation callbacks to a transition and takes them back afterwards.
pub trait NavigationDelegateTransfer: Send + Sync {
    /// Called when the transition starts.
    fn transfer(&self);
    /// Called once when the transition finishes, however it ends.
    fn restore(&self);
}

/// Timing for a transition.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TransitionConfig {
    /// Full duration of an uninterrupted transition.
    pub duration: Duration,
    /// Timing of the animation.
    pub option: AnimationOption,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_millis(350),
            option: AnimationOption::default(),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
struct Visual {
    frame: Rect,
    transform: Affine,
    snapshot_opacity: f64,
    progress: f64,
}

impl Visual {
    fn lerp(&self, to: &Self, t: f64) -> Self {
        Self {
            frame: lerp_rect(self.frame, to.frame, t),
            transform: lerp_affine(self.transform, to.transform, t),
            snapshot_opacity: lerp(self.snapshot_opacity, to.snapshot_opacity, t),
            progress: lerp(self.progress, to.progress, t).clamp(0.0, 1.0),
        }
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a * (1.0 - t) + b * t
}

fn lerp_rect(a: Rect, b: Rect, t: f64) -> Rect {
    Rect::new(
        lerp(a.x0, b.x0, t),
        lerp(a.y0, b.y0, t),
        lerp(a.x1, b.x1, t),
        lerp(a.y1, b.y1, t),
    )
}

fn lerp_affine(a: Affine, b: Affine, t: f64) -> Affine {
    let (a, b) = (a.as_coeffs(), b.as_coeffs());
    Affine::new(core::array::from_fn(|i| lerp(a[i], b[i], t)))
}

#[derive(Default)]
struct TemporaryViews {
    destination: Option<ViewId>,
    source_page: Option<ViewId>,
    image: Option<ViewId>,
    source_chrome: Option<ViewId>,
}

impl TemporaryViews {
    fn remove_all(&mut self, stage: &mut dyn TransitionStage) {
        for slot in [
            &mut self.source_chrome,
            &mut self.image,
            &mut self.source_page,
            &mut self.destination,
        ] {
            if let Some(view) = slot.take() {
                stage.remove(view);
            }
        }
    }

    fn fading(&self) -> impl Iterator<Item = ViewId> {
        [self.source_page, self.source_chrome].into_iter().flatten()
    }
}

enum Event {
    TransferNavigation,
    WillBegin,
    WillBeginAnimation(ViewId),
    UserAnimation(UserAnimation),
    DidFinishAnimation(bool),
    DidFinish(bool),
    RestoreNavigation,
}

struct State {
    direction: ZoomDirection,
    config: TransitionConfig,
    phase: TransitionPhase,
    small: SmallViewDescriptor,
    large: Arc<dyn LargeViewProvider>,
    stage: Option<Box<dyn TransitionStage>>,
    views: TemporaryViews,
    source_frame: Rect,
    destination_frame: Rect,
    progress: f64,
    transform: Affine,
    cancelled: bool,
    segment: Option<(Visual, Visual)>,
    animator: Option<Animator>,
    controller: Option<InteractiveDismissController>,
    outcome: Option<TransitionOutcome>,
    delegate: Option<Weak<dyn TransitionDelegate>>,
    transfer: Option<Arc<dyn NavigationDelegateTransfer>>,
    events: Vec<Event>,
}

impl State {
    fn set_phase(&mut self, phase: TransitionPhase) {
        if self.phase != phase {
            tracing::debug!(
                direction = ?self.direction,
                from = ?self.phase,
                to = ?phase,
                "zoom transition phase"
            );
            self.phase = phase;
        }
    }

    fn current_visual(&self) -> Visual {
        Visual {
            frame: self.source_frame,
            transform: self.transform,
            snapshot_opacity: 1.0 - self.progress,
            progress: self.progress,
        }
    }

    fn apply(&mut self, visual: Visual, interactive: bool) {
        self.progress = visual.progress;
        self.transform = visual.transform;
        let (Some(stage), Some(image)) = (self.stage.as_deref_mut(), self.views.image) else {
            return;
        };
        if !interactive {
            stage.set_frame(image, visual.frame);
        }
        stage.set_transform(image, visual.transform);
        for view in self.views.fading() {
            stage.set_opacity(view, visual.snapshot_opacity);
        }
        self.events.push(Event::UserAnimation(UserAnimation {
            interactive,
            cancelled: self.cancelled,
            progress: visual.progress,
            image_view: image,
        }));
    }

    fn set_image_content_mode(&mut self, mode: ContentMode) {
        if let (Some(stage), Some(image)) = (self.stage.as_deref_mut(), self.views.image) {
            stage.set_content_mode(image, mode);
        }
    }

    fn prepare(&mut self) -> Result<Option<InteractiveDismissController>, AbortReason> {
        let image = match self.direction {
            ZoomDirection::Incoming => self.prepare_incoming()?,
            ZoomDirection::Outgoing => self.prepare_outgoing()?,
        };
        let stage = self.stage.as_deref_mut().ok_or(AbortReason::Host)?;
        let interactive = stage.is_interactive();
        let start_mode = match self.direction {
            ZoomDirection::Incoming => self.small.content_mode,
            ZoomDirection::Outgoing => ContentMode::AspectFit,
        };
        let view = stage.add_image_view(&image, self.source_frame, start_mode);
        self.views.image = Some(view);
        self.events.push(Event::WillBeginAnimation(view));
        if self.direction == ZoomDirection::Outgoing {
            self.views.source_chrome = stage.snapshot(SnapshotLayer::SourceChrome);
        }

        let controller = match self.direction {
            ZoomDirection::Outgoing if interactive => self
                .large
                .interactive_controller()
                .filter(InteractiveDismissController::is_live),
            _ => None,
        };
        if controller.is_some() {
            self.set_phase(TransitionPhase::AnimatingInteractive);
            self.controller.clone_from(&controller);
            return Ok(controller);
        }

        self.set_phase(TransitionPhase::AnimatingDiscrete);
        let end_mode = match self.direction {
            ZoomDirection::Incoming => ContentMode::AspectFit,
            ZoomDirection::Outgoing => self.small.content_mode,
        };
        self.set_image_content_mode(end_mode);
        let from = self.current_visual();
        let to = Visual {
            frame: self.destination_frame,
            transform: Affine::IDENTITY,
            snapshot_opacity: 0.0,
            progress: 1.0,
        };
        self.run_segment(from, to, self.config.duration);
        Ok(None)
    }

    fn prepare_incoming(&mut self) -> Result<MediaResource, AbortReason> {
        let image = self.small.image.clone().ok_or(AbortReason::MissingImage)?;
        self.source_frame = self.small.frame.ok_or(AbortReason::MissingSourceFrame)?;
        self.destination_frame = self
            .large
            .current_frame()
            .ok_or(AbortReason::MissingDestinationFrame)?;
        self.large.set_current_hidden(true);
        self.events.push(Event::WillBegin);
        Ok(image)
    }

    fn prepare_outgoing(&mut self) -> Result<MediaResource, AbortReason> {
        self.large.set_current_hidden(true);
        self.events.push(Event::WillBegin);
        let stage = self.stage.as_deref_mut().ok_or(AbortReason::Host)?;
        self.views.destination = Some(
            stage
                .snapshot(SnapshotLayer::Destination)
                .ok_or(AbortReason::MissingSnapshot(SnapshotLayer::Destination))?,
        );
        self.views.source_page = Some(
            stage
                .snapshot(SnapshotLayer::SourcePage)
                .ok_or(AbortReason::MissingSnapshot(SnapshotLayer::SourcePage))?,
        );
        let image = self.large.current_image().ok_or(AbortReason::MissingImage)?;
        self.destination_frame = self.small.frame.ok_or(AbortReason::MissingDestinationFrame)?;
        self.source_frame = self
            .large
            .current_frame()
            .ok_or(AbortReason::MissingSourceFrame)?;
        Ok(image)
    }

    fn run_segment(&mut self, from: Visual, to: Visual, duration: Duration) {
        let mut animator = Animator::new(self.config.option, duration);
        animator.start();
        self.segment = Some((from, to));
        self.animator = Some(animator);
        self.apply(from, false);
    }

    fn abort(&mut self, reason: AbortReason) -> bool {
        if self.outcome.is_some() {
            tracing::debug!(
                direction = ?self.direction,
                %reason,
                "transition already finished; abort ignored"
            );
            return false;
        }
        tracing::warn!(direction = ?self.direction, %reason, "zoom transition aborted");
        if let Some(stage) = self.stage.as_deref_mut() {
            self.views.remove_all(stage);
            stage.complete_transition(true);
        }
        self.large.set_current_hidden(false);
        self.close(TransitionOutcome::Aborted(reason));
        true
    }

    fn complete(&mut self) {
        let completed = !self.cancelled;
        if let Some(stage) = self.stage.as_deref_mut() {
            self.views.remove_all(stage);
            stage.complete_transition(completed);
        }
        self.large.set_current_hidden(false);
        let outcome = if completed {
            TransitionOutcome::Completed
        } else {
            TransitionOutcome::Cancelled
        };
        self.close(outcome);
    }

    fn close(&mut self, outcome: TransitionOutcome) {
        self.set_phase(TransitionPhase::Finished);
        self.outcome = Some(outcome);
        self.segment = None;
        self.animator = None;
        self.controller = None;
        let completed = outcome.completed();
        self.events.push(Event::DidFinishAnimation(completed));
        self.events.push(Event::DidFinish(completed));
        self.events.push(Event::RestoreNavigation);
    }
}

struct Shared {
    state: Mutex<State>,
}

impl Drop for Shared {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        if state.outcome.is_some() || state.phase == TransitionPhase::Idle {
            return;
        }
        // No handle is left to pass to the delegate; only clean up.
        state.abort(AbortReason::Host);
        if let Some(transfer) = &state.transfer {
            transfer.restore();
        }
    }
}

/// One zoom between a thumbnail and the viewer.
///
/// Cheap to clone; clones share state. Drive it with [`start`](Self::start)
/// and then [`tick`](Self::tick) on every frame until it reports
/// [`TransitionPhase::Finished`]. Interactive transitions advance from the
/// provider's [`InteractiveDismissController`] instead, and tick once the
/// gesture ends.
///
/// ```rust
/// use core::time::Duration;
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use kurbo::{Affine, Rect};
/// use lightbox_sequence::{MediaKind, MediaResource};
/// use lightbox_transition::{
///     ContentMode, LargeViewProvider, SmallViewDescriptor, SnapshotLayer, TransitionOutcome,
///     TransitionPhase, TransitionStage, ViewId, ZoomTransition,
/// };
///
/// #[derive(Default)]
/// struct Viewer(AtomicBool);
///
/// impl LargeViewProvider for Viewer {
///     fn current_frame(&self) -> Option<Rect> { Some(Rect::new(0.0, 100.0, 400.0, 400.0)) }
///     fn current_image(&self) -> Option<MediaResource> { None }
///     fn set_current_hidden(&self, hidden: bool) { self.0.store(hidden, Ordering::SeqCst) }
///     fn is_current_hidden(&self) -> bool { self.0.load(Ordering::SeqCst) }
/// }
///
/// struct Stage;
///
/// impl TransitionStage for Stage {
///     fn is_interactive(&self) -> bool { false }
///     fn snapshot(&mut self, _: SnapshotLayer) -> Option<ViewId> { None }
///     fn add_image_view(&mut self, _: &MediaResource, _: Rect, _: ContentMode) -> ViewId { ViewId(1) }
///     fn set_frame(&mut self, _: ViewId, _: Rect) {}
///     fn set_content_mode(&mut self, _: ViewId, _: ContentMode) {}
///     fn set_transform(&mut self, _: ViewId, _: Affine) {}
///     fn set_opacity(&mut self, _: ViewId, _: f64) {}
///     fn remove(&mut self, _: ViewId) {}
///     fn complete_transition(&mut self, _: bool) {}
/// }
///
/// let viewer = Arc::new(Viewer::default());
/// let thumbnail = SmallViewDescriptor {
///     frame: Some(Rect::new(10.0, 10.0, 50.0, 50.0)),
///     content_mode: ContentMode::AspectFill,
///     image: Some(MediaResource::new("p1", MediaKind::Image)),
/// };
///
/// let zoom = ZoomTransition::incoming(thumbnail, viewer.clone());
/// assert_eq!(zoom.start(Box::new(Stage)), TransitionPhase::AnimatingDiscrete);
/// assert!(viewer.is_current_hidden());
///
/// while zoom.tick(Duration::from_millis(16)) != TransitionPhase::Finished {}
/// assert_eq!(zoom.outcome(), Some(TransitionOutcome::Completed));
/// assert!(!viewer.is_current_hidden());
/// ```
#[derive(Clone)]
pub struct ZoomTransition {
    shared: Arc<Shared>,
}

impl ZoomTransition {
    /// A thumbnail-to-viewer transition.
    pub fn incoming(small: SmallViewDescriptor, large: Arc<dyn LargeViewProvider>) -> Self {
        Self::build(ZoomDirection::Incoming, small, large)
    }

    /// A viewer-to-thumbnail transition.
    pub fn outgoing(large: Arc<dyn LargeViewProvider>, small: SmallViewDescriptor) -> Self {
        Self::build(ZoomDirection::Outgoing, small, large)
    }

    fn build(
        direction: ZoomDirection,
        small: SmallViewDescriptor,
        large: Arc<dyn LargeViewProvider>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    direction,
                    config: TransitionConfig::default(),
                    phase: TransitionPhase::Idle,
                    small,
                    large,
                    stage: None,
                    views: TemporaryViews::default(),
                    source_frame: Rect::ZERO,
                    destination_frame: Rect::ZERO,
                    progress: 0.0,
                    transform: Affine::IDENTITY,
                    cancelled: false,
                    segment: None,
                    animator: None,
                    controller: None,
                    outcome: None,
                    delegate: None,
                    transfer: None,
                    events: Vec::new(),
                }),
            }),
        }
    }

    /// Replaces the timing.
    #[must_use]
    pub fn with_config(self, config: TransitionConfig) -> Self {
        self.shared.state.lock().config = config;
        self
    }

    /// Sets the delegate; it is held weakly.
    #[must_use]
    pub fn with_delegate(self, delegate: Weak<dyn TransitionDelegate>) -> Self {
        self.shared.state.lock().delegate = Some(delegate);
        self
    }

    /// Sets the navigation delegate transfer restored when the transition finishes.
    #[must_use]
    pub fn with_navigation_transfer(self, transfer: Arc<dyn NavigationDelegateTransfer>) -> Self {
        self.shared.state.lock().transfer = Some(transfer);
        self
    }

    /// Returns `true` if both handles refer to the same transition.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    /// Direction of the zoom.
    pub fn direction(&self) -> ZoomDirection {
        self.shared.state.lock().direction
    }

    /// Current phase.
    pub fn phase(&self) -> TransitionPhase {
        self.shared.state.lock().phase
    }

    /// Visual progress towards the destination, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        self.shared.state.lock().progress
    }

    /// Final result, once finished.
    pub fn outcome(&self) -> Option<TransitionOutcome> {
        self.shared.state.lock().outcome
    }

    /// Timing in use.
    pub fn config(&self) -> TransitionConfig {
        self.shared.state.lock().config
    }

    /// The moving image view, while it exists.
    pub fn image_view(&self) -> Option<ViewId> {
        self.shared.state.lock().views.image
    }

    /// The gesture controller driving this transition, while interactive.
    pub fn interactive_controller(&self) -> Option<InteractiveDismissController> {
        self.shared.state.lock().controller.clone()
    }

    pub(crate) fn large_interactive_controller(&self) -> Option<InteractiveDismissController> {
        let large = self.shared.state.lock().large.clone();
        large.interactive_controller()
    }

    /// Starts the transition on `stage`.
    ///
    /// Returns the phase reached. Missing prerequisites abort immediately and
    /// return [`TransitionPhase::Finished`]. Starting twice does nothing.
    pub fn start(&self, stage: Box<dyn TransitionStage>) -> TransitionPhase {
        let wire = self.run(|state| {
            if state.phase != TransitionPhase::Idle {
                tracing::warn!(phase = ?state.phase, "zoom transition already started");
                return None;
            }
            state.stage = Some(stage);
            state.set_phase(TransitionPhase::Preparing);
            state.events.push(Event::TransferNavigation);
            match state.prepare() {
                Ok(controller) => controller,
                Err(reason) => {
                    state.abort(reason);
                    None
                }
            }
        });
        if let Some(controller) = wire {
            self.follow(&controller);
        }
        self.phase()
    }

    /// Advances a timed animation by `dt` and returns the phase reached.
    ///
    /// Does nothing while idle, interactive or finished.
    pub fn tick(&self, dt: Duration) -> TransitionPhase {
        self.run(|state| {
            if !matches!(
                state.phase,
                TransitionPhase::AnimatingDiscrete
                    | TransitionPhase::Committing
                    | TransitionPhase::Reversing
            ) {
                return state.phase;
            }
            let (Some(animator), Some((from, to))) = (state.animator.as_mut(), state.segment)
            else {
                return state.phase;
            };
            let eased = animator.tick(dt);
            let finished = animator.is_finished();
            state.apply(from.lerp(&to, eased), false);
            if finished {
                if state.phase == TransitionPhase::AnimatingDiscrete {
                    state.set_phase(TransitionPhase::Committing);
                }
                state.complete();
            }
            state.phase
        })
    }

    /// Aborts the transition without animating.
    ///
    /// Removes temporary views, shows the real content and reports
    /// `completed = false`. Returns `false` if the transition had already
    /// finished; repeated calls have no further effect.
    pub fn abort(&self) -> bool {
        self.run(|state| state.abort(AbortReason::Host))
    }

    fn follow(&self, controller: &InteractiveDismissController) {
        let link: Arc<dyn DismissObserver> = Arc::new(GestureLink {
            shared: Arc::downgrade(&self.shared),
        });
        controller.attach_observer(link);
        let weak = Arc::downgrade(&self.shared);
        controller.set_continuation(Box::new(move |outcome, progress| {
            match weak.upgrade() {
                Some(shared) => ZoomTransition { shared }.continue_after_gesture(outcome, progress),
                None => tracing::debug!("transition gone before the gesture ended"),
            }
        }));
    }

    fn continue_after_gesture(&self, outcome: DismissOutcome, progress: f64) {
        self.run(|state| {
            if state.phase != TransitionPhase::AnimatingInteractive {
                tracing::debug!(phase = ?state.phase, "gesture ended outside the interactive phase");
                return;
            }
            let progress = progress.clamp(0.0, 1.0);
            state.progress = progress;
            state.cancelled = outcome == DismissOutcome::Cancelled;
            let (phase, mode, to) = if state.cancelled {
                (
                    TransitionPhase::Reversing,
                    ContentMode::AspectFit,
                    Visual {
                        frame: state.source_frame,
                        transform: Affine::IDENTITY,
                        snapshot_opacity: 1.0,
                        progress: 0.0,
                    },
                )
            } else {
                (
                    TransitionPhase::Committing,
                    state.small.content_mode,
                    Visual {
                        frame: state.destination_frame,
                        transform: Affine::IDENTITY,
                        snapshot_opacity: 0.0,
                        progress: 1.0,
                    },
                )
            };
            state.set_phase(phase);
            state.set_image_content_mode(mode);
            let from = state.current_visual();
            let remaining = state.config.duration.mul_f64(1.0 - progress);
            state.run_segment(from, to, remaining);
            if remaining.is_zero() {
                state.apply(to, false);
                state.complete();
            }
        });
    }

    fn on_progress(&self, progress: f64) {
        self.run(|state| {
            if state.phase != TransitionPhase::AnimatingInteractive {
                return;
            }
            let progress = progress.clamp(0.0, 1.0);
            let visual = Visual {
                snapshot_opacity: 1.0 - progress,
                progress,
                ..state.current_visual()
            };
            state.apply(visual, true);
        });
    }

    fn on_transform(&self, transform: Affine) {
        self.run(|state| {
            if state.phase != TransitionPhase::AnimatingInteractive {
                return;
            }
            state.transform = transform;
            if let (Some(stage), Some(image)) = (state.stage.as_deref_mut(), state.views.image) {
                stage.set_transform(image, transform);
            }
        });
    }

    /// Runs `f` under the lock, then dispatches the events it queued.
    fn run<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        let (result, events, delegate, transfer) = {
            let mut state = self.shared.state.lock();
            let result = f(&mut state);
            let events = core::mem::take(&mut state.events);
            let delegate = state.delegate.as_ref().and_then(Weak::upgrade);
            (result, events, delegate, state.transfer.clone())
        };
        for event in events {
            match event {
                Event::TransferNavigation => {
                    if let Some(transfer) = &transfer {
                        transfer.transfer();
                    }
                }
                Event::RestoreNavigation => {
                    if let Some(transfer) = &transfer {
                        transfer.restore();
                    }
                }
                Event::WillBegin => {
                    if let Some(delegate) = &delegate {
                        delegate.will_begin(self);
                    }
                }
                Event::WillBeginAnimation(view) => {
                    if let Some(delegate) = &delegate {
                        delegate.will_begin_animation(self, view);
                    }
                }
                Event::UserAnimation(frame) => {
                    if let Some(delegate) = &delegate {
                        delegate.user_animation(self, &frame);
                    }
                }
                Event::DidFinishAnimation(completed) => {
                    if let Some(delegate) = &delegate {
                        delegate.did_finish_animation(self, completed);
                    }
                }
                Event::DidFinish(completed) => {
                    if let Some(delegate) = &delegate {
                        delegate.did_finish(self, completed);
                    }
                }
            }
        }
        result
    }
}

impl fmt::Debug for ZoomTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("ZoomTransition")
            .field("direction", &state.direction)
            .field("phase", &state.phase)
            .field("progress", &state.progress)
            .field("outcome", &state.outcome)
            .finish_non_exhaustive()
    }
}

/// Forwards live gesture values to a transition without keeping it alive.
struct GestureLink {
    shared: Weak<Shared>,
}

impl DismissObserver for GestureLink {
    fn progress_changed(&self, progress: f64) {
        if let Some(shared) = self.shared.upgrade() {
            ZoomTransition { shared }.on_progress(progress);
        }
    }

    fn transform_changed(&self, transform: Affine) {
        if let Some(shared) = self.shared.upgrade() {
            ZoomTransition { shared }.on_transform(transform);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lightbox_sequence::MediaKind;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    const FRAME: Duration = Duration::from_millis(16);

    #[derive(Debug, Clone, PartialEq)]
    enum StageOp {
        Snapshot(SnapshotLayer, ViewId),
        AddImage(ViewId, Rect, ContentMode),
        Frame(ViewId, Rect),
        Mode(ViewId, ContentMode),
        Transform(ViewId, Affine),
        Opacity(ViewId, f64),
        Remove(ViewId),
        Complete(bool),
    }

    #[derive(Default)]
    struct StageLog {
        ops: Mutex<Vec<StageOp>>,
    }

    impl StageLog {
        fn ops(&self) -> Vec<StageOp> {
            self.ops.lock().clone()
        }

        fn removed(&self) -> Vec<ViewId> {
            self.ops()
                .into_iter()
                .filter_map(|op| match op {
                    StageOp::Remove(view) => Some(view),
                    _ => None,
                })
                .collect()
        }

        fn created(&self) -> Vec<ViewId> {
            self.ops()
                .into_iter()
                .filter_map(|op| match op {
                    StageOp::Snapshot(_, view) | StageOp::AddImage(view, ..) => Some(view),
                    _ => None,
                })
                .collect()
        }

        fn completions(&self) -> Vec<bool> {
            self.ops()
                .into_iter()
                .filter_map(|op| match op {
                    StageOp::Complete(completed) => Some(completed),
                    _ => None,
                })
                .collect()
        }

        fn last_transform(&self, view: ViewId) -> Option<Affine> {
            self.ops().into_iter().rev().find_map(|op| match op {
                StageOp::Transform(v, t) if v == view => Some(t),
                _ => None,
            })
        }

        fn last_opacity(&self, view: ViewId) -> Option<f64> {
            self.ops().into_iter().rev().find_map(|op| match op {
                StageOp::Opacity(v, o) if v == view => Some(o),
                _ => None,
            })
        }
    }

    struct FakeStage {
        log: Arc<StageLog>,
        interactive: bool,
        missing: Vec<SnapshotLayer>,
        next: u64,
    }

    impl FakeStage {
        fn new(log: &Arc<StageLog>, interactive: bool) -> Box<Self> {
            Box::new(Self {
                log: log.clone(),
                interactive,
                missing: Vec::new(),
                next: 0,
            })
        }

        fn id(&mut self) -> ViewId {
            self.next += 1;
            ViewId(self.next)
        }

        fn push(&self, op: StageOp) {
            self.log.ops.lock().push(op);
        }
    }

    impl TransitionStage for FakeStage {
        fn is_interactive(&self) -> bool {
            self.interactive
        }

        fn snapshot(&mut self, layer: SnapshotLayer) -> Option<ViewId> {
            if self.missing.contains(&layer) {
                return None;
            }
            let view = self.id();
            self.push(StageOp::Snapshot(layer, view));
            Some(view)
        }

        fn add_image_view(&mut self, _: &MediaResource, frame: Rect, mode: ContentMode) -> ViewId {
            let view = self.id();
            self.push(StageOp::AddImage(view, frame, mode));
            view
        }

        fn set_frame(&mut self, view: ViewId, frame: Rect) {
            self.push(StageOp::Frame(view, frame));
        }

        fn set_content_mode(&mut self, view: ViewId, mode: ContentMode) {
            self.push(StageOp::Mode(view, mode));
        }

        fn set_transform(&mut self, view: ViewId, transform: Affine) {
            self.push(StageOp::Transform(view, transform));
        }

        fn set_opacity(&mut self, view: ViewId, opacity: f64) {
            self.push(StageOp::Opacity(view, opacity));
        }

        fn remove(&mut self, view: ViewId) {
            self.push(StageOp::Remove(view));
        }

        fn complete_transition(&mut self, completed: bool) {
            self.push(StageOp::Complete(completed));
        }
    }

    struct FakeViewer {
        frame: Option<Rect>,
        image: Option<MediaResource>,
        hidden: AtomicBool,
        controller: Option<InteractiveDismissController>,
    }

    impl FakeViewer {
        fn new() -> Self {
            Self {
                frame: Some(Rect::new(0.0, 200.0, 400.0, 500.0)),
                image: Some(MediaResource::new("big", MediaKind::Image)),
                hidden: AtomicBool::new(false),
                controller: None,
            }
        }
    }

    impl LargeViewProvider for FakeViewer {
        fn current_frame(&self) -> Option<Rect> {
            self.frame
        }

        fn current_image(&self) -> Option<MediaResource> {
            self.image.clone()
        }

        fn set_current_hidden(&self, hidden: bool) {
            self.hidden.store(hidden, Ordering::SeqCst);
        }

        fn is_current_hidden(&self) -> bool {
            self.hidden.load(Ordering::SeqCst)
        }

        fn interactive_controller(&self) -> Option<InteractiveDismissController> {
            self.controller.clone()
        }
    }

    #[derive(Default)]
    struct Recorder {
        log: Mutex<Vec<String>>,
        progress: Mutex<Vec<f64>>,
    }

    impl TransitionDelegate for Recorder {
        fn will_begin(&self, transition: &ZoomTransition) {
            // Callbacks run after the lock is released.
            assert_ne!(transition.phase(), TransitionPhase::Idle);
            self.log.lock().push("will_begin".into());
        }

        fn will_begin_animation(&self, _: &ZoomTransition, _: ViewId) {
            self.log.lock().push("will_begin_animation".into());
        }

        fn user_animation(&self, _: &ZoomTransition, frame: &UserAnimation) {
            self.progress.lock().push(frame.progress);
        }

        fn did_finish_animation(&self, _: &ZoomTransition, completed: bool) {
            self.log.lock().push(format!("did_finish_animation {completed}"));
        }

        fn did_finish(&self, _: &ZoomTransition, completed: bool) {
            self.log.lock().push(format!("did_finish {completed}"));
        }
    }

    #[derive(Default)]
    struct Transfer {
        transferred: AtomicUsize,
        restored: AtomicUsize,
    }

    impl NavigationDelegateTransfer for Transfer {
        fn transfer(&self) {
            self.transferred.fetch_add(1, Ordering::SeqCst);
        }

        fn restore(&self) {
            self.restored.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn thumbnail() -> SmallViewDescriptor {
        SmallViewDescriptor {
            frame: Some(Rect::new(20.0, 20.0, 80.0, 80.0)),
            content_mode: ContentMode::AspectFill,
            image: Some(MediaResource::new("thumb", MediaKind::Image)),
        }
    }

    fn run_to_end(zoom: &ZoomTransition) {
        for _ in 0..1000 {
            if zoom.tick(FRAME) == TransitionPhase::Finished {
                return;
            }
        }
        panic!("transition never finished");
    }

    fn delegate(recorder: &Arc<Recorder>) -> Weak<dyn TransitionDelegate> {
        let recorder: Arc<dyn TransitionDelegate> = recorder.clone();
        Arc::downgrade(&recorder)
    }

    #[test]
    fn incoming_zoom_lands_on_the_viewer_frame() {
        let log = Arc::new(StageLog::default());
        let viewer = Arc::new(FakeViewer::new());
        let recorder = Arc::new(Recorder::default());
        let zoom = ZoomTransition::incoming(thumbnail(), viewer.clone())
            .with_delegate(delegate(&recorder));

        assert_eq!(zoom.start(FakeStage::new(&log, false)), TransitionPhase::AnimatingDiscrete);
        assert!(viewer.is_current_hidden());
        let image = zoom.image_view().unwrap();
        assert_eq!(
            log.ops()[..2],
            [
                StageOp::AddImage(image, Rect::new(20.0, 20.0, 80.0, 80.0), ContentMode::AspectFill),
                StageOp::Mode(image, ContentMode::AspectFit),
            ]
        );

        run_to_end(&zoom);
        assert_eq!(zoom.outcome(), Some(TransitionOutcome::Completed));
        assert!(!viewer.is_current_hidden());
        assert!(log.ops().contains(&StageOp::Frame(image, Rect::new(0.0, 200.0, 400.0, 500.0))));
        assert_eq!(log.removed(), vec![image]);
        assert_eq!(log.completions(), vec![true]);
        assert_eq!(
            *recorder.log.lock(),
            vec![
                "will_begin",
                "will_begin_animation",
                "did_finish_animation true",
                "did_finish true",
            ]
        );
        let progress = recorder.progress.lock();
        assert_eq!(progress.first(), Some(&0.0));
        assert_eq!(progress.last(), Some(&1.0));
        assert!(progress.iter().all(|p| (0.0..=1.0).contains(p)));
    }

    #[test]
    fn outgoing_zoom_fades_source_snapshots_and_cleans_up() {
        let log = Arc::new(StageLog::default());
        let viewer = Arc::new(FakeViewer::new());
        let transfer = Arc::new(Transfer::default());
        let zoom = ZoomTransition::outgoing(viewer.clone(), thumbnail())
            .with_navigation_transfer(transfer.clone());

        assert_eq!(zoom.start(FakeStage::new(&log, false)), TransitionPhase::AnimatingDiscrete);
        assert_eq!(transfer.transferred.load(Ordering::SeqCst), 1);
        let created = log.created();
        assert_eq!(created.len(), 4, "destination, page, image, chrome");
        let ops = log.ops();
        assert!(matches!(ops[0], StageOp::Snapshot(SnapshotLayer::Destination, _)));
        assert!(matches!(ops[1], StageOp::Snapshot(SnapshotLayer::SourcePage, _)));
        assert!(matches!(ops[2], StageOp::AddImage(_, _, ContentMode::AspectFit)));
        assert!(matches!(ops[3], StageOp::Snapshot(SnapshotLayer::SourceChrome, _)));

        run_to_end(&zoom);
        assert_eq!(log.last_opacity(created[1]), Some(0.0));
        assert_eq!(log.last_opacity(created[3]), Some(0.0));
        assert_eq!(log.last_opacity(created[0]), None, "destination never fades");
        let mut removed = log.removed();
        removed.sort_by_key(|v| v.0);
        assert_eq!(removed, created);
        assert_eq!(transfer.restored.load(Ordering::SeqCst), 1);
        assert!(!viewer.is_current_hidden());
    }

    #[test]
    fn interactive_cancel_restores_the_source() {
        let log = Arc::new(StageLog::default());
        let controller = InteractiveDismissController::new();
        let viewer = Arc::new(FakeViewer {
            controller: Some(controller.clone()),
            ..FakeViewer::new()
        });
        let recorder = Arc::new(Recorder::default());
        let zoom = ZoomTransition::outgoing(viewer.clone(), thumbnail())
            .with_delegate(delegate(&recorder));

        assert_eq!(zoom.start(FakeStage::new(&log, true)), TransitionPhase::AnimatingInteractive);
        let image = zoom.image_view().unwrap();

        controller.set_transform(Affine::translate((0.0, 300.0)) * Affine::scale(0.6));
        controller.update(0.9);
        assert_eq!(zoom.progress(), 0.9);
        let shrunk = Affine::translate((0.0, 300.0)) * Affine::scale(0.6);
        assert_eq!(log.last_transform(image), Some(shrunk));
        assert!(viewer.is_current_hidden());

        controller.cancel();
        assert_eq!(zoom.phase(), TransitionPhase::Reversing);
        // Late gesture values are ignored.
        controller.update(0.1);
        run_to_end(&zoom);

        assert_eq!(zoom.outcome(), Some(TransitionOutcome::Cancelled));
        assert!(!viewer.is_current_hidden());
        assert_eq!(log.last_transform(image), Some(Affine::IDENTITY));
        assert!(log.ops().contains(&StageOp::Frame(image, Rect::new(0.0, 200.0, 400.0, 500.0))));
        assert_eq!(log.completions(), vec![false]);
        assert_eq!(log.removed().len(), log.created().len());
        assert!(recorder.log.lock().ends_with(&[
            "did_finish_animation false".to_string(),
            "did_finish false".to_string(),
        ]));
    }

    #[test]
    fn interactive_commit_runs_for_the_remaining_fraction() {
        let log = Arc::new(StageLog::default());
        let controller = InteractiveDismissController::new();
        let viewer = Arc::new(FakeViewer {
            controller: Some(controller.clone()),
            ..FakeViewer::new()
        });
        let zoom = ZoomTransition::outgoing(viewer, thumbnail()).with_config(TransitionConfig {
            duration: Duration::from_millis(1000),
            option: AnimationOption::Property {
                curve: crate::Curve::Linear,
            },
        });
        zoom.start(FakeStage::new(&log, true));

        controller.update(0.75);
        controller.finish();
        assert_eq!(zoom.phase(), TransitionPhase::Committing);
        assert_eq!(zoom.tick(Duration::from_millis(200)), TransitionPhase::Committing);
        assert_eq!(zoom.tick(Duration::from_millis(60)), TransitionPhase::Finished);
        assert_eq!(zoom.outcome(), Some(TransitionOutcome::Completed));
        assert!(log.ops().contains(&StageOp::Mode(zoom_image(&log), ContentMode::AspectFill)));
    }

    fn zoom_image(log: &StageLog) -> ViewId {
        log.ops()
            .into_iter()
            .find_map(|op| match op {
                StageOp::AddImage(view, ..) => Some(view),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn gesture_already_over_falls_back_to_a_timed_animation() {
        let log = Arc::new(StageLog::default());
        let controller = InteractiveDismissController::new();
        controller.cancel();
        let viewer = Arc::new(FakeViewer {
            controller: Some(controller),
            ..FakeViewer::new()
        });
        let zoom = ZoomTransition::outgoing(viewer, thumbnail());
        assert_eq!(zoom.start(FakeStage::new(&log, true)), TransitionPhase::AnimatingDiscrete);
    }

    #[test]
    fn abort_is_idempotent_and_removes_partial_views() {
        let log = Arc::new(StageLog::default());
        let viewer = Arc::new(FakeViewer {
            frame: None,
            ..FakeViewer::new()
        });
        let recorder = Arc::new(Recorder::default());
        let transfer = Arc::new(Transfer::default());
        let zoom = ZoomTransition::outgoing(viewer.clone(), thumbnail())
            .with_delegate(delegate(&recorder))
            .with_navigation_transfer(transfer.clone());

        assert_eq!(zoom.start(FakeStage::new(&log, false)), TransitionPhase::Finished);
        assert_eq!(
            zoom.outcome(),
            Some(TransitionOutcome::Aborted(AbortReason::MissingSourceFrame))
        );
        assert!(!zoom.abort());
        assert!(!zoom.abort());
        assert_eq!(zoom.start(FakeStage::new(&log, false)), TransitionPhase::Finished);

        let created = log.created();
        assert_eq!(created.len(), 2, "both snapshots were taken before the frame check");
        let mut removed = log.removed();
        removed.sort_by_key(|v| v.0);
        assert_eq!(removed, created);
        assert_eq!(log.completions(), vec![true]);
        assert!(!viewer.is_current_hidden());
        assert_eq!(
            *recorder.log.lock(),
            vec![
                "will_begin",
                "did_finish_animation false",
                "did_finish false",
            ]
        );
        assert_eq!(transfer.restored.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn incoming_without_image_aborts_before_hiding_content() {
        let log = Arc::new(StageLog::default());
        let viewer = Arc::new(FakeViewer::new());
        let small = SmallViewDescriptor {
            image: None,
            ..thumbnail()
        };
        let zoom = ZoomTransition::incoming(small, viewer.clone());
        assert_eq!(zoom.start(FakeStage::new(&log, false)), TransitionPhase::Finished);
        assert_eq!(zoom.outcome(), Some(TransitionOutcome::Aborted(AbortReason::MissingImage)));
        assert!(log.created().is_empty());
        assert!(!viewer.is_current_hidden());
    }

    #[test]
    fn host_abort_mid_animation_cleans_up_once() {
        let log = Arc::new(StageLog::default());
        let viewer = Arc::new(FakeViewer::new());
        let zoom = ZoomTransition::outgoing(viewer, thumbnail());
        zoom.start(FakeStage::new(&log, false));
        zoom.tick(FRAME);
        assert!(zoom.abort());
        assert!(!zoom.abort());
        assert_eq!(zoom.tick(FRAME), TransitionPhase::Finished);
        assert_eq!(zoom.outcome(), Some(TransitionOutcome::Aborted(AbortReason::Host)));
        assert_eq!(log.removed().len(), 4);
    }

    #[test]
    fn dropped_transition_cleans_up_and_ignores_the_gesture() {
        let controller = InteractiveDismissController::new();
        let viewer = Arc::new(FakeViewer {
            controller: Some(controller.clone()),
            ..FakeViewer::new()
        });
        let log = Arc::new(StageLog::default());
        {
            let zoom = ZoomTransition::outgoing(viewer.clone(), thumbnail());
            zoom.start(FakeStage::new(&log, true));
        }
        assert!(!viewer.is_current_hidden());
        assert_eq!(log.removed().len(), log.created().len());
        let before = log.ops().len();
        assert!(controller.update(0.5));
        assert!(controller.finish());
        assert_eq!(log.ops().len(), before);
    }
}
