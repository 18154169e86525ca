// Copyright 2026 the Lightbox Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mapping raw dismissal gestures onto an [`InteractiveDismissController`].
//!
//! Hosts forward pan and pinch/rotate recogniser callbacks to a
//! [`DismissGestureTracker`]. The tracker decides whether a gesture starts a
//! dismissal, turns each movement into progress and a provisional transform,
//! and resolves the controller when the gesture ends.
//!
//! ```rust
//! use kurbo::{Rect, Size, Vec2};
//! use lightbox_transition::{
//!     DismissGestureTracker, DismissOutcome, GesturePhase, GestureResponse, GestureSettings,
//! };
//!
//! let mut tracker = DismissGestureTracker::new(GestureSettings::default(), Size::new(400.0, 800.0));
//! tracker.set_content_bounds(Rect::new(0.0, 0.0, 400.0, 300.0));
//!
//! let GestureResponse::Began(controller) = tracker.pan(GesturePhase::Began, Vec2::new(0.0, 8.0))
//! else {
//!     panic!("downward pan starts a dismissal");
//! };
//! tracker.pan(GesturePhase::Changed, Vec2::new(0.0, 200.0));
//! assert_eq!(controller.progress(), 0.25);
//!
//! let end = tracker.pan(GesturePhase::Ended, Vec2::new(0.0, 200.0));
//! assert_eq!(end, GestureResponse::Ended(DismissOutcome::Finished));
//! ```

use kurbo::{Affine, Point, Rect, Size, Vec2};

use crate::{DismissOutcome, InteractiveDismissController};

bitflags::bitflags! {
    /// Screen edges towards which a pan may drag the content to dismiss it.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct DismissDirection: u8 {
        /// Dragging towards the left edge.
        const LEFT   = 0b0001;
        /// Dragging towards the right edge.
        const RIGHT  = 0b0010;
        /// Dragging towards the top edge.
        const TOP    = 0b0100;
        /// Dragging towards the bottom edge.
        const BOTTOM = 0b1000;
        /// Any direction.
        const ALL = Self::LEFT.bits() | Self::RIGHT.bits() | Self::TOP.bits() | Self::BOTTOM.bits();
    }
}

impl Default for DismissDirection {
    fn default() -> Self {
        Self::ALL
    }
}

/// Recogniser state, as reported by the host's gesture system.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum GesturePhase {
    /// The gesture was recognised.
    Began,
    /// The gesture moved.
    Changed,
    /// The user lifted their fingers.
    Ended,
    /// The system interrupted the gesture.
    Cancelled,
}

/// What the tracker did with a gesture callback.
#[derive(Clone, Debug)]
pub enum GestureResponse {
    /// Not a dismissal gesture, or no dismissal is being tracked.
    Ignored,
    /// A dismissal started; the host should begin its outgoing transition with this controller.
    Began(InteractiveDismissController),
    /// Progress and transform were forwarded to the controller.
    Updated {
        /// The progress just applied.
        progress: f64,
    },
    /// The dismissal resolved.
    Ended(DismissOutcome),
}

impl PartialEq for GestureResponse {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Ignored, Self::Ignored) => true,
            (Self::Began(a), Self::Began(b)) => a.ptr_eq(b),
            (Self::Updated { progress: a }, Self::Updated { progress: b }) => a == b,
            (Self::Ended(a), Self::Ended(b)) => a == b,
            _ => false,
        }
    }
}

/// Tuning for dismissal gestures.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GestureSettings {
    /// Edges a pan may head towards.
    pub directions: DismissDirection,
    /// How strongly a pan shrinks the content: scale is `1 - progress * factor`.
    pub scale_factor: f64,
    /// Pan progress that must be exceeded for a release to commit.
    pub drag_threshold: f64,
    /// Pinch progress that must be exceeded for a release to commit.
    pub pinch_threshold: f64,
}

impl Default for GestureSettings {
    fn default() -> Self {
        Self {
            directions: DismissDirection::ALL,
            scale_factor: 0.5,
            drag_threshold: 0.05,
            pinch_threshold: 0.1,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Tracking {
    Pan,
    Pinch,
}

/// Turns pan and pinch/rotate callbacks into dismissal progress.
#[derive(Clone, Debug)]
pub struct DismissGestureTracker {
    settings: GestureSettings,
    screen: Size,
    content: Rect,
    active: Option<(Tracking, InteractiveDismissController)>,
}

impl DismissGestureTracker {
    /// Creates a tracker for a screen of the given size.
    ///
    /// Content bounds default to the whole screen.
    pub fn new(settings: GestureSettings, screen: Size) -> Self {
        Self {
            settings,
            screen,
            content: screen.to_rect(),
            active: None,
        }
    }

    /// Current settings.
    pub fn settings(&self) -> &GestureSettings {
        &self.settings
    }

    /// Updates the screen size used to normalise pans.
    pub fn set_screen_size(&mut self, screen: Size) {
        self.screen = screen;
    }

    /// Sets the bounds of the moving content; transforms scale about its centre.
    pub fn set_content_bounds(&mut self, bounds: Rect) {
        self.content = bounds;
    }

    /// The controller of the dismissal being tracked.
    pub fn controller(&self) -> Option<&InteractiveDismissController> {
        self.active.as_ref().map(|(_, controller)| controller)
    }

    /// Returns `true` while a dismissal gesture is live.
    pub fn is_tracking(&self) -> bool {
        self.active.is_some()
    }

    /// Signed displacement towards the most-favoured allowed edge, as a
    /// fraction of the matching screen dimension. Not clamped.
    fn pan_fraction(&self, translation: Vec2) -> f64 {
        let directions = self.settings.directions;
        let height = self.screen.height.max(1.0);
        let width = self.screen.width.max(1.0);
        [
            (DismissDirection::BOTTOM, translation.y / height),
            (DismissDirection::TOP, -translation.y / height),
            (DismissDirection::RIGHT, translation.x / width),
            (DismissDirection::LEFT, -translation.x / width),
        ]
        .into_iter()
        .filter(|(direction, _)| directions.contains(*direction))
        .map(|(_, fraction)| fraction)
        .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Progress of a pan with the given total translation.
    pub fn pan_progress(&self, translation: Vec2) -> f64 {
        let fraction = self.pan_fraction(translation);
        if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Provisional transform of the content during a pan.
    ///
    /// Shrinks about the content centre, then follows the finger.
    pub fn pan_transform(&self, translation: Vec2) -> Affine {
        let fraction = self.pan_fraction(translation).max(0.0);
        let scale = (1.0 - fraction * self.settings.scale_factor).clamp(0.0, 1.0);
        Affine::translate(translation) * scale_about(scale, 0.0, self.content.center())
    }

    /// Provisional transform of the content during a pinch.
    ///
    /// Scales and rotates about the content centre, then moves to follow the
    /// touch location.
    pub fn pinch_transform(&self, scale: f64, rotation: f64, location: Point) -> Affine {
        let (scale, rotation) = pinch_at_rest_if_nan(scale, rotation);
        let centre = self.content.center();
        let offset = location - centre;
        Affine::translate(offset) * scale_about(scale.clamp(0.0, 1.0), rotation, centre)
    }

    /// Handles a pan recogniser callback with its total translation.
    ///
    /// A pan that does not head towards an allowed edge never starts a
    /// dismissal.
    pub fn pan(&mut self, phase: GesturePhase, translation: Vec2) -> GestureResponse {
        if self.active.is_none() && self.pan_fraction(translation) <= 0.0 {
            return GestureResponse::Ignored;
        }
        let progress = self.pan_progress(translation);
        match phase {
            GesturePhase::Began => self.begin(Tracking::Pan),
            GesturePhase::Changed => {
                self.apply(Tracking::Pan, progress, self.pan_transform(translation))
            }
            GesturePhase::Ended => {
                let commit = progress > self.settings.drag_threshold;
                self.end(Tracking::Pan, commit)
            }
            GesturePhase::Cancelled => self.end(Tracking::Pan, false),
        }
    }

    /// Handles a pinch/rotate callback.
    ///
    /// `scale` is the pinch scale (`1.0` at rest), `rotation` is in radians and
    /// `location` is the centroid of the touches in screen space.
    pub fn pinch(
        &mut self,
        phase: GesturePhase,
        scale: f64,
        rotation: f64,
        location: Point,
    ) -> GestureResponse {
        let (scale, _) = pinch_at_rest_if_nan(scale, 0.0);
        let progress = (1.0 - scale).clamp(0.0, 1.0);
        match phase {
            GesturePhase::Began => self.begin(Tracking::Pinch),
            GesturePhase::Changed => {
                let transform = self.pinch_transform(scale, rotation, location);
                self.apply(Tracking::Pinch, progress, transform)
            }
            GesturePhase::Ended => {
                let commit = progress > self.settings.pinch_threshold;
                self.end(Tracking::Pinch, commit)
            }
            GesturePhase::Cancelled => self.end(Tracking::Pinch, false),
        }
    }

    fn begin(&mut self, kind: Tracking) -> GestureResponse {
        if self.active.is_some() {
            return GestureResponse::Ignored;
        }
        let controller = InteractiveDismissController::new();
        tracing::debug!(?kind, "dismissal gesture began");
        self.active = Some((kind, controller.clone()));
        GestureResponse::Began(controller)
    }

    fn apply(&mut self, kind: Tracking, progress: f64, transform: Affine) -> GestureResponse {
        match &self.active {
            Some((active, controller)) if *active == kind => {
                controller.set_transform(transform);
                controller.update(progress);
                GestureResponse::Updated { progress }
            }
            _ => GestureResponse::Ignored,
        }
    }

    fn end(&mut self, kind: Tracking, commit: bool) -> GestureResponse {
        match self.active.take() {
            Some((active, controller)) if active == kind => {
                if commit {
                    controller.finish();
                    GestureResponse::Ended(DismissOutcome::Finished)
                } else {
                    controller.cancel();
                    GestureResponse::Ended(DismissOutcome::Cancelled)
                }
            }
            other => {
                self.active = other;
                GestureResponse::Ignored
            }
        }
    }
}

/// Recognisers can report NaN for a degenerate touch; read it as no pinch.
fn pinch_at_rest_if_nan(scale: f64, rotation: f64) -> (f64, f64) {
    (
        if scale.is_nan() { 1.0 } else { scale },
        if rotation.is_finite() { rotation } else { 0.0 },
    )
}

fn scale_about(scale: f64, rotation: f64, centre: Point) -> Affine {
    let to_origin = centre.to_vec2();
    Affine::translate(to_origin)
        * Affine::rotate(rotation)
        * Affine::scale(scale)
        * Affine::translate(-to_origin)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker(directions: DismissDirection) -> DismissGestureTracker {
        let settings = GestureSettings {
            directions,
            ..GestureSettings::default()
        };
        DismissGestureTracker::new(settings, Size::new(400.0, 800.0))
    }

    fn close(a: Point, b: Point) -> bool {
        (a - b).hypot() < 1e-9
    }

    #[test]
    fn pan_against_allowed_edges_never_begins() {
        let mut t = tracker(DismissDirection::BOTTOM);
        assert_eq!(t.pan(GesturePhase::Began, Vec2::new(0.0, -20.0)), GestureResponse::Ignored);
        assert_eq!(t.pan(GesturePhase::Began, Vec2::new(30.0, 0.0)), GestureResponse::Ignored);
        assert!(!t.is_tracking());
        assert!(matches!(
            t.pan(GesturePhase::Began, Vec2::new(0.0, 1.0)),
            GestureResponse::Began(_)
        ));
    }

    #[test]
    fn pan_progress_follows_the_favoured_edge() {
        let t = tracker(DismissDirection::ALL);
        assert_eq!(t.pan_progress(Vec2::new(0.0, 400.0)), 0.5);
        assert_eq!(t.pan_progress(Vec2::new(-100.0, 0.0)), 0.25);
        assert_eq!(t.pan_progress(Vec2::new(0.0, 4000.0)), 1.0);

        let vertical = tracker(DismissDirection::TOP | DismissDirection::BOTTOM);
        assert_eq!(vertical.pan_progress(Vec2::new(-100.0, 0.0)), 0.0);
    }

    #[test]
    fn pan_shrinks_about_the_content_centre_then_translates() {
        let mut t = tracker(DismissDirection::ALL);
        t.set_content_bounds(Rect::new(0.0, 0.0, 400.0, 400.0));
        // Half the screen height at factor 0.5 gives scale 0.75.
        let transform = t.pan_transform(Vec2::new(0.0, 400.0));
        let centre = Point::new(200.0, 200.0);
        assert!(close(transform * centre, Point::new(200.0, 600.0)));
        assert!(close(transform * Point::ORIGIN, Point::new(50.0, 450.0)));
    }

    #[test]
    fn pan_release_commits_only_past_the_drag_threshold() {
        let mut t = tracker(DismissDirection::ALL);
        let GestureResponse::Began(c) = t.pan(GesturePhase::Began, Vec2::new(0.0, 5.0)) else {
            panic!("pan should begin");
        };
        t.pan(GesturePhase::Changed, Vec2::new(0.0, 20.0));
        assert_eq!(
            t.pan(GesturePhase::Ended, Vec2::new(0.0, 20.0)),
            GestureResponse::Ended(DismissOutcome::Cancelled)
        );
        assert_eq!(c.outcome(), Some(DismissOutcome::Cancelled));
        assert!(!t.is_tracking());

        t.pan(GesturePhase::Began, Vec2::new(0.0, 5.0));
        assert_eq!(
            t.pan(GesturePhase::Ended, Vec2::new(0.0, 60.0)),
            GestureResponse::Ended(DismissOutcome::Finished)
        );
    }

    #[test]
    fn pinch_progress_and_system_cancel() {
        let mut t = tracker(DismissDirection::ALL);
        let GestureResponse::Began(c) = t.pinch(GesturePhase::Began, 1.0, 0.0, Point::ORIGIN)
        else {
            panic!("pinch should begin");
        };
        assert_eq!(
            t.pinch(GesturePhase::Changed, 0.6, 0.3, Point::new(200.0, 400.0)),
            GestureResponse::Updated { progress: 0.4 }
        );
        assert!((c.progress() - 0.4).abs() < 1e-12);
        // A pan cannot hijack a live pinch.
        assert_eq!(t.pan(GesturePhase::Ended, Vec2::new(0.0, 500.0)), GestureResponse::Ignored);
        assert_eq!(
            t.pinch(GesturePhase::Cancelled, 0.2, 0.0, Point::ORIGIN),
            GestureResponse::Ended(DismissOutcome::Cancelled)
        );
    }

    #[test]
    fn pinch_release_uses_its_own_threshold() {
        let mut t = tracker(DismissDirection::ALL);
        t.pinch(GesturePhase::Began, 1.0, 0.0, Point::ORIGIN);
        assert_eq!(
            t.pinch(GesturePhase::Ended, 0.95, 0.0, Point::ORIGIN),
            GestureResponse::Ended(DismissOutcome::Cancelled)
        );
        t.pinch(GesturePhase::Began, 1.0, 0.0, Point::ORIGIN);
        assert_eq!(
            t.pinch(GesturePhase::Ended, 0.8, 0.0, Point::ORIGIN),
            GestureResponse::Ended(DismissOutcome::Finished)
        );
    }

    #[test]
    fn nan_pinch_reads_as_no_pinch() {
        let mut t = tracker(DismissDirection::ALL);
        let GestureResponse::Began(c) = t.pinch(GesturePhase::Began, 1.0, 0.0, Point::ORIGIN)
        else {
            panic!("pinch should begin");
        };
        let centre = Point::new(200.0, 400.0);
        assert_eq!(
            t.pinch(GesturePhase::Changed, f64::NAN, f64::NAN, centre),
            GestureResponse::Updated { progress: 0.0 }
        );
        assert_eq!(c.progress(), 0.0);
        let transform = t.pinch_transform(f64::NAN, f64::INFINITY, centre);
        assert!(close(transform * Point::new(10.0, 20.0), Point::new(10.0, 20.0)));
        assert_eq!(
            t.pinch(GesturePhase::Ended, f64::NAN, 0.0, centre),
            GestureResponse::Ended(DismissOutcome::Cancelled)
        );
    }

    #[test]
    fn pinch_rotates_about_the_content_centre() {
        let t = tracker(DismissDirection::ALL);
        let centre = Point::new(200.0, 400.0);
        let transform = t.pinch_transform(0.5, core::f64::consts::FRAC_PI_2, centre);
        assert!(close(transform * centre, centre));
        assert!(close(transform * Point::new(300.0, 400.0), Point::new(200.0, 450.0)));
    }
}
