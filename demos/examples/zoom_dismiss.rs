// Copyright 2026 the Lightbox Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Zooming a thumbnail into the viewer, then dragging it back down.
//!
//! The stage prints every instruction a real view layer would carry out.
//! The dismissal is interactive: pan events feed a `DismissGestureTracker`,
//! whose controller drives the outgoing zoom until the finger lifts.
//!
//! Run:
//! - `cargo run -p lightbox_demos --example zoom_dismiss`
//! - `RUST_LOG=lightbox_transition=debug cargo run -p lightbox_demos --example zoom_dismiss`

use core::time::Duration;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use kurbo::{Affine, Rect, Size, Vec2};
use lightbox_pager::{ViewerOptions, fit_rect};
use lightbox_sequence::{MediaKind, MediaResource};
use lightbox_transition::{
    AnimationOption, ContentMode, DismissGestureTracker, GesturePhase, GestureResponse,
    InteractiveDismissController, LargeViewProvider, SmallViewDescriptor, SnapshotLayer,
    TransitionCoordinator, TransitionDelegate, TransitionFactory, TransitionPhase,
    TransitionStage, UserAnimation, ViewId, ZoomDirection, ZoomTransition,
};
use parking_lot::Mutex;
use tracing_subscriber::EnvFilter;

const SCREEN: Size = Size::new(390.0, 844.0);
const FRAME: Duration = Duration::from_millis(16);

/// The full-screen viewer showing one photo.
struct Viewer {
    photo: MediaResource,
    hidden: AtomicBool,
    gesture: Mutex<Option<InteractiveDismissController>>,
}

impl LargeViewProvider for Viewer {
    fn current_frame(&self) -> Option<Rect> {
        fit_rect(self.photo.valid_content_size()?, SCREEN.to_rect())
    }

    fn current_image(&self) -> Option<MediaResource> {
        Some(self.photo.clone())
    }

    fn set_current_hidden(&self, hidden: bool) {
        self.hidden.store(hidden, Ordering::SeqCst);
    }

    fn is_current_hidden(&self) -> bool {
        self.hidden.load(Ordering::SeqCst)
    }

    fn interactive_controller(&self) -> Option<InteractiveDismissController> {
        self.gesture.lock().clone()
    }
}

/// Prints view operations instead of performing them.
struct PrintStage {
    interactive: bool,
    next: u64,
}

impl PrintStage {
    fn new(interactive: bool) -> Box<Self> {
        Box::new(Self {
            interactive,
            next: 0,
        })
    }
}

impl TransitionStage for PrintStage {
    fn is_interactive(&self) -> bool {
        self.interactive
    }

    fn snapshot(&mut self, layer: SnapshotLayer) -> Option<ViewId> {
        self.next += 1;
        println!("  stage: snapshot {layer:?} -> #{}", self.next);
        Some(ViewId(self.next))
    }

    fn add_image_view(&mut self, image: &MediaResource, frame: Rect, mode: ContentMode) -> ViewId {
        self.next += 1;
        println!("  stage: image view #{} for {} at {frame:?} ({mode:?})", self.next, image.id());
        ViewId(self.next)
    }

    fn set_frame(&mut self, _: ViewId, _: Rect) {}

    fn set_content_mode(&mut self, view: ViewId, mode: ContentMode) {
        println!("  stage: #{} content mode {mode:?}", view.0);
    }

    fn set_transform(&mut self, _: ViewId, _: Affine) {}

    fn set_opacity(&mut self, _: ViewId, _: f64) {}

    fn remove(&mut self, view: ViewId) {
        println!("  stage: remove #{}", view.0);
    }

    fn complete_transition(&mut self, completed: bool) {
        println!("  stage: complete (completed: {completed})");
    }
}

/// Builds zooms for the viewer scene; the grid scene animates normally.
struct Factory {
    viewer: Arc<Viewer>,
    thumbnail: SmallViewDescriptor,
    option: AnimationOption,
    options: ViewerOptions,
    delegate: Arc<dyn TransitionDelegate>,
}

#[derive(Debug, PartialEq)]
enum Scene {
    Grid,
    Viewer,
}

impl TransitionFactory<Scene> for Factory {
    fn build_transition(&self, direction: ZoomDirection, scene: &Scene) -> Option<ZoomTransition> {
        if *scene != Scene::Viewer {
            return None;
        }
        let transition = match direction {
            ZoomDirection::Incoming => {
                ZoomTransition::incoming(self.thumbnail.clone(), self.viewer.clone())
            }
            ZoomDirection::Outgoing => {
                ZoomTransition::outgoing(self.viewer.clone(), self.thumbnail.clone())
            }
        };
        Some(
            transition
                .with_config(self.options.transition_config(self.option))
                .with_delegate(Arc::downgrade(&self.delegate)),
        )
    }
}

/// Prints the interesting delegate callbacks.
struct Narrator;

impl TransitionDelegate for Narrator {
    fn will_begin(&self, transition: &ZoomTransition) {
        println!("  delegate: {:?} zoom will begin", transition.direction());
    }

    fn user_animation(&self, _: &ZoomTransition, frame: &UserAnimation) {
        if frame.interactive {
            println!("  delegate: dimming overlay to {:.2}", 1.0 - frame.progress);
        }
    }

    fn did_finish(&self, _: &ZoomTransition, completed: bool) {
        println!("  delegate: finished (completed: {completed})");
    }
}

fn run(transition: &ZoomTransition) {
    let mut frames = 0;
    while transition.tick(FRAME) != TransitionPhase::Finished {
        frames += 1;
    }
    println!("  ran {frames} frames -> {:?}", transition.outcome());
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let photo = MediaResource::new("beach-2", MediaKind::Image);
    photo.set_content_size(Size::new(4032.0, 3024.0));
    let viewer = Arc::new(Viewer {
        photo: photo.clone(),
        hidden: AtomicBool::new(false),
        gesture: Mutex::new(None),
    });
    let options = ViewerOptions::default();
    let factory: Arc<dyn TransitionFactory<Scene>> = Arc::new(Factory {
        viewer: viewer.clone(),
        thumbnail: SmallViewDescriptor {
            frame: Some(Rect::new(130.0, 300.0, 260.0, 430.0)),
            content_mode: ContentMode::AspectFill,
            image: Some(photo),
        },
        option: AnimationOption::FALLBACK,
        options,
        delegate: Arc::new(Narrator),
    });
    let coordinator = TransitionCoordinator::new(Arc::downgrade(&factory));

    println!("tap the thumbnail");
    if let Some(zoom) = coordinator.presentation(&Scene::Viewer) {
        zoom.start(PrintStage::new(false));
        run(&zoom);
    }

    println!("drag the photo down");
    let mut tracker = DismissGestureTracker::new(options.gesture_settings(), SCREEN);
    if let Some(frame) = viewer.current_frame() {
        tracker.set_content_bounds(frame);
    }
    let GestureResponse::Began(controller) = tracker.pan(GesturePhase::Began, Vec2::new(0.0, 6.0))
    else {
        println!("  gesture refused");
        return;
    };
    *viewer.gesture.lock() = Some(controller);

    let Some(zoom) = coordinator.dismissal(&Scene::Viewer) else {
        return;
    };
    let interactive = coordinator.interaction_for(&zoom).is_some();
    println!("  interactive: {interactive}");
    zoom.start(PrintStage::new(interactive));
    for y in [40.0, 90.0, 160.0, 210.0] {
        tracker.pan(GesturePhase::Changed, Vec2::new(0.0, y));
    }
    let released = tracker.pan(GesturePhase::Ended, Vec2::new(0.0, 210.0));
    println!("  released: {released:?}");
    *viewer.gesture.lock() = None;
    run(&zoom);
    println!("grid scene visible; viewer hidden: {}", viewer.is_current_hidden());

    if coordinator.presentation(&Scene::Grid).is_none() {
        println!("pushing another grid uses the platform animation");
    }
}
