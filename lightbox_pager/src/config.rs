// Copyright 2026 the Lightbox Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host-supplied options for a viewer.

use core::time::Duration;
use std::fmt;
use std::sync::Arc;

use kurbo::Size;
use lightbox_sequence::PathAddress;
use lightbox_transition::{AnimationOption, DismissDirection, GestureSettings, TransitionConfig};

use crate::ContentLayout;
use crate::layout::default_layout;

/// What a single tap on the viewer does.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TapAction {
    /// Switch between normal and immersive presentation.
    #[default]
    ToggleImmersiveMode,
    /// Close the viewer.
    Dismiss,
}

/// Whether chrome is shown around the media.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ImmersiveMode {
    /// Bars and buttons visible.
    #[default]
    Normal,
    /// Media only, on black.
    Immersive,
}

impl ImmersiveMode {
    /// The other mode.
    pub fn toggled(self) -> Self {
        match self {
            Self::Normal => Self::Immersive,
            Self::Immersive => Self::Normal,
        }
    }

    /// This mode as a set.
    pub fn as_set(self) -> ImmersiveModes {
        match self {
            Self::Normal => ImmersiveModes::NORMAL,
            Self::Immersive => ImmersiveModes::IMMERSIVE,
        }
    }
}

bitflags::bitflags! {
    /// A set of [`ImmersiveMode`]s.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct ImmersiveModes: u8 {
        /// [`ImmersiveMode::Normal`].
        const NORMAL = 1 << 0;
        /// [`ImmersiveMode::Immersive`].
        const IMMERSIVE = 1 << 1;
    }
}

impl ImmersiveModes {
    /// Returns `true` if `mode` is in the set.
    pub fn allows(self, mode: ImmersiveMode) -> bool {
        self.contains(mode.as_set())
    }
}

impl Default for ImmersiveModes {
    fn default() -> Self {
        Self::all()
    }
}

/// Plain, serialisable viewer options.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ViewerOptions {
    /// How much a dismissing pan shrinks the content at full progress.
    pub interactive_dismiss_scale_factor: f64,
    /// Pan directions that dismiss.
    pub interactive_dismiss_directions: DismissDirection,
    /// What a single tap does.
    pub view_tap_action: TapAction,
    /// Mode the session starts in and resets to.
    pub default_immersive_mode: ImmersiveMode,
    /// Modes the session may enter.
    pub enabled_immersive_modes: ImmersiveModes,
    /// Whether paging wraps around at either end.
    pub loop_navigation: bool,
    /// Pan progress above which releasing commits the dismissal.
    pub drag_dismiss_threshold: f64,
    /// Pinch progress above which releasing commits the dismissal.
    pub pinch_dismiss_threshold: f64,
    /// Tallest aspect shown in full when previewing.
    pub longest_previewing_aspect: Size,
    /// Duration of an uninterrupted zoom.
    pub transition_duration: Duration,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        let gesture = GestureSettings::default();
        Self {
            interactive_dismiss_scale_factor: gesture.scale_factor,
            interactive_dismiss_directions: gesture.directions,
            view_tap_action: TapAction::default(),
            default_immersive_mode: ImmersiveMode::default(),
            enabled_immersive_modes: ImmersiveModes::default(),
            loop_navigation: true,
            drag_dismiss_threshold: gesture.drag_threshold,
            pinch_dismiss_threshold: gesture.pinch_threshold,
            longest_previewing_aspect: Size::new(1.0, 6.0),
            transition_duration: TransitionConfig::default().duration,
        }
    }
}

impl ViewerOptions {
    /// Settings for a [`DismissGestureTracker`](lightbox_transition::DismissGestureTracker).
    pub fn gesture_settings(&self) -> GestureSettings {
        GestureSettings {
            directions: self.interactive_dismiss_directions,
            scale_factor: self.interactive_dismiss_scale_factor,
            drag_threshold: self.drag_dismiss_threshold,
            pinch_threshold: self.pinch_dismiss_threshold,
        }
    }

    /// Timing for zoom transitions, using `option` for the curve.
    pub fn transition_config(&self, option: AnimationOption) -> TransitionConfig {
        TransitionConfig {
            duration: self.transition_duration,
            option,
        }
    }
}

type UserToPaging = dyn Fn(&PathAddress, usize) -> PathAddress + Send + Sync;
type PagingToUser = dyn Fn(&PathAddress, &PathAddress) -> PathAddress + Send + Sync;
type LayoutHook = dyn Fn(Size) -> Option<ContentLayout> + Send + Sync;

/// [`ViewerOptions`] plus the hooks that cannot be serialised.
///
/// ```rust
/// use lightbox_pager::ViewerConfig;
/// use lightbox_sequence::PathAddress;
///
/// let config = ViewerConfig::default();
/// // A host addressing `[section, album, item]` into a list of albums.
/// let user = PathAddress::from([3, 1, 4]);
/// let paging = config.paging_address(&user, 2);
/// assert_eq!(paging, PathAddress::from([1, 4]));
/// assert_eq!(
///     config.user_address(&user, &PathAddress::from([0, 2])),
///     PathAddress::from([3, 0, 2])
/// );
/// ```
#[derive(Clone, Default)]
pub struct ViewerConfig {
    /// The plain options.
    pub options: ViewerOptions,
    user_to_paging: Option<Arc<UserToPaging>>,
    paging_to_user: Option<Arc<PagingToUser>>,
    content_layout: Option<Arc<LayoutHook>>,
}

impl ViewerConfig {
    /// A config with the given options and default hooks.
    pub fn new(options: ViewerOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Replaces the user→paging mapping.
    ///
    /// The hook receives the user address and the sequence depth and must
    /// return an address of exactly that depth.
    #[must_use]
    pub fn with_user_to_paging(
        mut self,
        hook: impl Fn(&PathAddress, usize) -> PathAddress + Send + Sync + 'static,
    ) -> Self {
        self.user_to_paging = Some(Arc::new(hook));
        self
    }

    /// Replaces the paging→user mapping.
    ///
    /// The hook receives the user start address as a template and a paging address.
    #[must_use]
    pub fn with_paging_to_user(
        mut self,
        hook: impl Fn(&PathAddress, &PathAddress) -> PathAddress + Send + Sync + 'static,
    ) -> Self {
        self.paging_to_user = Some(Arc::new(hook));
        self
    }

    /// Overrides the layout chosen for a content size; `None` falls back to the default rule.
    #[must_use]
    pub fn with_content_layout(
        mut self,
        hook: impl Fn(Size) -> Option<ContentLayout> + Send + Sync + 'static,
    ) -> Self {
        self.content_layout = Some(Arc::new(hook));
        self
    }

    /// Replaces the plain options.
    #[must_use]
    pub fn with_options(mut self, options: ViewerOptions) -> Self {
        self.options = options;
        self
    }

    /// Translates a user address into a paging address of `depth` segments.
    ///
    /// By default the last `depth` segments are kept.
    pub fn paging_address(&self, user: &PathAddress, depth: usize) -> PathAddress {
        match &self.user_to_paging {
            Some(hook) => hook(user, depth),
            None => user.suffix(depth),
        }
    }

    /// Translates a paging address back into the user's scheme.
    ///
    /// By default the template's last `paging.len()` segments are replaced.
    pub fn user_address(&self, template: &PathAddress, paging: &PathAddress) -> PathAddress {
        match &self.paging_to_user {
            Some(hook) => hook(template, paging),
            None => template.drop_last(paging.len()).concat(paging),
        }
    }

    /// Layout for content of `size` on a screen of `screen`, or `None` for an invalid size.
    pub fn content_layout(&self, size: Size, screen: Size) -> Option<ContentLayout> {
        if !lightbox_sequence::is_valid_size(size) {
            return None;
        }
        self.content_layout
            .as_ref()
            .and_then(|hook| hook(size))
            .or_else(|| default_layout(size, screen))
    }
}

impl fmt::Debug for ViewerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewerConfig")
            .field("options", &self.options)
            .field("user_to_paging", &self.user_to_paging.is_some())
            .field("paging_to_user", &self.paging_to_user.is_some())
            .field("content_layout", &self.content_layout.is_some())
            .finish()
    }
}
