// Copyright 2026 the Lightbox Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Placing content of a known size on screen.

use kurbo::{Rect, Size};
use lightbox_sequence::is_valid_size;

/// Vertical anchor for content wider than the screen's aspect.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ContentPosition {
    /// Pinned to the top; the rest scrolls.
    Top,
    /// Centred vertically.
    #[default]
    Center,
}

/// How content is fitted to the viewer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ContentLayout {
    /// Letterboxed inside the screen.
    FitScreen,
    /// Full width; tall content overflows vertically.
    FitWidth(ContentPosition),
}

impl ContentLayout {
    /// Frame for content of `size` inside `bounds`, or `None` for an invalid size.
    pub fn frame(self, size: Size, bounds: Rect) -> Option<Rect> {
        match self {
            Self::FitScreen => fit_rect(size, bounds),
            Self::FitWidth(position) => {
                if !is_valid_size(size) {
                    return None;
                }
                let height = bounds.width() * size.height / size.width;
                let y0 = match position {
                    ContentPosition::Top => bounds.y0,
                    ContentPosition::Center => bounds.center().y - height / 2.0,
                };
                Some(Rect::new(bounds.x0, y0, bounds.x1, y0 + height))
            }
        }
    }
}

/// The largest rect with the aspect of `aspect`, centred in `bounds`.
///
/// Returns `None` unless `aspect` has a positive width and height.
///
/// ```rust
/// use kurbo::{Rect, Size};
/// use lightbox_pager::fit_rect;
///
/// let screen = Rect::new(0.0, 0.0, 400.0, 800.0);
/// assert_eq!(
///     fit_rect(Size::new(2.0, 1.0), screen),
///     Some(Rect::new(0.0, 300.0, 400.0, 500.0))
/// );
/// ```
pub fn fit_rect(aspect: Size, bounds: Rect) -> Option<Rect> {
    if !is_valid_size(aspect) {
        return None;
    }
    let scale = (bounds.width() / aspect.width).min(bounds.height() / aspect.height);
    let size = aspect * scale;
    let center = bounds.center();
    Some(Rect::from_center_size(center, size))
}

/// `screen` rotated to portrait.
pub fn portrait(screen: Size) -> Size {
    Size::new(screen.width.min(screen.height), screen.width.max(screen.height))
}

/// Content wider than the portrait screen fits its width; everything else fits the screen.
pub(crate) fn default_layout(size: Size, screen: Size) -> Option<ContentLayout> {
    if !is_valid_size(size) {
        return None;
    }
    let screen = portrait(screen);
    if screen.height <= 0.0 {
        return Some(ContentLayout::FitScreen);
    }
    if size.width / size.height > screen.width / screen.height {
        Some(ContentLayout::FitWidth(ContentPosition::Center))
    } else {
        Some(ContentLayout::FitScreen)
    }
}

/// Size of a peek preview for content of `content` size.
///
/// Without `previewing`, or without a valid size to go on, the preview
/// fills the screen. `hint` takes precedence over `content`. Content that
/// fits the screen is letterboxed; wider content is shown at least as tall
/// as `longest` would be.
pub fn previewing_size(
    previewing: bool,
    hint: Option<Size>,
    content: Option<Size>,
    screen: Size,
    longest: Size,
) -> Size {
    if !previewing {
        return screen;
    }
    let Some(size) = hint.or(content) else {
        return screen;
    };
    let bounds = screen.to_rect();
    match default_layout(size, screen) {
        Some(ContentLayout::FitScreen) => fit_rect(size, bounds).map_or(screen, |r| r.size()),
        Some(ContentLayout::FitWidth(_)) => {
            let desired = fit_rect(size, bounds);
            match (fit_rect(longest, bounds), desired) {
                (Some(longest), Some(desired)) => longest.union(desired).size(),
                (None, Some(desired)) => desired.size(),
                _ => screen,
            }
        }
        None => screen,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCREEN: Size = Size::new(400.0, 800.0);

    #[test]
    fn fit_rect_letterboxes_both_ways() {
        let bounds = SCREEN.to_rect();
        assert_eq!(
            fit_rect(Size::new(1.0, 4.0), bounds),
            Some(Rect::new(100.0, 0.0, 300.0, 800.0))
        );
        assert_eq!(fit_rect(Size::new(0.0, 4.0), bounds), None);
    }

    #[test]
    fn wide_content_fits_width() {
        assert_eq!(
            default_layout(Size::new(3.0, 2.0), SCREEN),
            Some(ContentLayout::FitWidth(ContentPosition::Center))
        );
        assert_eq!(
            default_layout(Size::new(1.0, 3.0), SCREEN),
            Some(ContentLayout::FitScreen)
        );
        // Landscape screens are judged in portrait.
        assert_eq!(
            default_layout(Size::new(1.0, 1.0), Size::new(800.0, 400.0)),
            Some(ContentLayout::FitWidth(ContentPosition::Center))
        );
    }

    #[test]
    fn fit_width_frames_anchor_as_asked() {
        let bounds = SCREEN.to_rect();
        let size = Size::new(100.0, 400.0);
        assert_eq!(
            ContentLayout::FitWidth(ContentPosition::Top).frame(size, bounds),
            Some(Rect::new(0.0, 0.0, 400.0, 1600.0))
        );
        assert_eq!(
            ContentLayout::FitWidth(ContentPosition::Center).frame(size, bounds),
            Some(Rect::new(0.0, -400.0, 400.0, 1200.0))
        );
    }

    #[test]
    fn previews_grow_to_the_longest_aspect() {
        let square = Some(Size::new(1.0, 1.0));
        assert_eq!(
            previewing_size(false, None, square, SCREEN, Size::new(1.0, 6.0)),
            SCREEN
        );
        assert_eq!(previewing_size(true, None, None, SCREEN, Size::new(1.0, 6.0)), SCREEN);
        assert_eq!(
            previewing_size(true, None, Some(Size::new(1.0, 4.0)), SCREEN, Size::new(1.0, 6.0)),
            Size::new(200.0, 800.0)
        );
        // 4:1 content letterboxes to 400×100; the 1:6 column is ~133×800.
        let preview = previewing_size(
            true,
            Some(Size::new(4.0, 1.0)),
            Some(Size::new(1.0, 4.0)),
            SCREEN,
            Size::new(1.0, 6.0),
        );
        assert_eq!(preview.width, 400.0);
        assert_eq!(preview.height, 800.0);
    }
}
