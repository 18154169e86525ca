// Copyright 2026 the Lightbox Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-kind rendering strategies.

use std::fmt;
use std::sync::Arc;

use hashbrown::HashMap;
use kurbo::Size;

use crate::{MediaKind, MediaResource};

/// Draws a resource into a host-defined target.
///
/// Implementations decode or fetch pixels however they like. They return the
/// content size if it is known synchronously; otherwise they report it later
/// through [`MediaResource::set_content_size`], which notifies the core.
///
/// A renderer is invoked once each time a resource is displayed and again
/// whenever the resource's underlying data changes.
pub trait Renderer<T: ?Sized>: Send + Sync {
    /// Renders `resource` into `target`.
    fn render(&self, resource: &MediaResource, target: &mut T) -> Option<Size>;
}

impl<T, F> Renderer<T> for F
where
    T: ?Sized,
    F: Fn(&MediaResource, &mut T) -> Option<Size> + Send + Sync,
{
    fn render(&self, resource: &MediaResource, target: &mut T) -> Option<Size> {
        self(resource, target)
    }
}

/// Maps each [`MediaKind`] to the [`Renderer`] that handles it.
///
/// ```rust
/// use kurbo::Size;
/// use lightbox_sequence::{MediaKind, MediaResource, RendererRegistry};
///
/// let mut registry: RendererRegistry<Vec<String>> = RendererRegistry::new();
/// registry.register(MediaKind::Image, |r: &MediaResource, out: &mut Vec<String>| {
///     out.push(format!("still {}", r.id()));
///     Some(Size::new(640.0, 480.0))
/// });
///
/// let photo = MediaResource::new("p1", MediaKind::Image);
/// let mut log = Vec::new();
/// assert!(registry.render(&photo, &mut log));
/// assert_eq!(photo.content_size(), Size::new(640.0, 480.0));
/// assert_eq!(log, ["still p1"]);
/// ```
pub struct RendererRegistry<T: ?Sized> {
    by_kind: HashMap<MediaKind, Arc<dyn Renderer<T>>>,
    fallback: Option<Arc<dyn Renderer<T>>>,
}

impl<T: ?Sized> RendererRegistry<T> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            by_kind: HashMap::new(),
            fallback: None,
        }
    }

    /// Registers `renderer` for `kind`, replacing any previous one.
    pub fn register(&mut self, kind: MediaKind, renderer: impl Renderer<T> + 'static) -> &mut Self {
        self.by_kind.insert(kind, Arc::new(renderer));
        self
    }

    /// Sets the renderer used for kinds without a dedicated one.
    pub fn set_fallback(&mut self, renderer: impl Renderer<T> + 'static) -> &mut Self {
        self.fallback = Some(Arc::new(renderer));
        self
    }

    /// The renderer that would handle `kind`.
    pub fn renderer_for(&self, kind: MediaKind) -> Option<&Arc<dyn Renderer<T>>> {
        self.by_kind.get(&kind).or(self.fallback.as_ref())
    }

    /// Renders `resource` with the renderer for its kind.
    ///
    /// A synchronously known size is stored on the resource. Returns `false`
    /// if no renderer handles the resource's kind.
    pub fn render(&self, resource: &MediaResource, target: &mut T) -> bool {
        let Some(renderer) = self.renderer_for(resource.kind()) else {
            tracing::warn!(id = %resource.id(), kind = ?resource.kind(), "no renderer for media kind");
            return false;
        };
        if let Some(size) = renderer.render(resource, target) {
            resource.set_content_size(size);
        }
        true
    }
}

impl<T: ?Sized> Default for RendererRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> Clone for RendererRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            by_kind: self.by_kind.clone(),
            fallback: self.fallback.clone(),
        }
    }
}

impl<T: ?Sized> fmt::Debug for RendererRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RendererRegistry")
            .field("kinds", &self.by_kind.keys().collect::<Vec<_>>())
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Surface {
        drawn: Vec<&'static str>,
    }

    fn tagged(tag: &'static str) -> impl Renderer<Surface> {
        move |_: &MediaResource, s: &mut Surface| {
            s.drawn.push(tag);
            None
        }
    }

    #[test]
    fn dispatches_on_kind_with_fallback() {
        let mut registry = RendererRegistry::new();
        registry
            .register(MediaKind::Image, tagged("image"))
            .register(MediaKind::AnimatedImage, tagged("gif"))
            .set_fallback(tagged("fallback"));

        let mut surface = Surface::default();
        for kind in [
            MediaKind::Image,
            MediaKind::AnimatedImage,
            MediaKind::LivePhoto,
            MediaKind::Custom(7),
        ] {
            assert!(registry.render(&MediaResource::new("r", kind), &mut surface));
        }
        assert_eq!(surface.drawn, ["image", "gif", "fallback", "fallback"]);
    }

    #[test]
    fn unhandled_kind_reports_false() {
        let registry: RendererRegistry<Surface> = RendererRegistry::new();
        let mut surface = Surface::default();
        assert!(!registry.render(&MediaResource::new("r", MediaKind::Image), &mut surface));
        assert!(surface.drawn.is_empty());
    }

    #[test]
    fn synchronous_size_is_stored_on_resource() {
        let mut registry = RendererRegistry::new();
        registry.register(MediaKind::Image, |_: &MediaResource, _: &mut Surface| {
            Some(Size::new(3.0, 2.0))
        });
        let r = MediaResource::new("r", MediaKind::Image);
        registry.render(&r, &mut Surface::default());
        assert_eq!(r.valid_content_size(), Some(Size::new(3.0, 2.0)));
    }
}
