// Copyright 2026 the Lightbox Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Addressable media items.

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use kurbo::Size;
use parking_lot::Mutex;

use crate::observer::{ObserverList, Subscription};

/// Kind of media a resource holds; selects the [`Renderer`](crate::Renderer) used to draw it.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MediaKind {
    /// A still image.
    Image,
    /// A still image paired with a short motion clip.
    LivePhoto,
    /// A multi-frame image such as a GIF.
    AnimatedImage,
    /// A host-defined kind, distinguished by its tag.
    Custom(u32),
    /// Kind not known yet.
    #[default]
    Unspecified,
}

/// Stable identity of a [`MediaResource`].
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceId(Arc<str>);

impl ResourceId {
    /// Returns the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ResourceId {
    fn from(id: &str) -> Self {
        Self(Arc::from(id))
    }
}

impl From<String> for ResourceId {
    fn from(id: String) -> Self {
        Self(Arc::from(id))
    }
}

impl fmt::Debug for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Returns `true` if both dimensions of `size` are strictly positive.
///
/// Content sizes start at zero and must pass this check before they are
/// used for layout.
pub fn is_valid_size(size: Size) -> bool {
    size.width > 0.0 && size.height > 0.0
}

struct ResourceInner {
    id: ResourceId,
    kind: MediaKind,
    payload: Option<Arc<dyn Any + Send + Sync>>,
    content_size: Mutex<Size>,
    removing: AtomicBool,
    size_observers: ObserverList<Size>,
}

/// A single media item.
///
/// `MediaResource` is a cheap, shareable handle: clones refer to the same
/// item. Two resources are equal iff their identifiers match.
///
/// The caller owns whatever data is needed to fetch the pixels and attaches
/// it as a payload; renderers downcast it with [`MediaResource::payload`].
#[derive(Clone)]
pub struct MediaResource {
    inner: Arc<ResourceInner>,
}

impl MediaResource {
    /// Creates a resource without a payload.
    pub fn new(id: impl Into<ResourceId>, kind: MediaKind) -> Self {
        Self::build(id.into(), kind, None)
    }

    /// Creates a resource carrying `payload` for its renderer.
    pub fn with_payload<P>(id: impl Into<ResourceId>, kind: MediaKind, payload: P) -> Self
    where
        P: Any + Send + Sync,
    {
        Self::build(id.into(), kind, Some(Arc::new(payload)))
    }

    fn build(id: ResourceId, kind: MediaKind, payload: Option<Arc<dyn Any + Send + Sync>>) -> Self {
        Self {
            inner: Arc::new(ResourceInner {
                id,
                kind,
                payload,
                content_size: Mutex::new(Size::ZERO),
                removing: AtomicBool::new(false),
                size_observers: ObserverList::new(),
            }),
        }
    }

    /// The stable identifier.
    pub fn id(&self) -> &ResourceId {
        &self.inner.id
    }

    /// The media kind.
    pub fn kind(&self) -> MediaKind {
        self.inner.kind
    }

    /// Returns the payload if it has type `P`.
    pub fn payload<P: Any>(&self) -> Option<&P> {
        self.inner.payload.as_deref()?.downcast_ref::<P>()
    }

    /// The content size reported by the renderer, or [`Size::ZERO`] until known.
    pub fn content_size(&self) -> Size {
        *self.inner.content_size.lock()
    }

    /// The content size, if it has been reported and is valid for layout.
    pub fn valid_content_size(&self) -> Option<Size> {
        let size = self.content_size();
        is_valid_size(size).then_some(size)
    }

    /// Records the real content size and notifies size observers if it changed.
    ///
    /// Returns `true` if the stored size changed.
    pub fn set_content_size(&self, size: Size) -> bool {
        {
            let mut current = self.inner.content_size.lock();
            if *current == size {
                return false;
            }
            *current = size;
        }
        tracing::trace!(id = %self.id(), width = size.width, height = size.height, "content size changed");
        self.inner.size_observers.notify(&size);
        true
    }

    /// Observes content size changes until the returned subscription is dropped.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn observe_content_size(
        &self,
        observer: impl Fn(&Size) + Send + Sync + 'static,
    ) -> Subscription {
        self.inner.size_observers.subscribe(observer)
    }

    /// Returns `true` while a deletion of this resource is in flight.
    pub fn is_removing(&self) -> bool {
        self.inner.removing.load(Ordering::Acquire)
    }

    /// Marks this resource as being removed.
    ///
    /// Returns `None` if a removal is already in flight. The flag is cleared
    /// when the returned guard is dropped.
    pub fn begin_removal(&self) -> Option<RemovalGuard> {
        self.inner
            .removing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RemovalGuard {
                resource: self.clone(),
            })
    }
}

impl PartialEq for MediaResource {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for MediaResource {}

impl Hash for MediaResource {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl fmt::Debug for MediaResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaResource")
            .field("id", &self.inner.id)
            .field("kind", &self.inner.kind)
            .field("content_size", &self.content_size())
            .field("removing", &self.is_removing())
            .finish_non_exhaustive()
    }
}

/// Holds the removing flag of a resource; dropping it clears the flag.
#[derive(Debug)]
pub struct RemovalGuard {
    resource: MediaResource,
}

impl RemovalGuard {
    /// The resource being removed.
    pub fn resource(&self) -> &MediaResource {
        &self.resource
    }
}

impl Drop for RemovalGuard {
    fn drop(&mut self) {
        self.resource.inner.removing.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn equality_is_by_identifier() {
        let a = MediaResource::new("a", MediaKind::Image);
        let b = MediaResource::new("a", MediaKind::AnimatedImage);
        let c = MediaResource::new("c", MediaKind::Image);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn payload_downcasts_to_its_own_type_only() {
        let r = MediaResource::with_payload("p", MediaKind::Image, String::from("file:///a.png"));
        assert_eq!(r.payload::<String>().map(String::as_str), Some("file:///a.png"));
        assert!(r.payload::<u32>().is_none());
        assert!(MediaResource::new("q", MediaKind::Image).payload::<String>().is_none());
    }

    #[test]
    fn content_size_starts_invalid_and_notifies_on_change() {
        let r = MediaResource::new("s", MediaKind::Image);
        assert_eq!(r.valid_content_size(), None);

        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let _sub = r.observe_content_size(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(r.set_content_size(Size::new(400.0, 300.0)));
        assert!(!r.set_content_size(Size::new(400.0, 300.0)));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(r.valid_content_size(), Some(Size::new(400.0, 300.0)));
        assert!(!is_valid_size(Size::new(0.0, 10.0)));
    }

    #[test]
    fn removal_guard_blocks_duplicates_until_dropped() {
        let r = MediaResource::new("d", MediaKind::Image);
        let guard = r.begin_removal().expect("first removal starts");
        assert!(r.is_removing());
        assert!(r.clone().begin_removal().is_none());
        drop(guard);
        assert!(!r.is_removing());
        assert!(r.begin_removal().is_some());
    }
}
