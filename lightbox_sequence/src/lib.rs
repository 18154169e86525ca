// Copyright 2026 the Lightbox Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lightbox Sequence: nested media collections and their addressing.
//!
//! This crate is the data model underneath a full-screen media viewer:
//! - **Resources** ([`MediaResource`]) are shareable handles to a single item: an identifier,
//!   a [`MediaKind`], an opaque payload for the renderer, and a content size that starts
//!   unknown and is reported later.
//! - **Addresses** ([`PathAddress`]) locate a resource by integer path: `[i]` in a flat list,
//!   `[album, i]` in a list of albums, and so on.
//! - **Sequences** ([`ResourceSequence`]) are the nested collections. A resource is a sequence
//!   of depth zero and a `Vec` of depth-`n` sequences is a sequence of depth `n + 1`, so the
//!   nesting depth is fixed by the type.
//! - **Renderers** ([`Renderer`] / [`RendererRegistry`]) draw a resource into a host target,
//!   selected by kind.
//!
//! Neighbour queries and wraparound operate on the *flattened order*: the depth-first reading
//! order of the nested collection.
//!
//! ## Minimal example
//!
//! ```rust
//! use lightbox_sequence::{MediaKind, MediaResource, PathAddress, ResourceSequence};
//!
//! let photo = |id: &str| MediaResource::new(id, MediaKind::Image);
//! let mut albums = vec![
//!     vec![photo("beach-1"), photo("beach-2")],
//!     vec![photo("city-1")],
//! ];
//!
//! // Reading order crosses album boundaries.
//! let at = albums.address_of(&photo("beach-2")).unwrap();
//! assert_eq!(at, PathAddress::from([0, 1]));
//! assert_eq!(albums.next_after(&at, false), Some(PathAddress::from([1, 0])));
//!
//! // Removing a resource shifts its later siblings down.
//! let removed = albums.remove_at(&[0, 0]).unwrap();
//! assert_eq!(removed.id().as_str(), "beach-1");
//! assert_eq!(albums.get(&[0, 0]).unwrap().id().as_str(), "beach-2");
//! ```
//!
//! ## Observing resources
//!
//! Content sizes arrive asynchronously. Interested parties register a closure with
//! [`MediaResource::observe_content_size`] and keep the returned [`Subscription`] alive for as
//! long as they care; dropping it unsubscribes. [`ObserverList`] is the same mechanism exposed
//! for other notifications.
//!
//! ## Features
//!
//! - `serde`: derives `Serialize`/`Deserialize` for [`PathAddress`] and [`MediaKind`].

mod address;
mod error;
mod observer;
mod render;
mod resource;
mod sequence;

pub use address::PathAddress;
pub use error::SequenceError;
pub use observer::{ObserverList, Subscription};
pub use render::{Renderer, RendererRegistry};
pub use resource::{MediaKind, MediaResource, RemovalGuard, ResourceId, is_valid_size};
pub use sequence::{Direction, ResourceSequence};
