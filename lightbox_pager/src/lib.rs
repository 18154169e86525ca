// Copyright 2026 the Lightbox Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lightbox Pager: the viewer's navigation and presentation state.
//!
//! - [`PageNavigator`] owns a [`ResourceSequence`](lightbox_sequence::ResourceSequence) and the
//!   current address. It answers "what comes before/after this page", scrolls on request, and
//!   runs the confirm-then-delete flow, re-settling on a neighbour or dismissing the viewer when
//!   nothing is left. Hosts plug in through [`PagingHost`].
//! - [`ViewerConfig`] carries the host's options and the hooks that translate between the
//!   host's addresses and the sequence's own.
//! - [`ViewerSession`] holds immersive mode and the tap action for one viewer.
//! - [`fit_rect`], [`ContentLayout`] and [`previewing_size`] place content of a known size.
//!
//! ## Features
//!
//! - `serde`: derives `Serialize`/`Deserialize` for [`ViewerOptions`] and the types it holds.

mod config;
mod error;
mod layout;
mod navigator;
mod session;

pub use config::{ImmersiveMode, ImmersiveModes, TapAction, ViewerConfig, ViewerOptions};
pub use error::NavigatorError;
pub use layout::{ContentLayout, ContentPosition, fit_rect, portrait, previewing_size};
pub use navigator::{DeleteReply, PageNavigator, PagingHost, ScrollTicket};
pub use session::ViewerSession;
