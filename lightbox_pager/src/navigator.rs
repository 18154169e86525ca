// Copyright 2026 the Lightbox Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paging through a resource sequence, with deletion and insertion.
//!
//! A [`PageNavigator`] owns the sequence and the current address. Hosts see
//! the sequence only through addresses in their own scheme (the *user*
//! address) and through the [`PagingHost`] callbacks.
//!
//! ## Serialisation
//!
//! Every operation runs under one reentrant lock, so a read-then-write such as
//! "find the address, then remove it" is atomic with respect to other threads,
//! while the same thread may nest operations: a deletion re-navigates, and a
//! did-scroll observer may scroll again. Host callbacks and observers always
//! run with the navigator's state released.
//!
//! Delete confirmation is the one point that waits on the host, so it is asked
//! without holding the lock. The committing thread finds the resource again by
//! identity, since the sequence may have changed in between.
//!
//! Did-scroll notifications are queued as the current address changes and
//! delivered in that order, even when an observer scrolls from inside its
//! callback.

use core::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Weak};

use kurbo::Size;
use lightbox_sequence::{
    Direction, MediaResource, ObserverList, PathAddress, RemovalGuard, ResourceSequence,
    Subscription,
};
use parking_lot::ReentrantMutex;

use crate::{NavigatorError, TapAction, ViewerConfig, ViewerSession};

/// The host's paging surface.
pub trait PagingHost: Send + Sync {
    /// A materialised page, ready to be shown.
    type Page;

    /// Builds the page showing `resource`. This is where rendering starts.
    fn make_page(&self, resource: &MediaResource, user_address: &PathAddress) -> Self::Page;

    /// Shows `page`, replacing whatever transition is in flight.
    ///
    /// Call [`PageNavigator::finish_scroll`] once the page is on screen.
    fn set_page(&self, page: Self::Page, direction: Direction, animated: bool);

    /// Puts `page`, rebuilt because its resource's data changed, in place of
    /// the page on screen.
    fn reload_page(&self, page: Self::Page) {
        self.set_page(page, Direction::Forward, false);
    }

    /// Asks whether the resource at `user_address` may be deleted.
    ///
    /// Answer through `reply`, now or later, from any thread. Dropping the
    /// reply unanswered declines. When the deletion was requested from inside
    /// a navigator callback, the navigator is still locked by that thread, so
    /// waiting here for another thread's answer would block.
    fn confirm_delete(&self, user_address: &PathAddress, reply: DeleteReply);

    /// Closes the viewer.
    fn dismiss(&self);

    /// A confirmed deletion removed `resource`, which lived at `user_address`.
    fn resource_removed(&self, user_address: &PathAddress, resource: &MediaResource) {
        let _ = (user_address, resource);
    }

    /// The current resource reported its real size.
    fn content_size_changed(&self, resource: &MediaResource, size: Size) {
        let _ = (resource, size);
    }
}

/// The answer to one [`PagingHost::confirm_delete`] request.
pub struct DeleteReply {
    respond: Option<Box<dyn FnOnce(bool) + Send>>,
}

impl DeleteReply {
    fn new(respond: impl FnOnce(bool) + Send + 'static) -> Self {
        Self {
            respond: Some(Box::new(respond)),
        }
    }

    /// Deletes the resource.
    pub fn confirm(self) {
        self.send(true);
    }

    /// Keeps the resource.
    pub fn deny(self) {
        self.send(false);
    }

    /// Answers with `confirmed`.
    pub fn send(mut self, confirmed: bool) {
        if let Some(respond) = self.respond.take() {
            respond(confirmed);
        }
    }
}

impl Drop for DeleteReply {
    fn drop(&mut self) {
        if self.respond.is_some() {
            tracing::debug!("delete confirmation dropped unanswered; keeping the resource");
        }
    }
}

impl fmt::Debug for DeleteReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeleteReply")
            .field("answered", &self.respond.is_none())
            .finish()
    }
}

/// Identifies one programmatic scroll; see [`PageNavigator::finish_scroll`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ScrollTicket(u64);

struct NavState<S> {
    sequence: S,
    user_start: PathAddress,
    current: PathAddress,
    next_ticket: u64,
    in_flight: Option<ScrollTicket>,
    pending_scrolls: VecDeque<PathAddress>,
    flushing: bool,
    dismissed: bool,
    size_watch: Option<Subscription>,
}

struct Inner<S, H> {
    state: ReentrantMutex<RefCell<NavState<S>>>,
    host: Arc<H>,
    config: ViewerConfig,
    session: Arc<ViewerSession>,
    scrolls: ObserverList<PathAddress>,
}

struct Removal {
    removed: MediaResource,
    user_address: PathAddress,
    flat_index: usize,
    was_current: bool,
    current: Option<MediaResource>,
}

/// Owns a sequence and pages through it for a host.
///
/// Cheap to clone; clones share state.
///
/// ```rust
/// use std::sync::Arc;
/// use lightbox_pager::{DeleteReply, PageNavigator, PagingHost, ViewerConfig, ViewerSession};
/// use lightbox_sequence::{Direction, MediaKind, MediaResource, PathAddress};
///
/// struct Host;
///
/// impl PagingHost for Host {
///     type Page = String;
///     fn make_page(&self, resource: &MediaResource, _: &PathAddress) -> String {
///         resource.id().to_string()
///     }
///     fn set_page(&self, _: String, _: Direction, _: bool) {}
///     fn confirm_delete(&self, _: &PathAddress, reply: DeleteReply) {
///         reply.confirm();
///     }
///     fn dismiss(&self) {}
/// }
///
/// let photos: Vec<_> = ["a", "b", "c"]
///     .into_iter()
///     .map(|id| MediaResource::new(id, MediaKind::Image))
///     .collect();
/// let navigator = PageNavigator::new(
///     photos,
///     PathAddress::from([1]),
///     ViewerConfig::default(),
///     Arc::new(ViewerSession::default()),
///     Arc::new(Host),
/// )
/// .unwrap();
/// navigator.start().unwrap();
///
/// let b = navigator.current_resource().unwrap();
/// assert_eq!(navigator.page_after(&b).as_deref(), Some("c"));
///
/// navigator.remove_current().unwrap();
/// assert_eq!(navigator.current_resource().unwrap().id().as_str(), "c");
/// assert_eq!(navigator.resource_count(), 2);
/// ```
pub struct PageNavigator<S, H> {
    inner: Arc<Inner<S, H>>,
}

impl<S, H> Clone for PageNavigator<S, H> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S, H> PageNavigator<S, H>
where
    S: ResourceSequence + Send + 'static,
    H: PagingHost + 'static,
{
    /// Creates a navigator positioned at `user_start`.
    ///
    /// Fails if the sequence is empty or the start address does not resolve.
    /// Nothing is shown until [`start`](Self::start).
    pub fn new(
        sequence: S,
        user_start: PathAddress,
        config: ViewerConfig,
        session: Arc<ViewerSession>,
        host: Arc<H>,
    ) -> Result<Self, NavigatorError> {
        if sequence.resource_count() == 0 {
            return Err(NavigatorError::EmptySequence);
        }
        let current = config.paging_address(&user_start, S::DEPTH);
        sequence.get(&current)?;
        Ok(Self {
            inner: Arc::new(Inner {
                state: ReentrantMutex::new(RefCell::new(NavState {
                    sequence,
                    user_start,
                    current,
                    next_ticket: 0,
                    in_flight: None,
                    pending_scrolls: VecDeque::new(),
                    flushing: false,
                    dismissed: false,
                    size_watch: None,
                })),
                host,
                config,
                session,
                scrolls: ObserverList::new(),
            }),
        })
    }

    /// Shows the start page.
    pub fn start(&self) -> Result<ScrollTicket, NavigatorError> {
        let start = self.with_state(|state| state.current.clone());
        self.scroll_to(&start, Direction::Forward, false)
    }

    /// The configuration in use.
    pub fn config(&self) -> &ViewerConfig {
        &self.inner.config
    }

    /// The session shared with the rest of the viewer.
    pub fn session(&self) -> &Arc<ViewerSession> {
        &self.inner.session
    }

    /// The host.
    pub fn host(&self) -> &Arc<H> {
        &self.inner.host
    }

    /// The current address in the sequence's own scheme.
    pub fn current_paging_address(&self) -> PathAddress {
        self.with_state(|state| state.current.clone())
    }

    /// The current address in the host's scheme.
    pub fn current_user_address(&self) -> PathAddress {
        self.with_state(|state| self.user_address(state, &state.current))
    }

    /// The resource being shown, if the current address still resolves.
    pub fn current_resource(&self) -> Option<MediaResource> {
        self.with_state(|state| state.sequence.get(&state.current).ok().cloned())
    }

    /// Number of resources left.
    pub fn resource_count(&self) -> usize {
        self.with_state(|state| state.sequence.resource_count())
    }

    /// Reads the sequence.
    ///
    /// `f` runs under the navigator's lock and must not call back into it.
    pub fn with_sequence<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        self.with_state(|state| f(&state.sequence))
    }

    /// Returns `true` between a programmatic scroll and its completion.
    pub fn is_scrolling(&self) -> bool {
        self.with_state(|state| state.in_flight.is_some())
    }

    /// Returns `true` once the viewer has been asked to close.
    pub fn is_dismissed(&self) -> bool {
        self.with_state(|state| state.dismissed)
    }

    /// Calls `callback` with the user address after every change of the
    /// current address, until the subscription is dropped.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe_scroll(
        &self,
        callback: impl Fn(&PathAddress) + Send + Sync + 'static,
    ) -> Subscription {
        self.inner.scrolls.subscribe(callback)
    }

    /// Makes `address` current and asks the host to show it.
    ///
    /// A scroll requested while another is in flight replaces it. Fails,
    /// changing nothing, if `address` does not resolve.
    pub fn scroll_to(
        &self,
        address: &PathAddress,
        direction: Direction,
        animated: bool,
    ) -> Result<ScrollTicket, NavigatorError> {
        let _serial = self.inner.state.lock();
        let (resource, user, ticket) = self.with_state(|state| -> Result<_, NavigatorError> {
            let resource = state.sequence.get(address)?.clone();
            state.current = address.clone();
            state.next_ticket += 1;
            let ticket = ScrollTicket(state.next_ticket);
            state.in_flight = Some(ticket);
            let user = self.user_address(state, address);
            state.pending_scrolls.push_back(user.clone());
            Ok((resource, user, ticket))
        })?;
        tracing::debug!(%user, ?direction, animated, "scrolling to page");
        self.watch_content_size(&resource);
        let page = self.inner.host.make_page(&resource, &user);
        self.inner.host.set_page(page, direction, animated);
        self.flush_scrolls();
        Ok(ticket)
    }

    /// Marks a programmatic scroll as done.
    ///
    /// Returns `false` for a ticket that has been superseded.
    pub fn finish_scroll(&self, ticket: ScrollTicket) -> bool {
        self.with_state(|state| {
            if state.in_flight == Some(ticket) {
                state.in_flight = None;
                true
            } else {
                tracing::trace!(?ticket, "ignoring a superseded scroll completion");
                false
            }
        })
    }

    /// Records that the user swiped to the page showing `resource`.
    ///
    /// Returns `true` if the current address changed.
    pub fn page_did_settle(&self, resource: &MediaResource) -> bool {
        let _serial = self.inner.state.lock();
        let moved = self.with_state(|state| {
            let Some(address) = state.sequence.address_of(resource) else {
                tracing::debug!(id = %resource.id(), "settled page is no longer in the sequence");
                return false;
            };
            state.in_flight = None;
            if address == state.current {
                return false;
            }
            let user = self.user_address(state, &address);
            state.current = address;
            state.pending_scrolls.push_back(user);
            true
        });
        if moved {
            self.watch_content_size(resource);
            self.flush_scrolls();
        }
        moved
    }

    /// The page before the one showing `resource`, if there is one.
    pub fn page_before(&self, resource: &MediaResource) -> Option<H::Page> {
        self.neighbor_page(resource, Direction::Reverse)
    }

    /// The page after the one showing `resource`, if there is one.
    pub fn page_after(&self, resource: &MediaResource) -> Option<H::Page> {
        self.neighbor_page(resource, Direction::Forward)
    }

    /// Reports that the data behind `resource` changed.
    ///
    /// When `resource` is on screen its page is built again, so the host
    /// renders it afresh, and handed to [`PagingHost::reload_page`]. Returns
    /// `true` if that happened.
    pub fn resource_changed(&self, resource: &MediaResource) -> bool {
        let _serial = self.inner.state.lock();
        let shown = self.with_state(|state| -> Option<(MediaResource, PathAddress)> {
            let current = state.sequence.get(&state.current).ok()?;
            (current == resource)
                .then(|| (current.clone(), self.user_address(state, &state.current)))
        });
        let Some((shown, user)) = shown else {
            tracing::trace!(id = %resource.id(), "changed resource is not on screen");
            return false;
        };
        tracing::debug!(id = %shown.id(), %user, "re-rendering changed resource");
        let page = self.inner.host.make_page(&shown, &user);
        self.inner.host.reload_page(page);
        true
    }

    /// Asks to delete the current resource; see [`remove_resource`](Self::remove_resource).
    pub fn remove_current(&self) -> Result<(), NavigatorError> {
        let current = self.current_paging_address();
        self.remove_resource(&current)
    }

    /// Asks the host to confirm deleting the resource at `address`.
    ///
    /// The deletion happens when the host confirms. By then the resource may
    /// have moved; it is found again by identity, and silently dropped if it
    /// is gone. Deleting the current resource shows the one that takes its
    /// place in reading order, else the one before, else dismisses the
    /// viewer.
    pub fn remove_resource(&self, address: &PathAddress) -> Result<(), NavigatorError> {
        // Not serialised across `confirm_delete`; the reply may commit from
        // another thread before it returns.
        let (guard, user) = self.with_state(|state| -> Result<_, NavigatorError> {
            let resource = state.sequence.get(address)?;
            let Some(guard) = resource.begin_removal() else {
                tracing::debug!(id = %resource.id(), "deletion already in flight");
                return Err(NavigatorError::AlreadyRemoving);
            };
            Ok((guard, self.user_address(state, address)))
        })?;
        let navigator = Arc::downgrade(&self.inner);
        let requested = address.clone();
        let reply = DeleteReply::new(move |confirmed| {
            Self::answer(&navigator, guard, &requested, confirmed);
        });
        self.inner.host.confirm_delete(&user, reply);
        Ok(())
    }

    /// Inserts `resource` at `address`.
    ///
    /// The current resource keeps being shown; if its address shifted, a
    /// did-scroll notification carries the new one.
    pub fn insert_resource(
        &self,
        address: &PathAddress,
        resource: MediaResource,
    ) -> Result<(), NavigatorError> {
        let _serial = self.inner.state.lock();
        let current = self.with_state(|state| -> Result<_, NavigatorError> {
            let current = state.sequence.get(&state.current).ok().cloned();
            state.sequence.insert_resource(address, resource)?;
            Ok(current)
        })?;
        tracing::debug!(%address, "resource inserted");
        if let Some(current) = current {
            self.relocate(&current);
        }
        Ok(())
    }

    /// Applies the session's tap action and returns it.
    pub fn handle_single_tap(&self) -> TapAction {
        let action = self.inner.session.tap_action();
        match action {
            TapAction::ToggleImmersiveMode => {
                self.inner.session.toggle();
            }
            TapAction::Dismiss => {
                self.dismiss();
            }
        }
        action
    }

    /// Asks the host to close the viewer.
    ///
    /// Returns `false`, without asking again, if it was already asked.
    pub fn dismiss(&self) -> bool {
        let _serial = self.inner.state.lock();
        let first = self.with_state(|state| !core::mem::replace(&mut state.dismissed, true));
        if first {
            tracing::debug!("dismissing viewer");
            self.inner.host.dismiss();
        }
        first
    }

    fn answer(
        navigator: &Weak<Inner<S, H>>,
        guard: RemovalGuard,
        requested: &PathAddress,
        confirmed: bool,
    ) {
        if !confirmed {
            tracing::debug!(id = %guard.resource().id(), "deletion declined");
            return;
        }
        let Some(inner) = navigator.upgrade() else {
            tracing::debug!("navigator gone before the deletion was confirmed");
            return;
        };
        Self { inner }.commit_removal(&guard, requested);
    }

    fn commit_removal(&self, guard: &RemovalGuard, requested: &PathAddress) {
        let _serial = self.inner.state.lock();
        let target = guard.resource();
        let removal = self.with_state(|state| -> Option<Removal> {
            let address = state.sequence.address_of(target)?;
            if address != *requested {
                tracing::debug!(from = %requested, to = %address, "resource moved while awaiting confirmation");
            }
            let flat_index = state.sequence.flat_index_of(&address)?;
            let current = state.sequence.get(&state.current).ok().cloned();
            let user_address = self.user_address(state, &address);
            let removed = state.sequence.remove_at(&address)?;
            Some(Removal {
                was_current: current.as_ref() == Some(&removed),
                removed,
                user_address,
                flat_index,
                current,
            })
        });
        let Some(removal) = removal else {
            tracing::debug!(id = %target.id(), "resource vanished before deletion; dropping");
            return;
        };
        tracing::debug!(id = %removal.removed.id(), address = %removal.user_address, "resource removed");
        self.inner
            .host
            .resource_removed(&removal.user_address, &removal.removed);
        if removal.was_current {
            self.resettle(removal.flat_index);
        } else if let Some(current) = removal.current {
            self.relocate(&current);
        }
    }

    fn resettle(&self, flat_index: usize) {
        let next = self.with_state(|state| {
            let mut all = state.sequence.all_addresses();
            if flat_index < all.len() {
                Some((all.swap_remove(flat_index), Direction::Forward))
            } else if flat_index > 0 && flat_index - 1 < all.len() {
                Some((all.swap_remove(flat_index - 1), Direction::Reverse))
            } else {
                None
            }
        });
        match next {
            Some((address, direction)) => {
                if let Err(error) = self.scroll_to(&address, direction, true) {
                    tracing::warn!(%address, %error, "could not show the page after a deletion");
                }
            }
            None => {
                tracing::debug!("last resource removed");
                self.dismiss();
            }
        }
    }

    fn relocate(&self, current: &MediaResource) {
        let moved = self.with_state(|state| -> Option<()> {
            let address = state.sequence.address_of(current)?;
            if address == state.current {
                return None;
            }
            let user = self.user_address(state, &address);
            state.current = address;
            state.pending_scrolls.push_back(user);
            Some(())
        });
        if moved.is_some() {
            self.flush_scrolls();
        }
    }

    fn neighbor_page(&self, resource: &MediaResource, direction: Direction) -> Option<H::Page> {
        let wrap = self.inner.config.options.loop_navigation;
        let (next, user) = self.with_state(|state| -> Option<(MediaResource, PathAddress)> {
            let Some(origin) = state.sequence.address_of(resource) else {
                tracing::trace!(id = %resource.id(), "page is no longer in the sequence");
                return None;
            };
            let Some(address) = state.sequence.neighbor(&origin, direction, wrap) else {
                tracing::trace!(%origin, ?direction, wrap, "no neighbouring page");
                return None;
            };
            let next = state.sequence.get(&address).ok()?.clone();
            Some((next, self.user_address(state, &address)))
        })?;
        Some(self.inner.host.make_page(&next, &user))
    }

    fn watch_content_size(&self, resource: &MediaResource) {
        let host = Arc::downgrade(&self.inner.host);
        let watched = resource.clone();
        let subscription = resource.observe_content_size(move |size| {
            if let Some(host) = host.upgrade() {
                host.content_size_changed(&watched, *size);
            }
        });
        let previous = self.with_state(|state| state.size_watch.replace(subscription));
        drop(previous);
    }

    fn flush_scrolls(&self) {
        let _serial = self.inner.state.lock();
        if self.with_state(|state| core::mem::replace(&mut state.flushing, true)) {
            return;
        }
        while let Some(user) = self.with_state(|state| {
            let next = state.pending_scrolls.pop_front();
            state.flushing = next.is_some();
            next
        }) {
            self.inner.scrolls.notify(&user);
        }
    }

    fn user_address(&self, state: &NavState<S>, paging: &PathAddress) -> PathAddress {
        self.inner.config.user_address(&state.user_start, paging)
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut NavState<S>) -> R) -> R {
        let guard = self.inner.state.lock();
        let mut state = guard.borrow_mut();
        f(&mut state)
    }
}

impl<S, H> fmt::Debug for PageNavigator<S, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let guard = self.inner.state.lock();
        let mut out = f.debug_struct("PageNavigator");
        match guard.try_borrow() {
            Ok(state) => out
                .field("current", &state.current)
                .field("in_flight", &state.in_flight)
                .field("dismissed", &state.dismissed),
            Err(_) => out.field("state", &"<borrowed>"),
        };
        out.finish_non_exhaustive()
    }
}
