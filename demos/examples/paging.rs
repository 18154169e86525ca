// Copyright 2026 the Lightbox Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paging through albums, deleting and inserting along the way.
//!
//! The host here prints what a real pager would show and holds delete
//! confirmations until "the user" answers them. Pages are "rendered" by a
//! per-kind renderer registry that reports each photo's size.
//!
//! Run:
//! - `cargo run -p lightbox_demos --example paging`
//! - `RUST_LOG=debug cargo run -p lightbox_demos --example paging` for the navigator's logs

use std::sync::Arc;

use kurbo::Size;
use lightbox_pager::{
    DeleteReply, PageNavigator, PagingHost, TapAction, ViewerConfig, ViewerSession,
};
use lightbox_sequence::{
    Direction, MediaKind, MediaResource, PathAddress, RendererRegistry, ResourceSequence,
};
use parking_lot::Mutex;
use tracing_subscriber::EnvFilter;

/// Pretends to be a paging view; pages are just labels.
struct ConsoleHost {
    renderers: RendererRegistry<String>,
    pending: Mutex<Vec<DeleteReply>>,
}

impl PagingHost for ConsoleHost {
    type Page = String;

    fn make_page(&self, resource: &MediaResource, user_address: &PathAddress) -> String {
        let mut page = String::new();
        if !self.renderers.render(resource, &mut page) {
            page = format!("[{}]", resource.id());
        }
        format!("{page} @ {user_address}")
    }

    fn reload_page(&self, page: String) {
        println!("  redraw {page}");
    }

    fn set_page(&self, page: String, direction: Direction, animated: bool) {
        println!("  show   {page} ({direction:?}, animated: {animated})");
    }

    fn confirm_delete(&self, user_address: &PathAddress, reply: DeleteReply) {
        println!("  ask    delete {user_address}?");
        self.pending.lock().push(reply);
    }

    fn dismiss(&self) {
        println!("  dismiss viewer");
    }

    fn resource_removed(&self, user_address: &PathAddress, resource: &MediaResource) {
        println!("  gone   {} (was {user_address})", resource.id());
    }

    fn content_size_changed(&self, resource: &MediaResource, size: Size) {
        println!("  size   {} is {}x{}", resource.id(), size.width, size.height);
    }
}

impl ConsoleHost {
    fn new() -> Self {
        let mut renderers = RendererRegistry::<String>::new();
        renderers
            .register(MediaKind::Image, |r: &MediaResource, page: &mut String| {
                *page = format!("still {}", r.id());
                Some(Size::new(4032.0, 3024.0))
            })
            .register(MediaKind::LivePhoto, |r: &MediaResource, page: &mut String| {
                *page = format!("live {}", r.id());
                Some(Size::new(1440.0, 1920.0))
            });
        Self {
            renderers,
            pending: Mutex::default(),
        }
    }

    fn answer(&self, confirmed: bool) {
        let reply = self.pending.lock().pop();
        if let Some(reply) = reply {
            println!("  answer {confirmed}");
            reply.send(confirmed);
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let albums: Vec<Vec<MediaResource>> = ["beach", "city"]
        .iter()
        .map(|album| {
            (0..5)
                .map(|i| MediaResource::new(format!("{album}-{i}"), MediaKind::Image))
                .collect()
        })
        .collect();

    let host = Arc::new(ConsoleHost::new());
    let session = Arc::new(ViewerSession::default());
    // The host's grid is sectioned: `[section, album, item]`.
    let navigator = PageNavigator::new(
        albums,
        PathAddress::from([0, 0, 2]),
        ViewerConfig::default(),
        session.clone(),
        host.clone(),
    )
    .expect("start address resolves");

    let _scrolls = navigator.subscribe_scroll(|address| println!("  scroll {address}"));
    let _immersion = session.observe({
        let session = session.clone();
        move || println!("  mode   {:?}", session.mode())
    });

    println!("start");
    let ticket = navigator.start().expect("start page resolves");
    navigator.finish_scroll(ticket);

    println!("swipe forward three times, across the album boundary");
    for _ in 0..3 {
        let Some(current) = navigator.current_resource() else {
            break;
        };
        let Some(next) = navigator.with_sequence(|albums| -> Option<MediaResource> {
            let at = albums.address_of(&current)?;
            let next = albums.next_after(&at, true)?;
            albums.get(&next).ok().cloned()
        }) else {
            break;
        };
        navigator.page_did_settle(&next);
    }

    println!("delete the current photo, declined then confirmed");
    navigator.remove_current().expect("current resolves");
    host.answer(false);
    navigator.remove_current().expect("current resolves");
    host.answer(true);

    println!("insert a photo ahead of the current one");
    navigator
        .insert_resource(
            &PathAddress::from([1, 0]),
            MediaResource::new("city-new", MediaKind::LivePhoto),
        )
        .expect("insertion address is valid");

    println!("the current photo was edited elsewhere");
    if let Some(current) = navigator.current_resource() {
        navigator.resource_changed(&current);
    }

    println!("tap twice, then switch taps to dismiss");
    navigator.handle_single_tap();
    navigator.handle_single_tap();
    navigator.session().set_tap_action(TapAction::Dismiss);
    navigator.handle_single_tap();

    println!("end at {}", navigator.current_user_address());
}
