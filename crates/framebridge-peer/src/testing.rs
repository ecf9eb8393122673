//! Shared fixtures for bridge tests: a host page embedding one frame, both
//! on the same in-memory mailbox.

use framebridge_transport::{InboundMessage, Mailbox, WindowId};
use framebridge_viewport::memory::{MemoryFullscreen, MemoryStyle, MemoryViewport, MemoryVisibility};
use serde_json::Value;

use crate::bridge::{Bridge, HostParts};
use crate::config::BridgeConfig;
use crate::location::MemoryLocation;
use crate::storage::{KeyValueStore, MemoryStore};

pub(crate) const HOST_ORIGIN: &str = "https://host.example";
pub(crate) const EMBED_ORIGIN: &str = "https://embed.example";
pub(crate) const EMBED_SRC: &str = "https://embed.example/player?id=7";

/// Browser state of one window.
#[derive(Clone)]
pub(crate) struct Env {
    pub style: MemoryStyle,
    pub viewport: MemoryViewport,
    pub fullscreen: MemoryFullscreen,
    pub visibility: MemoryVisibility,
    pub store: MemoryStore,
    pub location: MemoryLocation,
}

impl Env {
    fn new(href: &str, referrer: &str) -> Self {
        Self {
            style: MemoryStyle::default(),
            viewport: MemoryViewport::with_content("width=device-width, initial-scale=1"),
            fullscreen: MemoryFullscreen::standard(),
            visibility: MemoryVisibility::supported(),
            store: MemoryStore::new(),
            location: MemoryLocation::new(href, referrer),
        }
    }

    pub fn parts(&self, mailbox: &Mailbox) -> HostParts {
        HostParts {
            events: Box::new(mailbox.clone()),
            style: Box::new(self.style.clone()),
            viewport: Box::new(self.viewport.clone()),
            fullscreen: Box::new(self.fullscreen.clone()),
            visibility: Some(Box::new(self.visibility.clone())),
            storage: Some(Box::new(self.store.clone())),
            location: Box::new(self.location.clone()),
        }
    }
}

pub(crate) struct Page {
    pub mailbox: Mailbox,
    pub host: WindowId,
    pub embed: WindowId,
    pub host_env: Env,
    pub embed_env: Env,
}

impl Page {
    pub fn new(mailbox: &Mailbox) -> Self {
        Self {
            mailbox: mailbox.clone(),
            host: mailbox.open_window(HOST_ORIGIN),
            embed: mailbox.open_window(EMBED_ORIGIN),
            host_env: Env::new("https://host.example/watch", "https://search.example/"),
            embed_env: Env::new(EMBED_SRC, "https://host.example/watch"),
        }
    }

    pub fn seed_host_storage(&self, key: &str, raw: &str) {
        let mut store = self.host_env.store.clone();
        let _ = store.set_item(key, raw);
    }

    pub fn from_embed(&self, data: Value) -> InboundMessage {
        InboundMessage::new(self.embed, EMBED_ORIGIN, data)
    }

    pub fn from_host(&self, data: Value) -> InboundMessage {
        InboundMessage::new(self.host, HOST_ORIGIN, data)
    }

    /// Deliver queued messages until the mailbox is quiet. Returns the
    /// number delivered.
    pub fn pump(&self, host: &mut Bridge, embed: &mut Bridge) -> usize {
        let mut delivered = 0;
        while let Some(delivery) = self.mailbox.pop() {
            if delivery.to == self.host {
                host.handle_message(&delivery.message);
            } else if delivery.to == self.embed {
                embed.handle_message(&delivery.message);
            }
            delivered += 1;
            assert!(delivered < 1000, "message loop did not settle");
        }
        delivered
    }
}

pub(crate) fn host_bridge(page: &Page, config: BridgeConfig) -> Bridge {
    Bridge::builder()
        .config(config)
        .child(page.mailbox.target(page.host, page.embed), EMBED_SRC, None)
        .build(page.host_env.parts(&page.mailbox))
}

pub(crate) fn embed_bridge(page: &Page, config: BridgeConfig) -> Bridge {
    Bridge::builder()
        .config(config)
        .parent(page.mailbox.target(page.embed, page.host))
        .build(page.embed_env.parts(&page.mailbox))
}
