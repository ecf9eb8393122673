//! Start-once ownership of every bridge on a page.

use framebridge_transport::InboundMessage;
use tracing::{debug, info};

use crate::bridge::Bridge;

/// Owns the bridges created for a page.
///
/// [`BridgeRegistry::start`] builds bridges at most once, however many
/// times it is called; [`BridgeRegistry::teardown`] drops them all and
/// allows a later start.
#[derive(Debug, Default)]
pub struct BridgeRegistry {
    started: bool,
    bridges: Vec<Bridge>,
}

impl BridgeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a bridge for each discovered endpoint. `build` may decline an
    /// endpoint by returning `None`. Returns the number of bridges created,
    /// zero if already started.
    pub fn start<T, I, F>(&mut self, endpoints: I, mut build: F) -> usize
    where
        I: IntoIterator<Item = T>,
        F: FnMut(T) -> Option<Bridge>,
    {
        if self.started {
            debug!("bridges already started");
            return 0;
        }
        self.started = true;
        self.bridges = endpoints.into_iter().filter_map(&mut build).collect();
        info!(bridges = self.bridges.len(), "bridges started");
        self.bridges.len()
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Hand an inbound message to every bridge. Each bridge ignores
    /// messages from windows it is not bound to.
    pub fn dispatch(&mut self, message: &InboundMessage) {
        for bridge in &mut self.bridges {
            bridge.handle_message(message);
        }
    }

    pub fn bridges(&self) -> &[Bridge] {
        &self.bridges
    }

    pub fn bridges_mut(&mut self) -> &mut [Bridge] {
        &mut self.bridges
    }

    pub fn len(&self) -> usize {
        self.bridges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bridges.is_empty()
    }

    /// Drop every bridge, releasing all of their listeners.
    pub fn teardown(&mut self) {
        let count = self.bridges.len();
        for bridge in self.bridges.drain(..) {
            bridge.teardown();
        }
        self.started = false;
        info!(bridges = count, "bridges torn down");
    }
}
