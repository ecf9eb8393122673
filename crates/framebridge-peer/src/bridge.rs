//! The bridge endpoint: one per embedded frame on the host side, one per
//! hosting window on the embed side.

use std::fmt;
use std::future::Future;

use framebridge_envelope::{decode, encode_return, Arguments, Envelope};
use framebridge_transport::{
    resolve_origin, EventTarget, InboundMessage, MessageTarget, Subscription, WindowId, ANY_ORIGIN,
};
use framebridge_viewport::{
    CapabilityAdapter, FullscreenHost, StyleTarget, Takeover, ViewportMeta, VisibilityHost,
};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::config::BridgeConfig;
use crate::error::{PeerError, Result};
use crate::events::{FULLSCREEN_CHANGE_EVENTS, LISTENED_EVENTS};
use crate::fullscreen::PendingNative;
use crate::link::{Direction, HandshakeState, Link};
use crate::location::Location;
use crate::queue::QueueItem;
use crate::registry::OperationRegistry;
use crate::remote::ReturnSlots;
use crate::storage::{KeyValueStore, StorageItem, StorageMirror};

/// Browser collaborators a bridge drives.
pub struct HostParts {
    /// Where listener registrations are made.
    pub events: Box<dyn EventTarget>,
    /// Inline style of the element a takeover occupies the viewport with.
    pub style: Box<dyn StyleTarget>,
    /// The document's viewport meta tag.
    pub viewport: Box<dyn ViewportMeta>,
    pub fullscreen: Box<dyn FullscreenHost>,
    pub visibility: Option<Box<dyn VisibilityHost>>,
    /// Local key-value store; `None` starts on the in-memory fallback.
    pub storage: Option<Box<dyn KeyValueStore>>,
    pub location: Box<dyn Location>,
}

/// Identity reported by the embedded content through `onReady`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceInfo {
    pub instance_id: String,
    pub class_name: String,
}

/// Builder for [`Bridge`].
pub struct BridgeBuilder {
    config: BridgeConfig,
    child: Option<Link>,
    parent: Option<Link>,
    registry: OperationRegistry,
}

impl BridgeBuilder {
    pub fn new() -> Self {
        Self {
            config: BridgeConfig::default(),
            child: None,
            parent: None,
            registry: OperationRegistry::with_builtins(),
        }
    }

    pub fn config(mut self, config: BridgeConfig) -> Self {
        self.config = config;
        self
    }

    /// Bridge to an embedded frame loaded from `src`. The origin outbound
    /// messages are scoped to is derived from `src`, resolving
    /// protocol-relative sources against `page`.
    pub fn child(self, target: impl MessageTarget + 'static, src: &str, page: Option<&Url>) -> Self {
        let origin = resolve_origin(src, page);
        self.child_with_origin(target, &origin)
    }

    /// Bridge to an embedded frame at a known origin.
    pub fn child_with_origin(mut self, target: impl MessageTarget + 'static, origin: &str) -> Self {
        self.child = Some(Link::new(
            Direction::Child,
            Box::new(target),
            origin.to_string(),
        ));
        self
    }

    /// Bridge to the hosting window, whose origin is not known.
    pub fn parent(self, target: impl MessageTarget + 'static) -> Self {
        self.parent_with_origin(target, ANY_ORIGIN)
    }

    pub fn parent_with_origin(mut self, target: impl MessageTarget + 'static, origin: &str) -> Self {
        self.parent = Some(Link::new(
            Direction::Parent,
            Box::new(target),
            origin.to_string(),
        ));
        self
    }

    /// Register an application operation alongside the built-ins.
    pub fn operation<F>(mut self, name: &str, handler: F) -> Result<Self>
    where
        F: Fn(&mut Bridge, Arguments) -> Option<Value> + 'static,
    {
        self.registry.register(name, handler)?;
        Ok(self)
    }

    /// Attach listeners and open every configured direction.
    pub fn build(self, host: HostParts) -> Bridge {
        let listeners = LISTENED_EVENTS
            .iter()
            .chain(FULLSCREEN_CHANGE_EVENTS.iter())
            .copied()
            .map(|event| host.events.add_listener(event))
            .collect();
        let storage = StorageMirror::new(host.storage, self.config.reserved_storage_prefix.clone());

        let mut bridge = Bridge {
            config: self.config,
            child: self.child,
            parent: self.parent,
            registry: self.registry,
            returns: ReturnSlots::new(),
            capability: CapabilityAdapter::new(host.fullscreen, host.visibility),
            style: host.style,
            viewport: host.viewport,
            takeover: Takeover::new(),
            full_screen: false,
            pending_native: None,
            visibility_crossings: None,
            storage,
            storage_pushed: false,
            location: host.location,
            events: host.events,
            listeners,
            escape_listener: None,
            instance: None,
        };

        info!(
            child = bridge.child.as_ref().map(Link::origin),
            parent = bridge.parent.is_some(),
            "bridge started"
        );
        for link in [bridge.child.as_mut(), bridge.parent.as_mut()]
            .into_iter()
            .flatten()
        {
            link.open();
        }
        bridge
    }
}

impl Default for BridgeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bridge endpoint.
///
/// Dropping the bridge, directly or through [`Bridge::teardown`], releases
/// every listener registration and abandons queued calls.
pub struct Bridge {
    pub(crate) config: BridgeConfig,
    pub(crate) child: Option<Link>,
    pub(crate) parent: Option<Link>,
    registry: OperationRegistry,
    returns: ReturnSlots,
    pub(crate) capability: CapabilityAdapter,
    pub(crate) style: Box<dyn StyleTarget>,
    pub(crate) viewport: Box<dyn ViewportMeta>,
    pub(crate) takeover: Takeover,
    pub(crate) full_screen: bool,
    pub(crate) pending_native: Option<PendingNative>,
    pub(crate) visibility_crossings: Option<mpsc::UnboundedReceiver<bool>>,
    pub(crate) storage: StorageMirror,
    pub(crate) storage_pushed: bool,
    location: Box<dyn Location>,
    pub(crate) events: Box<dyn EventTarget>,
    listeners: Vec<Subscription>,
    pub(crate) escape_listener: Option<Subscription>,
    instance: Option<InstanceInfo>,
}

impl Bridge {
    pub fn builder() -> BridgeBuilder {
        BridgeBuilder::new()
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Handshake state toward `direction`, if that direction is bridged.
    pub fn link_state(&self, direction: Direction) -> Option<HandshakeState> {
        self.link(direction).map(Link::state)
    }

    /// Calls waiting for `direction` to become ready.
    pub fn queued(&self, direction: Direction) -> usize {
        self.link(direction).map(Link::queued).unwrap_or(0)
    }

    /// Identity reported through `onReady`, if any.
    pub fn instance(&self) -> Option<&InstanceInfo> {
        self.instance.as_ref()
    }

    /// Names of every remotely invocable operation.
    pub fn operations(&self) -> Vec<&str> {
        self.registry.names()
    }

    /// Number of listener registrations this bridge holds.
    pub fn listener_count(&self) -> usize {
        self.listeners.len() + usize::from(self.escape_listener.is_some())
    }

    pub(crate) fn link(&self, direction: Direction) -> Option<&Link> {
        match direction {
            Direction::Child => self.child.as_ref(),
            Direction::Parent => self.parent.as_ref(),
        }
    }

    pub(crate) fn link_mut(&mut self, direction: Direction) -> Option<&mut Link> {
        match direction {
            Direction::Child => self.child.as_mut(),
            Direction::Parent => self.parent.as_mut(),
        }
    }

    fn direction_of(&self, source: Option<WindowId>) -> Option<Direction> {
        let source = source?;
        [Direction::Child, Direction::Parent]
            .into_iter()
            .find(|direction| self.link(*direction).is_some_and(|link| link.id() == source))
    }

    /// Handle one inbound message event.
    pub fn handle_message(&mut self, message: &InboundMessage) {
        self.reap_native();
        self.poll_visibility();
        let Some(envelope) = decode(&message.data) else {
            return;
        };

        match envelope {
            Envelope::Return { key, value } => {
                if let Some(direction) = self.known_source(message) {
                    let woken = self.returns.resolve(direction, &key, value);
                    trace!(key = %key, direction = %direction, woken, "return received");
                }
            }
            Envelope::Control(token) => {
                if let Some(direction) = self.known_source(message) {
                    self.handle_control(direction, token);
                }
            }
            Envelope::Call { operation, params } => {
                if let Some(direction) = self.known_source(message) {
                    self.dispatch(direction, &operation, params);
                }
            }
        }
    }

    fn known_source(&self, message: &InboundMessage) -> Option<Direction> {
        let direction = self.direction_of(message.source);
        if direction.is_none() {
            debug!(origin = %message.origin, "message from unknown source ignored");
        }
        direction
    }

    /// Run a local operation on behalf of the peer in `direction`.
    ///
    /// Unknown and private names are dropped. A result is posted straight
    /// back to the caller.
    fn dispatch(&mut self, direction: Direction, operation: &str, params: Option<Value>) {
        let Some(handler) = self.registry.get(operation) else {
            debug!(operation, "dropping call to unknown operation");
            return;
        };
        trace!(operation, direction = %direction, "dispatching call");
        if let Some(result) = handler(self, Arguments::from_params(params)) {
            self.send_return(direction, operation, &result);
        }
    }

    fn send_return(&self, direction: Direction, operation: &str, value: &Value) {
        let Some(link) = self.link(direction) else {
            return;
        };
        let sent = encode_return(operation, value)
            .map_err(PeerError::from)
            .and_then(|message| link.post(&message));
        if let Err(err) = sent {
            warn!(operation, direction = %direction, error = %err, "failed to send return");
        }
    }

    /// Call `operation` on the peer in `direction`, queueing until that
    /// direction is ready. Returns false if the direction is not bridged.
    pub fn call(&mut self, direction: Direction, operation: &str, params: Value) -> bool {
        match self.link_mut(direction) {
            Some(link) => {
                link.call(QueueItem::new(operation, params));
                true
            }
            None => {
                debug!(operation, direction = %direction, "no peer in direction, call dropped");
                false
            }
        }
    }

    pub fn call_child(&mut self, operation: &str, params: Value) -> bool {
        self.call(Direction::Child, operation, params)
    }

    pub fn call_parent(&mut self, operation: &str, params: Value) -> bool {
        self.call(Direction::Parent, operation, params)
    }

    /// Call `operation` and wait for its result.
    ///
    /// The returned future resolves to `None` if no matching `return`
    /// arrives within the configured timeout, counted from this call. It
    /// does not borrow the bridge; the result is observed by
    /// [`Bridge::handle_message`].
    pub fn call_remote_and_await(
        &mut self,
        direction: Direction,
        operation: &str,
        params: Value,
    ) -> impl Future<Output = Option<Value>> + 'static {
        let deadline = Instant::now() + self.config.return_timeout;
        let receiver = self
            .link(direction)
            .is_some()
            .then(|| self.returns.subscribe(direction, operation));
        self.call(direction, operation, params);
        let operation = operation.to_string();

        async move {
            let receiver = receiver?;
            match timeout_at(deadline, receiver).await {
                Ok(Ok(value)) => Some(value),
                Ok(Err(_)) => None,
                Err(_) => {
                    debug!(operation = %operation, "no return before timeout");
                    None
                }
            }
        }
    }

    /// Live awaiters for `operation`'s result from `direction`.
    pub fn awaiting(&self, direction: Direction, operation: &str) -> usize {
        self.returns.waiting(direction, operation)
    }

    pub(crate) fn on_ready(&mut self, instance_id: &str, class_name: &str) {
        info!(instance_id, class_name, "embedded instance ready");
        self.instance = Some(InstanceInfo {
            instance_id: instance_id.to_string(),
            class_name: class_name.to_string(),
        });
    }

    pub fn set_local_storage_item(&mut self, key: &str, value: &Value) {
        self.storage.set(key, value);
    }

    pub fn set_local_storage_items(&mut self, items: &[StorageItem]) {
        for item in items {
            self.storage.set(&item.key, &item.value);
        }
    }

    pub fn local_storage_item(&mut self, key: &str) -> Option<Value> {
        self.storage.get(key)
    }

    pub fn local_storage_items(&mut self) -> Vec<StorageItem> {
        self.storage.items()
    }

    pub fn set_location(&mut self, url: &str) {
        debug!(url, "navigating");
        self.location.assign(url);
    }

    pub fn location(&self) -> String {
        self.location.href()
    }

    pub fn referrer(&self) -> String {
        self.location.referrer()
    }

    /// Detach from the page. Equivalent to dropping the bridge.
    pub fn teardown(self) {
        info!(listeners = self.listener_count(), "bridge torn down");
    }
}

impl fmt::Debug for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("child", &self.child)
            .field("parent", &self.parent)
            .field("full_screen", &self.full_screen)
            .field("full_browser", &self.takeover.is_active())
            .field("storage", &self.storage)
            .field("instance", &self.instance)
            .finish()
    }
}
