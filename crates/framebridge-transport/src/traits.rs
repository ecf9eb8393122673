use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::error::Result;

/// Identity of a window taking part in the exchange.
///
/// Inbound messages carry the identity of their source window; the bridge
/// compares it against its known peers to decide which direction a message
/// came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(pub u64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "window#{}", self.0)
    }
}

/// A window that can receive posted messages.
///
/// Delivery is fire-and-forget: a successful return only means the payload
/// was handed to the platform, never that anyone listened.
pub trait MessageTarget {
    /// Identity of the window messages are posted to.
    fn id(&self) -> WindowId;

    /// Post `message` to the window, restricted to `target_origin`
    /// (`"*"` for unrestricted).
    fn post_message(&self, message: &Value, target_origin: &str) -> Result<()>;
}

impl<T: MessageTarget + ?Sized> MessageTarget for Box<T> {
    fn id(&self) -> WindowId {
        (**self).id()
    }

    fn post_message(&self, message: &Value, target_origin: &str) -> Result<()> {
        (**self).post_message(message, target_origin)
    }
}

impl<T: MessageTarget + ?Sized> MessageTarget for Rc<T> {
    fn id(&self) -> WindowId {
        (**self).id()
    }

    fn post_message(&self, message: &Value, target_origin: &str) -> Result<()> {
        (**self).post_message(message, target_origin)
    }
}

/// A message event as observed by the receiving window.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    /// Window the message was posted from, if the platform exposes it.
    pub source: Option<WindowId>,
    /// Serialized origin of the sender.
    pub origin: String,
    /// The payload, as posted.
    pub data: Value,
}

impl InboundMessage {
    /// Create a message event from a known source window.
    pub fn new(source: WindowId, origin: impl Into<String>, data: Value) -> Self {
        Self {
            source: Some(source),
            origin: origin.into(),
            data,
        }
    }
}
