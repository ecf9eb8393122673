//! One direction of a bridge: the peer window, its origin, its handshake
//! state and the calls waiting for it.

use std::fmt;

use framebridge_envelope::{encode_call, ControlToken};
use framebridge_transport::{MessageTarget, WindowId, ANY_ORIGIN};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::Result;
use crate::queue::{CallQueue, QueueItem};

/// Which peer a link talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// The embedded frame.
    Child,
    /// The hosting window.
    Parent,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Child => "child",
            Direction::Parent => "parent",
        }
    }

    /// Operation the peer in this direction exposes for window events.
    pub fn window_event_operation(self) -> &'static str {
        match self {
            Direction::Child => "handleParentWindowEvent",
            Direction::Parent => "handleChildWindowEvent",
        }
    }

    /// Operation the peer in this direction exposes for document events.
    pub fn document_event_operation(self) -> &'static str {
        match self {
            Direction::Child => "handleParentDocumentEvent",
            Direction::Parent => "handleChildDocumentEvent",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handshake progress for one direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    /// Nothing sent yet, or the open token could not be posted.
    Unconnected,
    /// Open token posted, waiting for the acknowledgement.
    AckPending,
    /// The peer is listening; calls go out immediately.
    Ready,
}

impl HandshakeState {
    pub fn as_str(self) -> &'static str {
        match self {
            HandshakeState::Unconnected => "unconnected",
            HandshakeState::AckPending => "ack-pending",
            HandshakeState::Ready => "ready",
        }
    }
}

/// The channel to one peer window.
pub struct Link {
    direction: Direction,
    target: Box<dyn MessageTarget>,
    origin: String,
    state: HandshakeState,
    queue: CallQueue,
}

impl Link {
    pub fn new(direction: Direction, target: Box<dyn MessageTarget>, origin: String) -> Self {
        Self {
            direction,
            target,
            origin,
            state: HandshakeState::Unconnected,
            queue: CallQueue::new(),
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Identity of the peer window.
    pub fn id(&self) -> WindowId {
        self.target.id()
    }

    /// Resolved origin outbound messages are scoped to.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn state(&self) -> HandshakeState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == HandshakeState::Ready
    }

    /// Number of calls waiting for readiness.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Post a raw payload to the peer at its resolved origin.
    pub fn post(&self, message: &Value) -> Result<()> {
        self.target.post_message(message, &self.origin)?;
        Ok(())
    }

    /// Post the connection-open token. The peer's origin may not be known
    /// for certain yet, so the token is unrestricted.
    pub fn open(&mut self) {
        match self
            .target
            .post_message(&ControlToken::Handshake.to_wire(), ANY_ORIGIN)
        {
            Ok(()) => {
                if self.state == HandshakeState::Unconnected {
                    self.state = HandshakeState::AckPending;
                }
            }
            Err(err) => {
                warn!(direction = %self.direction, error = %err, "failed to post handshake");
            }
        }
    }

    /// Reply to a connection-open token.
    pub fn acknowledge(&self) {
        if let Err(err) = self.post(&ControlToken::HandshakeSucceeded.to_wire()) {
            warn!(direction = %self.direction, error = %err, "failed to acknowledge handshake");
        }
    }

    /// Send `item` now if the peer is ready, otherwise buffer it.
    pub fn call(&mut self, item: QueueItem) {
        if self.is_ready() {
            deliver(self.direction, self.target.as_ref(), &self.origin, &item);
            return;
        }
        debug!(
            direction = %self.direction,
            operation = %item.operation,
            "peer not ready, queueing call"
        );
        if let Err(item) = self.queue.enqueue(item) {
            deliver(self.direction, self.target.as_ref(), &self.origin, &item);
        }
    }

    /// Mark the direction ready and flush buffered calls in order.
    ///
    /// Returns the number of calls flushed; zero if the direction was
    /// already ready.
    pub fn mark_ready(&mut self) -> usize {
        if self.is_ready() {
            return 0;
        }
        self.state = HandshakeState::Ready;

        let direction = self.direction;
        let target = self.target.as_ref();
        let origin = self.origin.as_str();
        let flushed = self
            .queue
            .drain_into(|item| deliver(direction, target, origin, &item));
        debug!(direction = %direction, flushed, "peer ready");
        flushed
    }
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Link")
            .field("direction", &self.direction)
            .field("peer", &self.target.id())
            .field("origin", &self.origin)
            .field("state", &self.state)
            .field("queued", &self.queue.len())
            .finish()
    }
}

fn deliver(direction: Direction, target: &dyn MessageTarget, origin: &str, item: &QueueItem) {
    let message = match encode_call(&item.operation, &item.params) {
        Ok(message) => message,
        Err(err) => {
            warn!(operation = %item.operation, error = %err, "failed to encode call");
            return;
        }
    };
    if let Err(err) = target.post_message(&message, origin) {
        warn!(
            direction = %direction,
            operation = %item.operation,
            error = %err,
            "failed to post call"
        );
    }
}

#[cfg(test)]
mod tests {
    use framebridge_transport::Mailbox;
    use serde_json::json;

    use super::*;

    fn child_link(mailbox: &Mailbox) -> (Link, WindowId) {
        let host = mailbox.open_window("https://host.example");
        let embed = mailbox.open_window("https://embed.example");
        let link = Link::new(
            Direction::Child,
            Box::new(mailbox.target(host, embed)),
            "https://embed.example".to_string(),
        );
        (link, embed)
    }

    #[test]
    fn open_moves_to_ack_pending() {
        let mailbox = Mailbox::new();
        let (mut link, embed) = child_link(&mailbox);
        assert_eq!(link.state(), HandshakeState::Unconnected);
        link.open();
        assert_eq!(link.state(), HandshakeState::AckPending);
        assert_eq!(mailbox.peek_for(embed), vec![json!("handshake")]);
    }

    #[test]
    fn failed_open_stays_unconnected() {
        let mailbox = Mailbox::new();
        let (mut link, embed) = child_link(&mailbox);
        mailbox.close_window(embed);
        link.open();
        assert_eq!(link.state(), HandshakeState::Unconnected);
    }

    #[test]
    fn calls_wait_for_readiness() {
        let mailbox = Mailbox::new();
        let (mut link, embed) = child_link(&mailbox);
        link.call(QueueItem::new("first", json!([1])));
        link.call(QueueItem::new("second", json!({"a": 2})));
        assert_eq!(link.queued(), 2);
        assert_eq!(mailbox.pending(), 0);

        assert_eq!(link.mark_ready(), 2);
        assert_eq!(link.mark_ready(), 0);
        assert_eq!(
            mailbox.peek_for(embed),
            vec![
                json!({"methodName": "first", "paramsJson": "[1]"}),
                json!({"methodName": "second", "paramsJson": "{\"a\":2}"}),
            ]
        );

        link.call(QueueItem::new("third", Value::Null));
        assert_eq!(link.queued(), 0);
        assert_eq!(mailbox.pending(), 3);
    }

    #[test]
    fn direction_operations() {
        assert_eq!(
            Direction::Child.window_event_operation(),
            "handleParentWindowEvent"
        );
        assert_eq!(
            Direction::Parent.document_event_operation(),
            "handleChildDocumentEvent"
        );
    }
}
