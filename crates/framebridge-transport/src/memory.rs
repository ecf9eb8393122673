//! In-process transport.
//!
//! A [`Mailbox`] stands in for the browser's message queue: every window
//! opened on it gets a [`WindowId`] and an origin, posted messages are
//! queued as [`Delivery`] records, and the caller decides when to hand them
//! to the receiving bridge. Nothing is delivered implicitly, which keeps
//! tests deterministic.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::rc::Rc;

use serde_json::Value;

use crate::error::{Result, TransportError};
use crate::listener::{EventTarget, Subscription};
use crate::origin::origin_matches;
use crate::traits::{InboundMessage, MessageTarget, WindowId};

/// A message queued for a window.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    /// Receiving window.
    pub to: WindowId,
    /// The message event the receiver observes.
    pub message: InboundMessage,
}

#[derive(Debug)]
struct WindowState {
    origin: String,
    open: bool,
}

#[derive(Debug, Default)]
struct MailboxInner {
    next_id: u64,
    windows: BTreeMap<WindowId, WindowState>,
    queue: VecDeque<Delivery>,
    listeners: HashMap<&'static str, usize>,
}

/// Shared in-memory message queue. Cloning yields another handle to the
/// same queue.
#[derive(Debug, Clone, Default)]
pub struct Mailbox {
    inner: Rc<RefCell<MailboxInner>>,
}

impl Mailbox {
    /// Create an empty mailbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a window with the given origin.
    pub fn open_window(&self, origin: &str) -> WindowId {
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        let id = WindowId(inner.next_id);
        inner.windows.insert(
            id,
            WindowState {
                origin: origin.to_string(),
                open: true,
            },
        );
        id
    }

    /// Mark a window as closed; further posts to it fail.
    pub fn close_window(&self, id: WindowId) {
        if let Some(window) = self.inner.borrow_mut().windows.get_mut(&id) {
            window.open = false;
        }
    }

    /// Origin a window was opened with.
    pub fn origin_of(&self, id: WindowId) -> Option<String> {
        self.inner
            .borrow()
            .windows
            .get(&id)
            .map(|window| window.origin.clone())
    }

    /// A handle that posts from `from` to `to`.
    pub fn target(&self, from: WindowId, to: WindowId) -> MemoryWindow {
        MemoryWindow {
            mailbox: self.clone(),
            from,
            to,
        }
    }

    /// Take the oldest queued delivery.
    pub fn pop(&self) -> Option<Delivery> {
        self.inner.borrow_mut().queue.pop_front()
    }

    /// Take every queued delivery, oldest first.
    pub fn drain(&self) -> Vec<Delivery> {
        self.inner.borrow_mut().queue.drain(..).collect()
    }

    /// Number of queued deliveries.
    pub fn pending(&self) -> usize {
        self.inner.borrow().queue.len()
    }

    /// Payloads currently queued for `to`, oldest first, without removing them.
    pub fn peek_for(&self, to: WindowId) -> Vec<Value> {
        self.inner
            .borrow()
            .queue
            .iter()
            .filter(|delivery| delivery.to == to)
            .map(|delivery| delivery.message.data.clone())
            .collect()
    }

    /// Number of live listener registrations for `event`.
    pub fn listener_count(&self, event: &str) -> usize {
        self.inner
            .borrow()
            .listeners
            .get(event)
            .copied()
            .unwrap_or(0)
    }

    /// Total number of live listener registrations.
    pub fn total_listeners(&self) -> usize {
        self.inner.borrow().listeners.values().sum()
    }

    fn post(&self, from: WindowId, to: WindowId, message: &Value, target_origin: &str) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        let recipient = match inner.windows.get(&to) {
            Some(window) if window.open => window.origin.clone(),
            _ => return Err(TransportError::TargetGone(to)),
        };
        if !origin_matches(target_origin, &recipient) {
            return Err(TransportError::OriginRejected {
                target: target_origin.to_string(),
                actual: recipient,
            });
        }
        let sender_origin = inner
            .windows
            .get(&from)
            .map(|window| window.origin.clone())
            .unwrap_or_else(|| "null".to_string());

        inner.queue.push_back(Delivery {
            to,
            message: InboundMessage::new(from, sender_origin, message.clone()),
        });
        Ok(())
    }
}

impl EventTarget for Mailbox {
    fn add_listener(&self, event: &'static str) -> Subscription {
        *self.inner.borrow_mut().listeners.entry(event).or_insert(0) += 1;
        let inner = Rc::clone(&self.inner);
        Subscription::new(event, move || {
            let mut inner = inner.borrow_mut();
            if let Some(count) = inner.listeners.get_mut(event) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    inner.listeners.remove(event);
                }
            }
        })
    }
}

/// One window's view of another window on the same [`Mailbox`].
#[derive(Debug, Clone)]
pub struct MemoryWindow {
    mailbox: Mailbox,
    from: WindowId,
    to: WindowId,
}

impl MessageTarget for MemoryWindow {
    fn id(&self) -> WindowId {
        self.to
    }

    fn post_message(&self, message: &Value, target_origin: &str) -> Result<()> {
        self.mailbox.post(self.from, self.to, message, target_origin)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn posts_are_queued_in_order() {
        let mailbox = Mailbox::new();
        let host = mailbox.open_window("https://host.example");
        let embed = mailbox.open_window("https://embed.example");
        let to_embed = mailbox.target(host, embed);

        to_embed.post_message(&json!("handshake"), "*").unwrap();
        to_embed
            .post_message(&json!({"methodName": "x"}), "https://embed.example")
            .unwrap();

        assert_eq!(mailbox.pending(), 2);
        let first = mailbox.pop().unwrap();
        assert_eq!(first.to, embed);
        assert_eq!(first.message.source, Some(host));
        assert_eq!(first.message.origin, "https://host.example");
        assert_eq!(first.message.data, json!("handshake"));
        assert_eq!(mailbox.drain().len(), 1);
    }

    #[test]
    fn origin_mismatch_is_rejected() {
        let mailbox = Mailbox::new();
        let host = mailbox.open_window("https://host.example");
        let embed = mailbox.open_window("https://embed.example");

        let err = mailbox
            .target(host, embed)
            .post_message(&json!("handshake"), "https://other.example")
            .unwrap_err();
        assert!(matches!(err, TransportError::OriginRejected { .. }));
        assert_eq!(mailbox.pending(), 0);
    }

    #[test]
    fn closed_window_is_gone() {
        let mailbox = Mailbox::new();
        let host = mailbox.open_window("https://host.example");
        let embed = mailbox.open_window("https://embed.example");
        mailbox.close_window(embed);

        let err = mailbox
            .target(host, embed)
            .post_message(&json!("handshake"), "*")
            .unwrap_err();
        assert!(matches!(err, TransportError::TargetGone(id) if id == embed));
    }

    #[test]
    fn listener_registrations_are_counted() {
        let mailbox = Mailbox::new();
        let first = mailbox.add_listener("message");
        let second = mailbox.add_listener("message");
        let key = mailbox.add_listener("keydown");
        assert_eq!(mailbox.listener_count("message"), 2);
        assert_eq!(mailbox.total_listeners(), 3);

        drop(first);
        drop(key);
        assert_eq!(mailbox.listener_count("message"), 1);
        assert_eq!(mailbox.listener_count("keydown"), 0);

        drop(second);
        assert_eq!(mailbox.total_listeners(), 0);
    }
}
