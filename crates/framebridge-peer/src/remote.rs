//! Correlation of `return` envelopes with awaited calls.
//!
//! Results are keyed by the peer a call went to and the operation name. The
//! wire format carries no per-call identifier, so two awaited calls to the
//! same operation on the same peer that overlap both resolve with whichever
//! result arrives first.

use std::collections::HashMap;

use serde_json::Value;
use tokio::sync::oneshot;

use crate::link::Direction;

/// Awaiters waiting for a `return` envelope, keyed by peer and operation.
#[derive(Debug, Default)]
pub struct ReturnSlots {
    waiting: HashMap<(Direction, String), Vec<oneshot::Sender<Value>>>,
}

impl ReturnSlots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register interest in the next result for `key` from `direction`.
    pub fn subscribe(&mut self, direction: Direction, key: &str) -> oneshot::Receiver<Value> {
        let (sender, receiver) = oneshot::channel();
        let slot = self
            .waiting
            .entry((direction, key.to_string()))
            .or_default();
        slot.retain(|sender| !sender.is_closed());
        slot.push(sender);
        receiver
    }

    /// Hand `value` from `direction` to every live awaiter of `key`.
    /// Returns how many received it; unmatched keys are a no-op.
    pub fn resolve(&mut self, direction: Direction, key: &str, value: Value) -> usize {
        let Some(senders) = self.waiting.remove(&(direction, key.to_string())) else {
            return 0;
        };
        senders
            .into_iter()
            .filter(|sender| !sender.is_closed())
            .filter_map(|sender| sender.send(value.clone()).ok())
            .count()
    }

    /// Number of live awaiters for `key` from `direction`.
    pub fn waiting(&self, direction: Direction, key: &str) -> usize {
        self.waiting
            .get(&(direction, key.to_string()))
            .map(|slot| slot.iter().filter(|sender| !sender.is_closed()).count())
            .unwrap_or(0)
    }
}
