use std::collections::VecDeque;

use serde_json::Value;

/// A call waiting for its direction to become ready.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueItem {
    pub operation: String,
    pub params: Value,
}

impl QueueItem {
    pub fn new(operation: impl Into<String>, params: Value) -> Self {
        Self {
            operation: operation.into(),
            params,
        }
    }
}

/// FIFO buffer for one direction.
///
/// Draining closes the queue for good: once a direction is ready it stays
/// ready, and callers send directly instead of enqueueing.
#[derive(Debug, Default)]
pub struct CallQueue {
    items: VecDeque<QueueItem>,
    closed: bool,
}

impl CallQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `item`. A closed queue hands the item back.
    pub fn enqueue(&mut self, item: QueueItem) -> std::result::Result<(), QueueItem> {
        if self.closed {
            return Err(item);
        }
        self.items.push_back(item);
        Ok(())
    }

    /// Pass every buffered item to `sender`, oldest first, then close the
    /// queue. Returns the number of items handed over; zero on every call
    /// after the first.
    pub fn drain_into<F: FnMut(QueueItem)>(&mut self, mut sender: F) -> usize {
        self.closed = true;
        let mut count = 0;
        while let Some(item) = self.items.pop_front() {
            sender(item);
            count += 1;
        }
        count
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn drains_in_insertion_order() {
        let mut queue = CallQueue::new();
        for n in 0..5 {
            queue.enqueue(QueueItem::new(format!("op{n}"), json!(n))).unwrap();
        }
        assert_eq!(queue.len(), 5);

        let mut seen = Vec::new();
        let count = queue.drain_into(|item| seen.push(item.operation));
        assert_eq!(count, 5);
        assert_eq!(seen, vec!["op0", "op1", "op2", "op3", "op4"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn drains_exactly_once() {
        let mut queue = CallQueue::new();
        queue.enqueue(QueueItem::new("a", Value::Null)).unwrap();
        assert_eq!(queue.drain_into(|_| {}), 1);
        assert_eq!(queue.drain_into(|_| panic!("drained twice")), 0);
        assert!(queue.is_closed());
    }

    #[test]
    fn closed_queue_returns_item() {
        let mut queue = CallQueue::new();
        queue.drain_into(|_| {});
        let item = QueueItem::new("late", json!([1]));
        assert_eq!(queue.enqueue(item.clone()), Err(item));
    }
}
