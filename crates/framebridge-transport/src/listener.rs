use std::fmt;

/// A scoped listener registration.
///
/// Dropping the subscription releases the registration, so a bridge that is
/// dropped on any path detaches everything it attached.
pub struct Subscription {
    event: &'static str,
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Create a registration that runs `release` when dropped.
    pub fn new(event: &'static str, release: impl FnOnce() + 'static) -> Self {
        Self {
            event,
            release: Some(Box::new(release)),
        }
    }

    /// Create a registration with nothing to release.
    pub fn detached(event: &'static str) -> Self {
        Self {
            event,
            release: None,
        }
    }

    /// Name of the event this registration listens for.
    pub fn event(&self) -> &'static str {
        self.event
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            tracing::trace!(event = self.event, "releasing listener");
            release();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("event", &self.event)
            .field("active", &self.release.is_some())
            .finish()
    }
}

/// Source of ambient events (window, document) a bridge listens to.
///
/// The embedding layer routes the actual event callbacks to the bridge's
/// `handle_*` methods; this trait only models the registration lifetime.
pub trait EventTarget {
    /// Register interest in `event`.
    fn add_listener(&self, event: &'static str) -> Subscription;
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn drop_runs_release_once() {
        let released = Rc::new(Cell::new(0));
        let counter = Rc::clone(&released);
        let sub = Subscription::new("message", move || counter.set(counter.get() + 1));
        assert_eq!(sub.event(), "message");
        drop(sub);
        assert_eq!(released.get(), 1);
    }

    #[test]
    fn detached_debug_output() {
        let sub = Subscription::detached("keydown");
        let debug = format!("{sub:?}");
        assert!(debug.contains("keydown"));
        assert!(debug.contains("active: false"));
    }
}
