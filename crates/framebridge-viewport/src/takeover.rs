use crate::style::{apply_takeover, StyleSnapshot, StyleTarget};
use crate::viewport::{ViewportLock, ViewportMeta};

/// Full-viewport takeover state for one element.
///
/// A snapshot exists exactly while the takeover is active; entering again
/// while active changes nothing.
#[derive(Debug, Default)]
pub struct Takeover {
    snapshot: Option<StyleSnapshot>,
    lock: ViewportLock,
}

impl Takeover {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock zoom, snapshot the element's styles and stretch it over the
    /// viewport. Returns false if a takeover was already active.
    pub fn enter(
        &mut self,
        target: &mut dyn StyleTarget,
        meta: &mut dyn ViewportMeta,
        lock_content: &str,
    ) -> bool {
        if self.snapshot.is_some() {
            return false;
        }
        self.lock.lock(meta, lock_content);
        self.snapshot = Some(StyleSnapshot::capture(target));
        apply_takeover(target);
        true
    }

    /// Restore styles and viewport content. Returns false if no takeover
    /// was active.
    pub fn exit(&mut self, target: &mut dyn StyleTarget, meta: &mut dyn ViewportMeta) -> bool {
        let restored = match self.snapshot.take() {
            Some(snapshot) => {
                snapshot.restore(target);
                true
            }
            None => false,
        };
        let unlocked = self.lock.unlock(meta);
        restored || unlocked
    }

    pub fn is_active(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Styles that will be restored on exit.
    pub fn snapshot(&self) -> Option<&StyleSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn viewport_locked(&self) -> bool {
        self.lock.is_locked()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryStyle, MemoryViewport};
    use crate::style::StyleProperty;
    use crate::viewport::LOCKED_VIEWPORT_CONTENT;

    #[test]
    fn nested_enter_is_idempotent() {
        let mut style = MemoryStyle::default();
        style.set_style(StyleProperty::Width, "300px");
        let mut meta = MemoryViewport::with_content("initial-scale=1");
        let mut takeover = Takeover::new();

        assert!(takeover.enter(&mut style, &mut meta, LOCKED_VIEWPORT_CONTENT));
        assert!(!takeover.enter(&mut style, &mut meta, LOCKED_VIEWPORT_CONTENT));
        assert_eq!(
            takeover.snapshot().and_then(|s| s.get(StyleProperty::Width)),
            Some("300px")
        );

        assert!(takeover.exit(&mut style, &mut meta));
        assert!(!takeover.is_active());
        assert!(!takeover.viewport_locked());
        assert_eq!(style.style(StyleProperty::Width), "300px");
        assert_eq!(meta.content().as_deref(), Some("initial-scale=1"));
        assert!(!takeover.exit(&mut style, &mut meta));
    }
}
