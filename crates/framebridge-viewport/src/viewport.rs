//! Zoom locking through the viewport meta tag.

/// Meta content applied while the viewport is locked.
pub const LOCKED_VIEWPORT_CONTENT: &str =
    "width=device-width, initial-scale=1, maximum-scale=1, minimum-scale=1, user-scalable=1";

/// The document's `<meta name="viewport">` tag.
pub trait ViewportMeta {
    /// Current content, `None` if the tag does not exist.
    fn content(&self) -> Option<String>;

    /// Set the content, creating the tag in `<head>` if needed.
    fn set_content(&mut self, content: &str);
}

/// Lock state plus the content to restore on unlock.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewportLock {
    saved: Option<String>,
}

impl ViewportLock {
    /// Lock zoom. Returns false if already locked.
    pub fn lock(&mut self, meta: &mut dyn ViewportMeta, content: &str) -> bool {
        if self.saved.is_some() {
            return false;
        }
        self.saved = Some(meta.content().unwrap_or_default());
        meta.set_content(content);
        true
    }

    /// Restore the content recorded by [`ViewportLock::lock`]. Returns false
    /// if not locked.
    pub fn unlock(&mut self, meta: &mut dyn ViewportMeta) -> bool {
        match self.saved.take() {
            Some(previous) => {
                meta.set_content(&previous);
                true
            }
            None => false,
        }
    }

    pub fn is_locked(&self) -> bool {
        self.saved.is_some()
    }

    /// Content that will be restored on unlock.
    pub fn saved_content(&self) -> Option<&str> {
        self.saved.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryViewport;

    #[test]
    fn lock_and_restore() {
        let mut meta = MemoryViewport::with_content("width=device-width, initial-scale=2");
        let mut lock = ViewportLock::default();

        assert!(lock.lock(&mut meta, LOCKED_VIEWPORT_CONTENT));
        assert!(!lock.lock(&mut meta, "other"));
        assert_eq!(meta.content().as_deref(), Some(LOCKED_VIEWPORT_CONTENT));
        assert_eq!(
            lock.saved_content(),
            Some("width=device-width, initial-scale=2")
        );

        assert!(lock.unlock(&mut meta));
        assert!(!lock.unlock(&mut meta));
        assert_eq!(
            meta.content().as_deref(),
            Some("width=device-width, initial-scale=2")
        );
    }

    #[test]
    fn missing_tag_is_created_and_emptied() {
        let mut meta = MemoryViewport::missing();
        let mut lock = ViewportLock::default();
        lock.lock(&mut meta, LOCKED_VIEWPORT_CONTENT);
        assert!(meta.content().is_some());
        lock.unlock(&mut meta);
        assert_eq!(meta.content().as_deref(), Some(""));
    }
}
