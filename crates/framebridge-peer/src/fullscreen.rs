//! Logical fullscreen state.
//!
//! Entering fullscreen always starts with a full-browser takeover; native
//! fullscreen is attempted on top of it. Cancelling always undoes the
//! takeover and leaves native fullscreen if the browser reports it, or as
//! soon as a request still in flight is granted.

use framebridge_viewport::NativeOutcome;
use serde_json::json;
use tokio::sync::oneshot::{self, error::TryRecvError};
use tracing::{debug, info};

use crate::bridge::Bridge;
use crate::events::{ESCAPE_KEY_CODE, KEYDOWN_EVENT};

/// What an outstanding native call was for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NativeIntent {
    Enter,
    Exit,
    /// An enter that was cancelled before the browser answered.
    AbandonedEnter,
}

/// A native request or exit whose completion has not been observed yet.
#[derive(Debug)]
pub(crate) struct PendingNative {
    intent: NativeIntent,
    receiver: oneshot::Receiver<bool>,
}

impl Bridge {
    /// Returns true if the logical fullscreen flag is set.
    pub fn is_full_screen(&self) -> bool {
        self.full_screen
    }

    /// Returns true while a takeover is active.
    pub fn is_full_browser(&self) -> bool {
        self.takeover.is_active()
    }

    /// Occupy the whole viewport with the target element. Repeated calls
    /// keep the first snapshot.
    pub fn enter_full_browser(&mut self) -> bool {
        let entered = self.takeover.enter(
            self.style.as_mut(),
            self.viewport.as_mut(),
            &self.config.viewport_lock_content,
        );
        if entered {
            self.escape_listener = Some(self.events.add_listener(KEYDOWN_EVENT));
            debug!("takeover entered");
            self.forward_document_event("fullbrowserchange", json!({ "isFullBrowser": true }));
        }
        true
    }

    /// Restore the element and the viewport to their pre-takeover state.
    pub fn cancel_full_browser(&mut self) -> bool {
        let exited = self.takeover.exit(self.style.as_mut(), self.viewport.as_mut());
        self.escape_listener = None;
        if exited {
            debug!("takeover exited");
            self.forward_document_event("fullbrowserchange", json!({ "isFullBrowser": false }));
        }
        true
    }

    /// Take over the viewport, then ask for native fullscreen. Returns
    /// whether the browser accepted the native request.
    pub fn enter_full_screen(&mut self) -> bool {
        self.reap_native();
        self.enter_full_browser();
        match self.capability.request_fullscreen() {
            NativeOutcome::NotAccepted => false,
            NativeOutcome::Settled => {
                self.set_full_screen(true);
                true
            }
            NativeOutcome::Pending(receiver) => {
                self.pending_native = Some(PendingNative {
                    intent: NativeIntent::Enter,
                    receiver,
                });
                true
            }
        }
    }

    /// Leave native fullscreen, then undo the takeover. Returns whether a
    /// native exit was accepted.
    ///
    /// A native enter still in flight is kept; if the browser grants it
    /// later, the bridge leaves fullscreen again right away.
    pub fn cancel_full_screen(&mut self) -> bool {
        self.reap_native();
        let abandoned = match self.pending_native.take() {
            Some(PendingNative {
                intent: NativeIntent::Enter | NativeIntent::AbandonedEnter,
                receiver,
            }) => Some(PendingNative {
                intent: NativeIntent::AbandonedEnter,
                receiver,
            }),
            _ => None,
        };
        let accepted = if self.capability.is_really_fullscreen() {
            self.exit_native()
        } else {
            self.set_full_screen(false);
            false
        };
        if self.pending_native.is_none() {
            self.pending_native = abandoned;
        }
        self.cancel_full_browser();
        accepted
    }

    /// React to the browser reporting a fullscreen change. Leaving real
    /// fullscreen behind the bridge's back cancels logical fullscreen too;
    /// real fullscreen with nothing logical behind it is left.
    pub fn handle_fullscreen_change(&mut self) {
        self.reap_native();
        if self.capability.is_really_fullscreen() {
            if !self.full_screen && !self.takeover.is_active() && self.pending_native.is_none() {
                info!("real fullscreen without a takeover, leaving it");
                self.exit_native();
            }
        } else if self.full_screen {
            info!("fullscreen left outside the bridge, cancelling");
            self.cancel_full_screen();
        }
        let really = self.capability.is_really_fullscreen();
        self.forward_document_event("fullscreenchange", json!({ "isRealFullscreen": really }));
    }

    /// Escape cancels fullscreen while a takeover is active.
    pub fn handle_key_down(&mut self, key_code: u32) {
        if key_code == ESCAPE_KEY_CODE && self.escape_listener.is_some() {
            debug!("escape pressed during takeover");
            self.cancel_full_screen();
        }
    }

    /// Wait for an outstanding native request or exit to complete. Returns
    /// `None` if nothing was outstanding, otherwise whether it succeeded.
    pub async fn settle_native(&mut self) -> Option<bool> {
        let pending = self.pending_native.take()?;
        let success = pending.receiver.await.unwrap_or(false);
        self.finish_native(pending.intent, success);
        Some(success)
    }

    /// Apply a native completion that has already arrived.
    pub(crate) fn reap_native(&mut self) {
        let Some(pending) = self.pending_native.as_mut() else {
            return;
        };
        let success = match pending.receiver.try_recv() {
            Ok(success) => success,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Closed) => false,
        };
        let intent = pending.intent;
        self.pending_native = None;
        self.finish_native(intent, success);
    }

    fn finish_native(&mut self, intent: NativeIntent, success: bool) {
        if !success {
            return;
        }
        match intent {
            NativeIntent::Enter => self.set_full_screen(true),
            NativeIntent::Exit => self.set_full_screen(false),
            NativeIntent::AbandonedEnter => {
                info!("native fullscreen granted after cancel, leaving it");
                self.exit_native();
            }
        }
    }

    fn exit_native(&mut self) -> bool {
        match self.capability.exit_fullscreen() {
            NativeOutcome::NotAccepted => false,
            NativeOutcome::Settled => {
                self.set_full_screen(false);
                true
            }
            NativeOutcome::Pending(receiver) => {
                self.pending_native = Some(PendingNative {
                    intent: NativeIntent::Exit,
                    receiver,
                });
                true
            }
        }
    }

    fn set_full_screen(&mut self, value: bool) {
        if self.full_screen == value {
            return;
        }
        self.full_screen = value;
        self.forward_document_event("fullscreenstate", json!({ "isFullScreen": value }));
    }
}
