//! Bare string control tokens.
//!
//! These predate structured envelopes and are still exchanged for the
//! handshake and for fullscreen requests coming from the embedded side.

use std::fmt;

use serde_json::Value;

/// Connection open.
pub const HANDSHAKE: &str = "handshake";
/// Connection acknowledgement.
pub const HANDSHAKE_SUCCEEDED: &str = "handshakeSucceeded";
/// Enter full-browser takeover.
pub const FULL_BROWSER: &str = "fullbrowser";
/// Leave full-browser takeover.
pub const FULL_BROWSER_OFF: &str = "fullbrowser-off";
/// Enter fullscreen.
pub const FULL_SCREEN: &str = "fullscr";
/// Leave fullscreen.
pub const CANCEL_FULL_SCREEN: &str = "cancelfullscr";

/// A recognized control token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlToken {
    Handshake,
    HandshakeSucceeded,
    FullBrowser,
    FullBrowserOff,
    FullScreen,
    CancelFullScreen,
}

impl ControlToken {
    /// Every token, in wire-table order.
    pub const ALL: [ControlToken; 6] = [
        ControlToken::Handshake,
        ControlToken::HandshakeSucceeded,
        ControlToken::FullBrowser,
        ControlToken::FullBrowserOff,
        ControlToken::FullScreen,
        ControlToken::CancelFullScreen,
    ];

    /// The exact wire string.
    pub fn as_str(self) -> &'static str {
        match self {
            ControlToken::Handshake => HANDSHAKE,
            ControlToken::HandshakeSucceeded => HANDSHAKE_SUCCEEDED,
            ControlToken::FullBrowser => FULL_BROWSER,
            ControlToken::FullBrowserOff => FULL_BROWSER_OFF,
            ControlToken::FullScreen => FULL_SCREEN,
            ControlToken::CancelFullScreen => CANCEL_FULL_SCREEN,
        }
    }

    /// Exact-match lookup. Unrecognized strings yield `None`.
    pub fn from_wire(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|token| token.as_str() == raw)
    }

    /// The token as a postable payload.
    pub fn to_wire(self) -> Value {
        Value::String(self.as_str().to_string())
    }

    /// Returns true for the two connection tokens.
    pub fn is_handshake(self) -> bool {
        matches!(
            self,
            ControlToken::Handshake | ControlToken::HandshakeSucceeded
        )
    }
}

impl fmt::Display for ControlToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_table_is_exact() {
        for token in ControlToken::ALL {
            assert_eq!(ControlToken::from_wire(token.as_str()), Some(token));
        }
        assert_eq!(ControlToken::from_wire("Handshake"), None);
        assert_eq!(ControlToken::from_wire(" handshake"), None);
        assert_eq!(ControlToken::from_wire("fullscreen"), None);
    }

    #[test]
    fn handshake_tokens() {
        assert!(ControlToken::Handshake.is_handshake());
        assert!(ControlToken::HandshakeSucceeded.is_handshake());
        assert!(!ControlToken::FullScreen.is_handshake());
        assert_eq!(ControlToken::FullBrowserOff.to_string(), "fullbrowser-off");
    }
}
