//! Cross-document message transport abstraction.
//!
//! Provides the seams a bridge uses to talk to the one window on the other
//! side of a frame boundary:
//! - [`MessageTarget`] posts a payload to a window, scoped by target origin
//! - [`EventTarget`] hands out scoped listener registrations
//! - [`memory`] implements both in-process, for tests and the simulator
//!
//! This is the lowest layer of framebridge. Payloads are plain
//! [`serde_json::Value`]s, mirroring what the browser's structured clone
//! delivers for strings and plain objects.

pub mod error;
pub mod listener;
pub mod memory;
pub mod origin;
pub mod traits;

pub use error::{Result, TransportError};
pub use listener::{EventTarget, Subscription};
pub use memory::{Delivery, Mailbox, MemoryWindow};
pub use origin::{origin_matches, resolve_origin, ANY_ORIGIN};
pub use traits::{InboundMessage, MessageTarget, WindowId};
