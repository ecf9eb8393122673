//! Cross-origin bridge between a host page and the frames it embeds.
//!
//! framebridge lets a host page call named operations inside an embedded
//! frame it does not control, and the frame call back, over nothing but the
//! browser's message channel. On top of the calls it keeps fullscreen state
//! in step on both sides, mirrors the host's local storage into the frame
//! and forwards orientation and visibility events.
//!
//! # Crate Structure
//!
//! - [`transport`]: Message target abstraction, origin scoping, listener lifetimes
//! - [`envelope`]: Wire format for control tokens, calls and returns
//! - [`viewport`]: Fullscreen capability adapter and full-viewport takeover (behind `peer` feature)
//! - [`peer`]: Bridge endpoints (behind `peer` feature)

/// Re-export transport types.
pub mod transport {
    pub use framebridge_transport::*;
}

/// Re-export envelope types.
pub mod envelope {
    pub use framebridge_envelope::*;
}

/// Re-export viewport types (requires `peer` feature).
#[cfg(feature = "peer")]
pub mod viewport {
    pub use framebridge_viewport::*;
}

/// Re-export bridge types (requires `peer` feature).
#[cfg(feature = "peer")]
pub mod peer {
    pub use framebridge_peer::*;
}
