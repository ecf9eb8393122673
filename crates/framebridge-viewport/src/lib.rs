//! Fullscreen capability detection and full-viewport takeover.
//!
//! Browsers disagree on what entering fullscreen is called. The
//! [`CapabilityAdapter`] hides that behind `request_fullscreen`,
//! `exit_fullscreen` and `observe_visibility`. The [`Takeover`] state holds
//! everything needed to undo a style-based full-viewport occupation exactly.

pub mod capability;
pub mod error;
pub mod memory;
pub mod style;
pub mod takeover;
pub mod viewport;

pub use capability::{
    exit_candidates, request_candidates, CapabilityAdapter, FullscreenHost, NativeOutcome, Scope,
    VisibilityHost, VisibilitySink, DEFAULT_VISIBILITY_THRESHOLD,
};
pub use error::{Result, ViewportError};
pub use style::{StyleProperty, StyleSnapshot, StyleTarget};
pub use takeover::Takeover;
pub use viewport::{ViewportLock, ViewportMeta, LOCKED_VIEWPORT_CONTENT};
