//! Bridge endpoints for a host page and the frames it embeds.
//!
//! A [`Bridge`] is bound to one peer window (an embedded frame, or the
//! hosting window when running inside the frame). It queues calls until the
//! peer has completed the handshake, dispatches inbound calls to registered
//! operations, keeps a logical fullscreen flag in step with the browser and
//! forwards ambient events across the frame boundary.

pub mod bootstrap;
pub mod bridge;
pub mod config;
pub mod error;
pub mod events;
mod fullscreen;
mod handshake;
pub mod link;
pub mod location;
pub mod queue;
pub mod registry;
pub mod remote;
pub mod storage;

#[cfg(test)]
mod testing;

pub use bootstrap::BridgeRegistry;
pub use bridge::{Bridge, BridgeBuilder, HostParts, InstanceInfo};
pub use config::{BridgeConfig, StoragePushPolicy};
pub use error::{PeerError, Result, StorageError};
pub use events::{orientation_degrees, DeviceOrientation, ESCAPE_KEY_CODE};
pub use link::{Direction, HandshakeState};
pub use location::{Location, MemoryLocation};
pub use registry::{Handler, OperationRegistry};
pub use storage::{KeyValueStore, MemoryStore, StorageItem, StorageMirror};
