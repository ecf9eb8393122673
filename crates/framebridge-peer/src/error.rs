/// Errors that can occur while setting up or driving a bridge.
#[derive(Debug, thiserror::Error)]
pub enum PeerError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] framebridge_transport::TransportError),

    /// Envelope encoding error.
    #[error("envelope error: {0}")]
    Envelope(#[from] framebridge_envelope::EnvelopeError),

    /// Operation names carrying the private marker cannot be registered.
    #[error("operation {0:?} is private and cannot be registered")]
    PrivateOperation(String),

    /// The operation name is reserved by the protocol.
    #[error("operation {0:?} is reserved")]
    ReservedOperation(String),

    /// An operation with this name is already registered.
    #[error("operation {0:?} is already registered")]
    DuplicateOperation(String),
}

/// Errors reported by a key-value store backend.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The store cannot be used at all (disabled, sandboxed).
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// A write exceeded the store's quota.
    #[error("storage quota exceeded")]
    QuotaExceeded,
}

pub type Result<T> = std::result::Result<T, PeerError>;
