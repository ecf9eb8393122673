/// Errors that can occur while encoding or decoding envelopes.
#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    /// The payload is neither a control token nor a structured envelope.
    #[error("not an envelope: {0}")]
    NotAnEnvelope(String),

    /// Parameters could not be serialized.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EnvelopeError>;
