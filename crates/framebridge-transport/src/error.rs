/// Errors that can occur when posting a message across the frame boundary.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The target window has been closed or navigated away.
    #[error("target window {0} is gone")]
    TargetGone(crate::WindowId),

    /// The recipient's origin does not match the requested target origin.
    #[error("target origin {target} does not match recipient origin {actual}")]
    OriginRejected { target: String, actual: String },

    /// The target origin string is not a valid origin.
    #[error("invalid target origin: {0}")]
    InvalidOrigin(String),
}

pub type Result<T> = std::result::Result<T, TransportError>;
