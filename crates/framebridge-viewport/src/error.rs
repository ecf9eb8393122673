/// Errors reported by viewport collaborators.
#[derive(Debug, thiserror::Error)]
pub enum ViewportError {
    /// The requested capability is not available in this browser.
    #[error("capability not supported: {0}")]
    Unsupported(String),

    /// The browser refused the request (e.g. no user gesture).
    #[error("request rejected: {0}")]
    Rejected(String),
}

pub type Result<T> = std::result::Result<T, ViewportError>;
