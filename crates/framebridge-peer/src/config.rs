use std::time::Duration;

use framebridge_viewport::{DEFAULT_VISIBILITY_THRESHOLD, LOCKED_VIEWPORT_CONTENT};

/// When the storage snapshot is pushed to the child frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoragePushPolicy {
    /// On every connection acknowledgement from the child, including
    /// redundant ones after the link is ready.
    #[default]
    EveryAck,
    /// Only on the first acknowledgement.
    FirstAckOnly,
}

/// Configuration for a bridge endpoint.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// How long an awaited remote call waits for its result.
    pub return_timeout: Duration,
    /// When the storage snapshot is pushed to the child.
    pub storage_push: StoragePushPolicy,
    /// Keys under this prefix hold opaque strings and skip JSON encoding.
    pub reserved_storage_prefix: String,
    /// Viewport meta content applied while a takeover is active.
    pub viewport_lock_content: String,
    /// Visible fraction at which visibility crossings are reported.
    pub visibility_threshold: f64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            return_timeout: Duration::from_millis(240),
            storage_push: StoragePushPolicy::default(),
            reserved_storage_prefix: "token:".to_string(),
            viewport_lock_content: LOCKED_VIEWPORT_CONTENT.to_string(),
            visibility_threshold: DEFAULT_VISIBILITY_THRESHOLD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = BridgeConfig::default();
        assert_eq!(config.return_timeout, Duration::from_millis(240));
        assert_eq!(config.storage_push, StoragePushPolicy::EveryAck);
        assert_eq!(config.visibility_threshold, 0.5);
        assert!(config.viewport_lock_content.contains("maximum-scale=1"));
    }
}
