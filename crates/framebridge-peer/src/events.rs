//! Ambient browser events and their forwarding to the peer.

use serde::Serialize;
use serde_json::{json, Value};
use tracing::trace;

use crate::bridge::Bridge;
use crate::link::Direction;

pub const MESSAGE_EVENT: &str = "message";
pub const DEVICE_ORIENTATION_EVENT: &str = "deviceorientation";
pub const ORIENTATION_CHANGE_EVENT: &str = "orientationchange";
pub const KEYDOWN_EVENT: &str = "keydown";

/// Events every bridge listens to for its whole life.
pub const LISTENED_EVENTS: [&str; 3] = [
    MESSAGE_EVENT,
    DEVICE_ORIENTATION_EVENT,
    ORIENTATION_CHANGE_EVENT,
];

/// Every name browsers use for the real fullscreen change event.
pub const FULLSCREEN_CHANGE_EVENTS: [&str; 5] = [
    "fullscreenchange",
    "fullscreenchanged",
    "webkitfullscreenchange",
    "MSFullscreenChange",
    "mozfullscreenchange",
];

pub const ESCAPE_KEY_CODE: u32 = 27;

/// One device orientation reading, in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DeviceOrientation {
    pub alpha: Option<f64>,
    pub beta: Option<f64>,
    pub gamma: Option<f64>,
}

/// Screen rotation in degrees, from the screen orientation type when the
/// browser reports one, else from the legacy window orientation.
pub fn orientation_degrees(screen_type: Option<&str>, legacy: Option<i32>) -> i32 {
    match screen_type {
        Some("landscape-primary") => 90,
        Some("landscape-secondary") => -90,
        Some("portrait-secondary") => 180,
        Some("portrait-primary") => 0,
        _ => legacy.unwrap_or(0),
    }
}

impl Bridge {
    pub fn handle_device_orientation(&mut self, reading: DeviceOrientation) {
        self.forward_window_event(DEVICE_ORIENTATION_EVENT, json!(reading));
    }

    pub fn handle_orientation_change(&mut self, screen_type: Option<&str>, legacy: Option<i32>) {
        let orientation = orientation_degrees(screen_type, legacy);
        self.forward_window_event(
            ORIENTATION_CHANGE_EVENT,
            json!({ "orientation": orientation }),
        );
    }

    /// Report a visibility crossing of the watched element.
    pub fn handle_visibility_change(&mut self, visible: bool) {
        self.forward_window_event("visibilitychange", json!({ "isVisible": visible }));
    }

    /// Start (or restart) watching the element's visibility.
    ///
    /// Crossings are forwarded by [`Bridge::poll_visibility`], which every
    /// inbound message also runs.
    pub async fn observe_visibility(&mut self) -> bool {
        let threshold = self.config.visibility_threshold;
        self.visibility_crossings = self.capability.observe_visibility(threshold).await;
        self.visibility_crossings.is_some()
    }

    /// Forward every crossing reported since the last poll. Returns how
    /// many were forwarded.
    pub fn poll_visibility(&mut self) -> usize {
        let mut crossings = Vec::new();
        if let Some(receiver) = self.visibility_crossings.as_mut() {
            while let Ok(visible) = receiver.try_recv() {
                crossings.push(visible);
            }
        }
        for &visible in &crossings {
            self.handle_visibility_change(visible);
        }
        crossings.len()
    }

    /// Events go to the embedded frame when there is one, else to the host.
    fn forward_direction(&self) -> Option<Direction> {
        if self.child.is_some() {
            Some(Direction::Child)
        } else if self.parent.is_some() {
            Some(Direction::Parent)
        } else {
            None
        }
    }

    pub(crate) fn forward_window_event(&mut self, event_type: &str, props: Value) {
        if let Some(direction) = self.forward_direction() {
            self.forward(direction, direction.window_event_operation(), event_type, props);
        }
    }

    pub(crate) fn forward_document_event(&mut self, event_type: &str, props: Value) {
        if let Some(direction) = self.forward_direction() {
            self.forward(direction, direction.document_event_operation(), event_type, props);
        }
    }

    fn forward(&mut self, direction: Direction, operation: &str, event_type: &str, props: Value) {
        trace!(event_type, operation, "forwarding event");
        self.call(
            direction,
            operation,
            json!({ "eventType": event_type, "eventProps": props }),
        );
    }
}

#[cfg(test)]
mod tests {
    use framebridge_transport::Mailbox;
    use framebridge_viewport::memory::PolyfillBehavior;
    use serde_json::json;

    use crate::config::BridgeConfig;
    use crate::testing::{embed_bridge, host_bridge, Page};

    use super::*;

    fn calls(mailbox: &Mailbox, to: framebridge_transport::WindowId) -> Vec<(String, Value)> {
        mailbox
            .peek_for(to)
            .into_iter()
            .filter_map(|payload| {
                let name = payload["methodName"].as_str()?.to_string();
                let params = serde_json::from_str(payload["paramsJson"].as_str()?).ok()?;
                Some((name, params))
            })
            .collect()
    }

    #[test]
    fn orientation_from_screen_type() {
        assert_eq!(orientation_degrees(Some("landscape-primary"), Some(0)), 90);
        assert_eq!(orientation_degrees(Some("landscape-secondary"), None), -90);
        assert_eq!(orientation_degrees(Some("portrait-secondary"), None), 180);
        assert_eq!(orientation_degrees(Some("portrait-primary"), Some(90)), 0);
        assert_eq!(orientation_degrees(None, Some(-90)), -90);
        assert_eq!(orientation_degrees(Some("sideways"), None), 0);
    }

    #[test]
    fn host_forwards_window_events_to_child() {
        let mailbox = Mailbox::new();
        let page = Page::new(&mailbox);
        let mut host = host_bridge(&page, BridgeConfig::default());
        host.handle_message(&page.from_embed(json!("handshakeSucceeded")));
        mailbox.drain();

        host.handle_device_orientation(DeviceOrientation {
            alpha: Some(10.0),
            beta: Some(-5.5),
            gamma: None,
        });
        host.handle_orientation_change(Some("landscape-primary"), None);
        host.handle_visibility_change(false);

        assert_eq!(
            calls(&mailbox, page.embed),
            vec![
                (
                    "handleParentWindowEvent".to_string(),
                    json!({
                        "eventType": "deviceorientation",
                        "eventProps": {"alpha": 10.0, "beta": -5.5, "gamma": null}
                    })
                ),
                (
                    "handleParentWindowEvent".to_string(),
                    json!({"eventType": "orientationchange", "eventProps": {"orientation": 90}})
                ),
                (
                    "handleParentWindowEvent".to_string(),
                    json!({"eventType": "visibilitychange", "eventProps": {"isVisible": false}})
                ),
            ]
        );
    }

    #[test]
    fn embed_forwards_to_parent() {
        let mailbox = Mailbox::new();
        let page = Page::new(&mailbox);
        let mut embed = embed_bridge(&page, BridgeConfig::default());
        embed.handle_message(&page.from_host(json!("handshakeSucceeded")));
        mailbox.drain();

        embed.enter_full_browser();
        assert_eq!(
            calls(&mailbox, page.host),
            vec![(
                "handleChildDocumentEvent".to_string(),
                json!({"eventType": "fullbrowserchange", "eventProps": {"isFullBrowser": true}})
            )]
        );
    }

    #[tokio::test]
    async fn observe_visibility_uses_configured_threshold() {
        let mailbox = Mailbox::new();
        let page = Page::new(&mailbox);
        let config = BridgeConfig {
            visibility_threshold: 0.25,
            ..BridgeConfig::default()
        };
        let mut host = host_bridge(&page, config);
        assert!(host.observe_visibility().await);
        assert_eq!(page.host_env.visibility.threshold(), Some(0.25));
    }

    #[tokio::test]
    async fn observe_visibility_gives_up_without_polyfill() {
        let mailbox = Mailbox::new();
        let mut page = Page::new(&mailbox);
        page.host_env.visibility =
            framebridge_viewport::memory::MemoryVisibility::unsupported(PolyfillBehavior::Fails);
        let mut host = host_bridge(&page, BridgeConfig::default());
        assert!(!host.observe_visibility().await);
        assert_eq!(page.host_env.visibility.observe_calls(), 0);
    }

    #[tokio::test]
    async fn visibility_crossings_are_forwarded() {
        let mailbox = Mailbox::new();
        let page = Page::new(&mailbox);
        let mut host = host_bridge(&page, BridgeConfig::default());
        host.handle_message(&page.from_embed(json!("handshakeSucceeded")));
        assert!(host.observe_visibility().await);
        mailbox.drain();

        assert!(page.host_env.visibility.cross(true));
        assert!(page.host_env.visibility.cross(false));
        assert_eq!(host.poll_visibility(), 2);
        assert_eq!(host.poll_visibility(), 0);

        assert_eq!(
            calls(&mailbox, page.embed),
            vec![
                (
                    "handleParentWindowEvent".to_string(),
                    json!({"eventType": "visibilitychange", "eventProps": {"isVisible": true}})
                ),
                (
                    "handleParentWindowEvent".to_string(),
                    json!({"eventType": "visibilitychange", "eventProps": {"isVisible": false}})
                ),
            ]
        );
    }
}
