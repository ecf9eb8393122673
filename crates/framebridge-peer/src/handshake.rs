//! Connection readiness, per direction.
//!
//! Either side may open first. An open token is answered with an
//! acknowledgement and then handled exactly like one, so two endpoints
//! opening at the same time still both become ready.

use framebridge_envelope::{encode_call, ControlToken};
use serde_json::Value;
use tracing::{debug, warn};

use crate::bridge::Bridge;
use crate::config::StoragePushPolicy;
use crate::error::PeerError;
use crate::link::Direction;
use crate::registry::SET_STORAGE_ITEMS;

impl Bridge {
    pub(crate) fn handle_control(&mut self, direction: Direction, token: ControlToken) {
        debug!(direction = %direction, token = %token, "control token");
        match token {
            ControlToken::Handshake => {
                if let Some(link) = self.link(direction) {
                    link.acknowledge();
                }
                self.on_connection_ack(direction);
            }
            ControlToken::HandshakeSucceeded => self.on_connection_ack(direction),
            ControlToken::FullBrowser | ControlToken::FullScreen => {
                self.enter_full_screen();
            }
            ControlToken::FullBrowserOff | ControlToken::CancelFullScreen => {
                self.cancel_full_screen();
            }
        }
    }

    fn on_connection_ack(&mut self, direction: Direction) {
        if direction == Direction::Child {
            self.push_storage();
        }
        if let Some(link) = self.link_mut(direction) {
            link.mark_ready();
        }
    }

    /// Send the whole store to the child as one batched call, ahead of
    /// anything queued.
    fn push_storage(&mut self) {
        if self.config.storage_push == StoragePushPolicy::FirstAckOnly && self.storage_pushed {
            debug!("storage already pushed to child");
            return;
        }
        let items = match serde_json::to_value(self.storage.items()) {
            Ok(items) => items,
            Err(err) => {
                warn!(error = %err, "failed to encode storage snapshot");
                return;
            }
        };
        let Some(link) = self.child.as_ref() else {
            return;
        };
        let sent = encode_call(SET_STORAGE_ITEMS, &Value::Array(vec![items]))
            .map_err(PeerError::from)
            .and_then(|message| link.post(&message));
        match sent {
            Ok(()) => self.storage_pushed = true,
            Err(err) => warn!(error = %err, "failed to push storage to child"),
        }
    }
}

#[cfg(test)]
mod tests {
    use framebridge_transport::{Delivery, Mailbox, WindowId};
    use serde_json::json;

    use crate::config::BridgeConfig;
    use crate::link::HandshakeState;
    use crate::testing::{embed_bridge, host_bridge, Page};

    use super::*;

    fn payloads(deliveries: &[Delivery], to: WindowId) -> Vec<Value> {
        deliveries
            .iter()
            .filter(|delivery| delivery.to == to)
            .map(|delivery| delivery.message.data.clone())
            .collect()
    }

    #[test]
    fn opening_posts_handshake() {
        let mailbox = Mailbox::new();
        let page = Page::new(&mailbox);
        let host = host_bridge(&page, BridgeConfig::default());
        assert_eq!(host.link_state(Direction::Child), Some(HandshakeState::AckPending));
        assert_eq!(host.link_state(Direction::Parent), None);
        assert_eq!(mailbox.peek_for(page.embed), vec![json!("handshake")]);
    }

    #[test]
    fn open_is_answered_and_counts_as_ack() {
        let mailbox = Mailbox::new();
        let page = Page::new(&mailbox);
        let mut host = host_bridge(&page, BridgeConfig::default());
        let mut embed = embed_bridge(&page, BridgeConfig::default());

        // host -> embed "handshake" makes the embed ready and acknowledged.
        page.pump(&mut host, &mut embed);
        assert_eq!(embed.link_state(Direction::Parent), Some(HandshakeState::Ready));
        assert_eq!(host.link_state(Direction::Child), Some(HandshakeState::Ready));
    }

    #[test]
    fn queued_calls_flush_in_order() {
        let mailbox = Mailbox::new();
        let page = Page::new(&mailbox);
        let mut host = host_bridge(&page, BridgeConfig::default());
        for n in 0..5 {
            host.call_child("step", json!([n]));
        }
        assert_eq!(host.queued(Direction::Child), 5);
        mailbox.drain();

        host.handle_message(&page.from_embed(json!("handshakeSucceeded")));
        let sent = payloads(&mailbox.drain(), page.embed);
        let steps: Vec<Value> = sent
            .iter()
            .filter(|payload| payload["methodName"] == "step")
            .map(|payload| payload["paramsJson"].clone())
            .collect();
        assert_eq!(
            steps,
            (0..5).map(|n| json!(format!("[{n}]"))).collect::<Vec<_>>()
        );
        assert_eq!(host.queued(Direction::Child), 0);
    }

    #[test]
    fn redundant_tokens_never_redeliver() {
        let mailbox = Mailbox::new();
        let page = Page::new(&mailbox);
        let mut host = host_bridge(&page, BridgeConfig::default());
        host.call_child("resize", json!({"w": 1}));
        mailbox.drain();

        host.handle_message(&page.from_embed(json!("handshakeSucceeded")));
        let first = payloads(&mailbox.drain(), page.embed);
        assert_eq!(
            first.iter().filter(|p| p["methodName"] == "resize").count(),
            1
        );

        host.handle_message(&page.from_embed(json!("handshake")));
        host.handle_message(&page.from_embed(json!("handshakeSucceeded")));
        let later = payloads(&mailbox.drain(), page.embed);
        assert!(later.iter().all(|p| p["methodName"] != "resize"));
        assert_eq!(host.link_state(Direction::Child), Some(HandshakeState::Ready));
    }

    #[test]
    fn storage_push_precedes_queued_calls() {
        let mailbox = Mailbox::new();
        let page = Page::new(&mailbox);
        page.seed_host_storage("volume", "0.5");
        let mut host = host_bridge(&page, BridgeConfig::default());
        host.call_child("play", Value::Null);
        mailbox.drain();

        host.handle_message(&page.from_embed(json!("handshakeSucceeded")));
        let sent = payloads(&mailbox.drain(), page.embed);
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0]["methodName"], "setLocalStorageItems");
        assert_eq!(sent[0]["paramsJson"], "[[{\"key\":\"volume\",\"value\":0.5}]]");
        assert_eq!(sent[1]["methodName"], "play");
    }

    #[test]
    fn storage_push_repeats_on_every_ack_by_default() {
        let mailbox = Mailbox::new();
        let page = Page::new(&mailbox);
        let mut host = host_bridge(&page, BridgeConfig::default());
        mailbox.drain();

        for _ in 0..3 {
            host.handle_message(&page.from_embed(json!("handshakeSucceeded")));
        }
        let pushes = payloads(&mailbox.drain(), page.embed)
            .into_iter()
            .filter(|p| p["methodName"] == "setLocalStorageItems")
            .count();
        assert_eq!(pushes, 3);
    }

    #[test]
    fn storage_push_once_when_configured() {
        let mailbox = Mailbox::new();
        let page = Page::new(&mailbox);
        let config = BridgeConfig {
            storage_push: StoragePushPolicy::FirstAckOnly,
            ..BridgeConfig::default()
        };
        let mut host = host_bridge(&page, config);
        mailbox.drain();

        for _ in 0..3 {
            host.handle_message(&page.from_embed(json!("handshakeSucceeded")));
        }
        let pushes = payloads(&mailbox.drain(), page.embed)
            .into_iter()
            .filter(|p| p["methodName"] == "setLocalStorageItems")
            .count();
        assert_eq!(pushes, 1);
    }

    #[test]
    fn parent_ack_does_not_push_storage() {
        let mailbox = Mailbox::new();
        let page = Page::new(&mailbox);
        let mut embed = embed_bridge(&page, BridgeConfig::default());
        mailbox.drain();

        embed.handle_message(&page.from_host(json!("handshakeSucceeded")));
        assert_eq!(embed.link_state(Direction::Parent), Some(HandshakeState::Ready));
        assert!(mailbox.drain().is_empty());
    }

    #[test]
    fn unknown_source_is_ignored() {
        let mailbox = Mailbox::new();
        let page = Page::new(&mailbox);
        let mut host = host_bridge(&page, BridgeConfig::default());
        let stranger = mailbox.open_window("https://stranger.example");
        mailbox.drain();

        host.handle_message(&framebridge_transport::InboundMessage::new(
            stranger,
            "https://stranger.example",
            json!("handshakeSucceeded"),
        ));
        assert_eq!(host.link_state(Direction::Child), Some(HandshakeState::AckPending));
        assert_eq!(mailbox.pending(), 0);
    }
}
