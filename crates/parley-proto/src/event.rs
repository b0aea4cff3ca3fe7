//! Channel events.
//!
//! Both directions share the frame envelope `{"event": <name>, "data":
//! <payload>}`; event names are kebab-case. [`ServerEvent`] covers
//! everything the rendezvous server pushes down, [`ClientEvent`] everything
//! a client emits up. Chat and negotiation traffic are multiplexed on the
//! same channel, so both event sets carry a `signal` variant.

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{error::ProtocolError, room::RoomId, signal::SignalEnvelope};

/// Events pushed by the rendezvous server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// No partner is available yet; keep waiting.
    Waiting,
    /// Matched with a partner into a room.
    Paired(PairedInfo),
    /// Chat message from the partner.
    Message(ChatText),
    /// System notification to show the user.
    Notification(Notification),
    /// The partner's channel went away.
    PartnerDisconnected,
    /// Negotiation signal relayed from the partner.
    Signal(SignalEnvelope),
}

impl ServerEvent {
    /// Event names this side of the protocol understands.
    const NAMES: [&'static str; 6] =
        ["waiting", "paired", "message", "notification", "partner-disconnected", "signal"];

    /// Decode one frame of server traffic.
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        decode_frame(text, &Self::NAMES)
    }

    /// Encode this event as one text frame.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Decode(e.to_string()))
    }
}

/// Payload of the `paired` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairedInfo {
    /// Room the pair was placed in.
    pub room: RoomId,
    /// Whether this client proposes the first connection description.
    #[serde(rename = "isInitiator", default)]
    pub is_initiator: bool,
}

/// Chat text as it appears on the wire.
///
/// Older servers relay the bare string a partner typed; newer ones wrap it
/// in an object. Both shapes decode; encoding always produces the bare
/// string form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatText {
    /// Bare message string.
    Plain(String),
    /// Object-wrapped message.
    Tagged {
        /// The message text.
        text: String,
    },
}

impl ChatText {
    /// The message text regardless of wire shape.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Plain(text) | Self::Tagged { text } => text,
        }
    }
}

/// Payload of the `notification` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Human-readable notification text.
    pub message: String,
}

/// Events a client emits to the rendezvous server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Chat message to the partner in a room.
    Message(OutboundMessage),
    /// Negotiation signal for the partner in a room.
    Signal(SignalEnvelope),
}

impl ClientEvent {
    /// Event names this side of the protocol understands.
    const NAMES: [&'static str; 2] = ["message", "signal"];

    /// Decode one frame of client traffic.
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        decode_frame(text, &Self::NAMES)
    }

    /// Encode this event as one text frame.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Decode(e.to_string()))
    }
}

/// Payload of an outbound `message` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Room the message is addressed to.
    pub room: RoomId,
    /// The message text.
    pub message: String,
}

/// Decode a frame, distinguishing unknown event names from malformed data.
fn decode_frame<T: DeserializeOwned>(text: &str, known: &[&str]) -> Result<T, ProtocolError> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| ProtocolError::Decode(e.to_string()))?;

    if let Some(name) = value.get("event").and_then(serde_json::Value::as_str) {
        if !known.contains(&name) {
            return Err(ProtocolError::UnknownEvent(name.to_owned()));
        }
    }

    serde_json::from_value(value).map_err(|e| ProtocolError::Decode(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::signal::{SessionDescription, SignalPayload};

    #[test]
    fn waiting_frame_has_no_payload() {
        let event = ServerEvent::decode(r#"{"event":"waiting"}"#).unwrap();
        assert_eq!(event, ServerEvent::Waiting);
    }

    #[test]
    fn paired_frame_carries_room_and_role() {
        let event =
            ServerEvent::decode(r#"{"event":"paired","data":{"room":"r1","isInitiator":true}}"#)
                .unwrap();
        let ServerEvent::Paired(info) = event else {
            unreachable!("decoded wrong variant");
        };
        assert_eq!(info.room, RoomId::from("r1"));
        assert!(info.is_initiator);
    }

    #[test]
    fn paired_role_defaults_to_responder() {
        let event =
            ServerEvent::decode(r#"{"event":"paired","data":{"room":"r2"}}"#).unwrap();
        assert_eq!(
            event,
            ServerEvent::Paired(PairedInfo { room: RoomId::from("r2"), is_initiator: false })
        );
    }

    #[test]
    fn message_accepts_both_wire_shapes() {
        let plain = ServerEvent::decode(r#"{"event":"message","data":"hey"}"#).unwrap();
        let tagged =
            ServerEvent::decode(r#"{"event":"message","data":{"text":"hey"}}"#).unwrap();
        for event in [plain, tagged] {
            let ServerEvent::Message(chat) = event else {
                unreachable!("decoded wrong variant");
            };
            assert_eq!(chat.text(), "hey");
        }
    }

    #[test]
    fn unknown_event_name_is_distinguished_from_malformed() {
        let err = ServerEvent::decode(r#"{"event":"join-queue","data":{}}"#).unwrap_err();
        assert_eq!(err, ProtocolError::UnknownEvent("join-queue".into()));

        let err = ServerEvent::decode("{not json").unwrap_err();
        assert!(matches!(err, ProtocolError::Decode(_)));
    }

    #[test]
    fn signal_envelope_roundtrips_through_client_frame() {
        let event = ClientEvent::Signal(SignalEnvelope::new(
            RoomId::from("r1"),
            SignalPayload::from(SessionDescription::offer("v=0")),
        ));
        let text = event.encode().unwrap();
        assert_eq!(ClientEvent::decode(&text).unwrap(), event);
    }

    #[test]
    fn outbound_message_frame_shape() {
        let event = ClientEvent::Message(OutboundMessage {
            room: RoomId::from("r9"),
            message: "hello".into(),
        });
        let text = event.encode().unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["event"], "message");
        assert_eq!(value["data"]["room"], "r9");
        assert_eq!(value["data"]["message"], "hello");
    }
}
