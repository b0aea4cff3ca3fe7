//! Negotiation signaling types.
//!
//! A [`SignalEnvelope`] is the unit exchanged over the shared channel while
//! two peers negotiate a direct media path: a session description (offer or
//! answer) or a single trickled network candidate, tagged with the room it
//! belongs to. The wire shapes match what browser peers emit, so the two
//! payload kinds are distinguished structurally rather than by an extra tag.

use serde::{Deserialize, Serialize};

use crate::room::RoomId;

/// Wire-level signaling unit: a payload plus the room it is scoped to.
///
/// The session layer routes envelopes by `room` alone and must discard any
/// envelope whose room does not match the live session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalEnvelope {
    /// Room this signal belongs to.
    pub room: RoomId,
    /// The negotiation payload.
    pub signal: SignalPayload,
}

impl SignalEnvelope {
    /// Wrap a payload for the given room.
    pub fn new(room: RoomId, signal: SignalPayload) -> Self {
        Self { room, signal }
    }
}

/// A negotiation payload: either a connection description or a candidate.
///
/// Untagged on the wire; the two shapes are disjoint (`{"type", "sdp"}`
/// versus `{"candidate": {...}}`), so structural matching is unambiguous.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SignalPayload {
    /// A local connection description (offer or answer).
    Description(SessionDescription),
    /// A trickled network reachability candidate.
    Candidate(CandidateSignal),
}

/// A connection description produced by one side of the negotiation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    /// Whether this description proposes or answers a connection.
    #[serde(rename = "type")]
    pub kind: DescriptionKind,
    /// Opaque description body (SDP).
    pub sdp: String,
}

impl SessionDescription {
    /// An offer description with the given body.
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self { kind: DescriptionKind::Offer, sdp: sdp.into() }
    }

    /// An answer description with the given body.
    pub fn answer(sdp: impl Into<String>) -> Self {
        Self { kind: DescriptionKind::Answer, sdp: sdp.into() }
    }
}

/// Role of a [`SessionDescription`] in the offer/answer exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DescriptionKind {
    /// First description, proposed by the initiator.
    Offer,
    /// Responding description from the other side.
    Answer,
}

/// Envelope for a single trickled candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSignal {
    /// The candidate itself.
    pub candidate: CandidateInit,
}

/// One network reachability candidate, in browser `RTCIceCandidateInit`
/// shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateInit {
    /// Candidate attribute line.
    pub candidate: String,
    /// Media description identifier the candidate is associated with.
    #[serde(rename = "sdpMid", skip_serializing_if = "Option::is_none", default)]
    pub sdp_mid: Option<String>,
    /// Index of the media description the candidate is associated with.
    #[serde(rename = "sdpMLineIndex", skip_serializing_if = "Option::is_none", default)]
    pub sdp_mline_index: Option<u16>,
}

impl From<CandidateInit> for SignalPayload {
    fn from(candidate: CandidateInit) -> Self {
        Self::Candidate(CandidateSignal { candidate })
    }
}

impl From<SessionDescription> for SignalPayload {
    fn from(description: SessionDescription) -> Self {
        Self::Description(description)
    }
}
