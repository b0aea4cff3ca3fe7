//! Pairing identity.

use parley_proto::RoomId;

/// Negotiation role assigned by the rendezvous server at pairing time.
///
/// The initiator proposes the first connection description; the responder
/// answers it. Exactly one side of a pairing is the initiator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Proposes the offer.
    Initiator,
    /// Answers the offer.
    Responder,
}

impl Role {
    /// Map the server's `isInitiator` flag to a role.
    #[must_use]
    pub fn from_initiator(is_initiator: bool) -> Self {
        if is_initiator { Self::Initiator } else { Self::Responder }
    }

    /// Whether this side proposes the offer.
    #[must_use]
    pub fn is_initiator(self) -> bool {
        matches!(self, Self::Initiator)
    }
}

/// One matchmaking-to-teardown cycle.
///
/// A session exists only while paired: the coordinator constructs a fresh
/// value (with a fresh `generation`) on every `paired` event and drops it on
/// teardown. Sessions are never reused or mutated into a new pairing — the
/// generation is the token that lets late async results from a superseded
/// session be recognized and discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Server-assigned room identifier.
    pub id: RoomId,
    /// This side's negotiation role.
    pub role: Role,
    /// Monotonic pairing counter within one coordinator.
    pub generation: u64,
}

impl Session {
    /// Construct the session for a fresh pairing.
    pub fn new(id: RoomId, role: Role, generation: u64) -> Self {
        Self { id, role, generation }
    }
}
