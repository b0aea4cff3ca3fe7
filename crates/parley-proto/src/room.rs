//! Room identifier.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque room identifier assigned by the rendezvous server on pairing.
///
/// Clients never construct room ids themselves in normal operation; the
/// value arrives in the `paired` event and is echoed back verbatim on every
/// outbound message and signal. Comparing a live session's `RoomId` against
/// the one in an inbound [`crate::SignalEnvelope`] is how stale signals from
/// a previous pairing are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Create a room id from its wire representation.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Wire representation of the id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for RoomId {
    fn from(id: String) -> Self {
        Self(id)
    }
}
