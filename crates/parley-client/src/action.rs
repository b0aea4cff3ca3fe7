//! Coordinator side-effects and tuning.

use std::time::Duration;

use parley_core::{MediaConstraints, NegotiationConfig, Role};
use parley_proto::{CandidateInit, ClientEvent, SessionDescription};

/// Actions the coordinator produces for the driver to execute, in order.
///
/// Peer and media actions carry the pairing `generation` they were issued
/// for; the driver echoes it back on the corresponding callback so results
/// that outlive their session are recognized and dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorAction {
    /// Open the rendezvous channel and begin dispatching its events.
    Connect,

    /// Emit an event on the rendezvous channel. Fire-and-forget.
    Send(ClientEvent),

    /// Close the rendezvous channel.
    CloseChannel,

    /// Acquire local capture for the new pairing.
    AcquireMedia {
        /// Pairing this acquisition belongs to.
        generation: u64,
        /// What to capture.
        constraints: MediaConstraints,
    },

    /// Create the local peer object, attaching the capture already handed
    /// to the engine. The initiator side also starts composing its offer.
    CreatePeer {
        /// Pairing this peer belongs to.
        generation: u64,
        /// This side's negotiation role.
        role: Role,
    },

    /// Apply the partner's description to the peer object.
    ApplyRemoteDescription {
        /// Pairing this description belongs to.
        generation: u64,
        /// The description to apply.
        description: SessionDescription,
    },

    /// Add one of the partner's candidates to the peer object.
    ApplyRemoteCandidate {
        /// Pairing this candidate belongs to.
        generation: u64,
        /// The candidate to add.
        candidate: CandidateInit,
    },

    /// Remote media is flowing; surface the stream to the view. Emitted
    /// exactly once per successful negotiation.
    MediaEstablished {
        /// Pairing that connected.
        generation: u64,
    },
}

/// Coordinator tuning knobs.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Re-enter Searching automatically when the partner disconnects.
    pub auto_resume: bool,

    /// Bound on consecutive quick auto-resumes before giving up and going
    /// Idle. Guards against a tight re-pair loop when the rendezvous
    /// service itself is degraded.
    pub max_auto_resumes: u32,

    /// A pairing that survives at least this long resets the auto-resume
    /// counter; one that dies sooner consumes it.
    pub resume_cooldown: Duration,

    /// Negotiation engine tuning (timeout).
    pub negotiation: NegotiationConfig,

    /// Capture constraints for new pairings.
    pub constraints: MediaConstraints,

    /// Message log ring capacity.
    pub log_capacity: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            auto_resume: true,
            max_auto_resumes: 5,
            resume_cooldown: Duration::from_secs(2),
            negotiation: NegotiationConfig::default(),
            constraints: MediaConstraints::default(),
            log_capacity: 512,
        }
    }
}
