//! Peer negotiation state machine.
//!
//! Drives one media negotiation to completion for a single session. Methods
//! take events as input and return actions for the driver to execute, which
//! keeps the state machine pure (no I/O) and makes the ordering rules below
//! directly testable.
//!
//! # State machine
//!
//! ```text
//! Idle ──begin──> AwaitingLocalMedia ──start──┬─(initiator)─> OfferPending
//!                                             └─(responder)─> AnswerPending
//! OfferPending / AnswerPending ──local description sent──> Negotiating
//! Negotiating ──remote description applied + remote stream──> Connected
//! any non-terminal ──media/transport failure, timeout──> Failed
//! any non-terminal ──teardown──> Closed
//! Failed / Closed: terminal
//! ```
//!
//! # Ordering rules
//!
//! Signals race the local setup: the partner's offer can arrive before our
//! capture resolves and the peer object exists, and candidates can arrive
//! before the description they belong to. Two buffers make the exchange
//! insensitive to those races:
//!
//! - payloads received before [`Negotiation::peer_ready`] are queued and
//!   replayed in arrival order the instant the peer object exists;
//! - candidates received before a remote description has been applied are
//!   queued and replayed right after it, since a candidate is meaningless
//!   without its parent description.

use std::{
    collections::VecDeque,
    ops::Sub,
    time::{Duration, Instant},
};

use parley_proto::{CandidateInit, SessionDescription, SignalPayload};

use crate::{error::NegotiationError, media::MediaHandle, session::Role};

/// Default bound on how long a negotiation may run before failing.
pub const DEFAULT_NEGOTIATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Negotiation phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Created, nothing requested yet.
    Idle,
    /// Waiting for the local capture to resolve.
    AwaitingLocalMedia,
    /// Initiator: composing and sending the offer.
    OfferPending,
    /// Responder: waiting for the offer, then composing the answer.
    AnswerPending,
    /// Local description sent; exchanging candidates.
    Negotiating,
    /// Remote media is flowing.
    Connected,
    /// Torn down deliberately. Terminal.
    Closed,
    /// Stopped by an error. Terminal.
    Failed,
}

impl Phase {
    /// Whether no further transitions are possible.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Failed)
    }
}

/// Actions returned by the negotiation state machine.
///
/// The driver executes them in order against the peer transport and the
/// rendezvous channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NegotiationAction {
    /// Create the local peer object, attach the capture, and (initiator
    /// only) begin composing the offer.
    CreatePeer {
        /// This side's role.
        role: Role,
    },

    /// Emit a signal to the partner via the rendezvous channel.
    SendSignal(SignalPayload),

    /// Apply the partner's description to the local peer object.
    ApplyRemoteDescription(SessionDescription),

    /// Add one of the partner's candidates to the local peer object.
    ApplyRemoteCandidate(CandidateInit),

    /// Remote media is established; surface it to the view. Emitted exactly
    /// once per successful negotiation.
    MediaEstablished,
}

/// Negotiation tuning knobs.
#[derive(Debug, Clone)]
pub struct NegotiationConfig {
    /// Bound on total negotiation duration.
    pub timeout: Duration,
}

impl Default for NegotiationConfig {
    fn default() -> Self {
        Self { timeout: DEFAULT_NEGOTIATION_TIMEOUT }
    }
}

/// Per-session negotiation engine.
///
/// Owns the capture handle exclusively for the session's lifetime and
/// releases it exactly once, on every exit path (teardown, failure,
/// timeout). Generic over `I` to support virtual time in tests.
#[derive(Debug)]
pub struct Negotiation<I = Instant>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    role: Role,
    phase: Phase,
    config: NegotiationConfig,
    /// Exclusively owned capture; `None` once released.
    media: Option<MediaHandle>,
    started_at: Option<I>,
    /// The local peer object exists; buffered signals have been replayed.
    peer_ready: bool,
    /// A remote description has been applied; candidates may follow it.
    remote_applied: bool,
    remote_stream_seen: bool,
    connected_notified: bool,
    /// Signals that arrived before the peer object existed, arrival order.
    pending_signals: VecDeque<SignalPayload>,
    /// Candidates that arrived before their parent description.
    pending_candidates: VecDeque<CandidateInit>,
    failure: Option<NegotiationError>,
}

impl<I> Negotiation<I>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    /// Create an engine for the given role with default config.
    pub fn new(role: Role) -> Self {
        Self::with_config(role, NegotiationConfig::default())
    }

    /// Create an engine with explicit tuning.
    pub fn with_config(role: Role, config: NegotiationConfig) -> Self {
        Self {
            role,
            phase: Phase::Idle,
            config,
            media: None,
            started_at: None,
            peer_ready: false,
            remote_applied: false,
            remote_stream_seen: false,
            connected_notified: false,
            pending_signals: VecDeque::new(),
            pending_candidates: VecDeque::new(),
            failure: None,
        }
    }

    /// This side's role.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The error that moved the engine to [`Phase::Failed`], if any.
    #[must_use]
    pub fn failure(&self) -> Option<&NegotiationError> {
        self.failure.as_ref()
    }

    /// Number of signals buffered while waiting for the peer object.
    #[must_use]
    pub fn buffered_signals(&self) -> usize {
        self.pending_signals.len()
    }

    /// Whether the capture handle has been released.
    #[must_use]
    pub fn media_released(&self) -> bool {
        self.media.as_ref().is_none_or(MediaHandle::is_released)
    }

    /// Request local media. [`Phase::Idle`] → [`Phase::AwaitingLocalMedia`].
    pub fn begin(&mut self) -> Result<(), NegotiationError> {
        if self.phase != Phase::Idle {
            return Err(NegotiationError::InvalidPhase {
                phase: self.phase,
                operation: "begin",
            });
        }
        self.phase = Phase::AwaitingLocalMedia;
        Ok(())
    }

    /// Local capture resolved: take ownership of it and set up the peer.
    ///
    /// `now` anchors the negotiation timeout. The returned actions ask the
    /// driver to create the peer object; the driver answers with
    /// [`Self::peer_ready`] and, in due course, the local description and
    /// candidate callbacks.
    pub fn start(
        &mut self,
        media: MediaHandle,
        now: I,
    ) -> Result<Vec<NegotiationAction>, NegotiationError> {
        if self.phase != Phase::AwaitingLocalMedia {
            return Err(NegotiationError::InvalidPhase {
                phase: self.phase,
                operation: "start",
            });
        }
        self.media = Some(media);
        self.started_at = Some(now);
        self.phase = match self.role {
            Role::Initiator => Phase::OfferPending,
            Role::Responder => Phase::AnswerPending,
        };
        Ok(vec![NegotiationAction::CreatePeer { role: self.role }])
    }

    /// The local peer object now exists: replay everything that raced it.
    pub fn peer_ready(&mut self) -> Vec<NegotiationAction> {
        if self.phase.is_terminal() || self.peer_ready {
            return Vec::new();
        }
        self.peer_ready = true;

        let mut actions = Vec::new();
        while let Some(payload) = self.pending_signals.pop_front() {
            actions.extend(self.apply_remote(payload));
        }
        actions
    }

    /// Entry point for every signal the partner sends.
    ///
    /// Buffered until the peer object exists; otherwise applied
    /// immediately, subject to the candidate-after-description rule.
    pub fn remote_signal(&mut self, payload: SignalPayload) -> Vec<NegotiationAction> {
        if self.phase.is_terminal() {
            return Vec::new();
        }
        if !self.peer_ready {
            self.pending_signals.push_back(payload);
            return Vec::new();
        }
        self.apply_remote(payload)
    }

    /// The transport composed our local description: send it.
    ///
    /// For the initiator this is the offer, for the responder the answer
    /// composed after the remote offer was applied. Either way the local
    /// side has said its piece and moves to [`Phase::Negotiating`].
    pub fn local_description_ready(&mut self, desc: SessionDescription) -> Vec<NegotiationAction> {
        if self.phase.is_terminal() {
            return Vec::new();
        }
        if matches!(self.phase, Phase::OfferPending | Phase::AnswerPending) {
            self.phase = Phase::Negotiating;
        }
        vec![NegotiationAction::SendSignal(SignalPayload::from(desc))]
    }

    /// A locally discovered candidate: trickle it out immediately.
    pub fn local_candidate(&mut self, candidate: CandidateInit) -> Vec<NegotiationAction> {
        if self.phase.is_terminal() {
            return Vec::new();
        }
        vec![NegotiationAction::SendSignal(SignalPayload::from(candidate))]
    }

    /// Remote media was observed by the transport.
    pub fn remote_stream(&mut self) -> Vec<NegotiationAction> {
        if self.phase.is_terminal() {
            return Vec::new();
        }
        self.remote_stream_seen = true;
        let mut actions = Vec::new();
        self.maybe_connected(&mut actions);
        actions
    }

    /// Local capture acquisition failed.
    pub fn media_failed(&mut self, reason: impl Into<String>) {
        self.fail(NegotiationError::MediaUnavailable(reason.into()));
    }

    /// The peer transport reported a fatal error.
    pub fn transport_failed(&mut self, reason: impl Into<String>) {
        self.fail(NegotiationError::NegotiationFailed(reason.into()));
    }

    /// Advance time. Returns `true` if the negotiation failed on this tick
    /// (timeout exceeded while not yet connected).
    pub fn tick(&mut self, now: I) -> bool {
        if self.phase.is_terminal() || self.phase == Phase::Connected {
            return false;
        }
        let Some(started_at) = self.started_at else {
            return false;
        };
        let elapsed = now - started_at;
        if elapsed > self.config.timeout {
            self.fail(NegotiationError::NegotiationTimeout { elapsed });
            return true;
        }
        false
    }

    /// Tear the negotiation down. Idempotent; releases the capture exactly
    /// once. Safe from any phase, including mid-acquisition.
    pub fn teardown(&mut self) {
        if self.phase.is_terminal() {
            return;
        }
        self.release_media();
        self.phase = Phase::Closed;
    }

    fn fail(&mut self, error: NegotiationError) {
        if self.phase.is_terminal() {
            return;
        }
        self.release_media();
        self.phase = Phase::Failed;
        self.failure = Some(error);
    }

    fn release_media(&mut self) {
        if let Some(mut media) = self.media.take() {
            media.release();
        }
    }

    fn apply_remote(&mut self, payload: SignalPayload) -> Vec<NegotiationAction> {
        match payload {
            SignalPayload::Description(desc) => {
                self.remote_applied = true;
                let mut actions = vec![NegotiationAction::ApplyRemoteDescription(desc)];
                // Candidates that were waiting for their parent description.
                while let Some(candidate) = self.pending_candidates.pop_front() {
                    actions.push(NegotiationAction::ApplyRemoteCandidate(candidate));
                }
                self.maybe_connected(&mut actions);
                actions
            },
            SignalPayload::Candidate(signal) => {
                if self.remote_applied {
                    vec![NegotiationAction::ApplyRemoteCandidate(signal.candidate)]
                } else {
                    self.pending_candidates.push_back(signal.candidate);
                    Vec::new()
                }
            },
        }
    }

    fn maybe_connected(&mut self, actions: &mut Vec<NegotiationAction>) {
        if self.connected_notified || !self.remote_applied || !self.remote_stream_seen {
            return;
        }
        if matches!(self.phase, Phase::OfferPending | Phase::AnswerPending | Phase::Negotiating) {
            self.phase = Phase::Connected;
            self.connected_notified = true;
            actions.push(NegotiationAction::MediaEstablished);
        }
    }
}
