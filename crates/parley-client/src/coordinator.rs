//! Session state machine.
//!
//! Owns the lifecycle of one anonymous pairing at a time and demultiplexes
//! the shared rendezvous channel: chat and notifications go to the message
//! log, negotiation signals to the live engine, and everything else drives
//! the state machine below.
//!
//! ```text
//! Idle ──start_chat──> Searching ──paired──> Paired
//! Paired ──partner lost / peer failure / timeout──> Searching (bounded) | Idle
//! Paired | Searching ──end_chat──> Idle
//! ```
//!
//! Two staleness guards run through everything here. Inbound signals are
//! forwarded only when their room id matches the live session; anything
//! else is counted and dropped, never applied. Driver callbacks carry the
//! pairing generation they were issued for, so an async result that
//! resolves after its session died (a slow capture acquisition, a late peer
//! callback) is discarded — and a late capture is stopped, not leaked.

use std::{
    ops::Sub,
    time::{Duration, Instant},
};

use parley_core::{
    MediaHandle, Negotiation, NegotiationAction, Phase, Role, Session,
};
use parley_proto::{
    CandidateInit, ClientEvent, OutboundMessage, PairedInfo, ServerEvent, SessionDescription,
    SignalEnvelope,
};
use tracing::{debug, warn};

use crate::{
    action::{CoordinatorAction, CoordinatorConfig},
    error::CoordinatorError,
    log::{Message, MessageLog},
    retry::RetryBudget,
};

/// Coordinator lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No chat running; channel closed.
    Idle,
    /// Channel open, waiting to be paired.
    Searching,
    /// Paired into a room; a session and negotiation engine are live.
    Paired,
}

/// The session coordinator.
///
/// Pure state machine in the same action pattern as the negotiation core:
/// feed it server events, user intents, and driver callbacks; execute the
/// returned actions in order. Generic over `I` for virtual time in tests.
#[derive(Debug)]
pub struct Coordinator<I = Instant>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    config: CoordinatorConfig,
    state: SessionState,
    /// Live pairing. `Some` iff `state == Paired`.
    session: Option<Session>,
    /// Engine for the live pairing. `Some` iff `state == Paired`.
    negotiation: Option<Negotiation<I>>,
    log: MessageLog,
    /// Bumped on every pairing; the staleness token for driver callbacks.
    generation: u64,
    retry: RetryBudget<I>,
    /// Signals dropped for carrying a room id other than the live one.
    stale_signals: u64,
}

impl<I> Coordinator<I>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    /// Create an idle coordinator.
    pub fn new(config: CoordinatorConfig) -> Self {
        let log = MessageLog::new(config.log_capacity);
        let retry = RetryBudget::new(config.max_auto_resumes, config.resume_cooldown);
        Self {
            config,
            state: SessionState::Idle,
            session: None,
            negotiation: None,
            log,
            generation: 0,
            retry,
            stale_signals: 0,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The live session, while paired.
    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Negotiation phase of the live pairing.
    #[must_use]
    pub fn negotiation_phase(&self) -> Option<Phase> {
        self.negotiation.as_ref().map(Negotiation::phase)
    }

    /// The chat log, for the view to render.
    #[must_use]
    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    /// Signals dropped so far for a stale room id. Diagnostic only.
    #[must_use]
    pub fn stale_signals(&self) -> u64 {
        self.stale_signals
    }

    /// Begin searching for a partner. `Idle` → `Searching`.
    pub fn start_chat(&mut self) -> Result<Vec<CoordinatorAction>, CoordinatorError> {
        if self.state != SessionState::Idle {
            return Err(CoordinatorError::AlreadyActive { state: self.state });
        }
        self.state = SessionState::Searching;
        Ok(vec![CoordinatorAction::Connect])
    }

    /// Process one event from the rendezvous channel.
    pub fn handle_server_event(&mut self, event: ServerEvent, now: I) -> Vec<CoordinatorAction> {
        match event {
            ServerEvent::Waiting => {
                if self.state == SessionState::Searching {
                    debug!("waiting for a partner");
                }
                Vec::new()
            },
            ServerEvent::Paired(info) => self.handle_paired(info),
            ServerEvent::Message(chat) => {
                if self.state == SessionState::Paired {
                    self.log.push(Message::partner(chat.text()));
                }
                Vec::new()
            },
            ServerEvent::Notification(note) => {
                if self.state != SessionState::Idle {
                    self.log.push(Message::system(note.message));
                }
                Vec::new()
            },
            ServerEvent::PartnerDisconnected => {
                if self.state != SessionState::Paired {
                    return Vec::new();
                }
                self.abandon_pairing(now, "Partner has disconnected.")
            },
            ServerEvent::Signal(envelope) => self.handle_signal(envelope),
        }
    }

    /// Send a chat message to the partner.
    ///
    /// No-op unless paired and the trimmed text is non-empty; otherwise
    /// appends one own-origin entry and emits exactly one `message` event.
    pub fn send_message(&mut self, text: &str) -> Vec<CoordinatorAction> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        let Some(session) = &self.session else {
            return Vec::new();
        };
        let room = session.id.clone();
        self.log.push(Message::own(text));
        vec![CoordinatorAction::Send(ClientEvent::Message(OutboundMessage {
            room,
            message: text.to_owned(),
        }))]
    }

    /// End the chat. Idempotent; any state → `Idle`.
    pub fn end_chat(&mut self) -> Vec<CoordinatorAction> {
        if self.state == SessionState::Idle {
            return Vec::new();
        }
        self.drop_engine();
        self.session = None;
        self.state = SessionState::Idle;
        self.log.clear();
        self.retry.reset();
        vec![CoordinatorAction::CloseChannel]
    }

    /// Capture acquisition resolved for pairing `generation`.
    ///
    /// A handle for a superseded pairing is stopped on the spot — the
    /// device must not stay blocked for the next session.
    pub fn media_ready(
        &mut self,
        generation: u64,
        media: MediaHandle,
        now: I,
    ) -> Vec<CoordinatorAction> {
        if !self.is_live(generation) {
            debug!(generation, "dropping capture acquired for a superseded pairing");
            drop(media);
            return Vec::new();
        }
        let Some(engine) = self.negotiation.as_mut() else {
            return Vec::new();
        };
        match engine.start(media, now) {
            Ok(actions) => self.map_engine_actions(actions),
            Err(error) => {
                warn!(%error, "capture resolved in an unexpected phase");
                Vec::new()
            },
        }
    }

    /// Capture acquisition failed for pairing `generation`.
    ///
    /// Surfaced as the end of the chat: media failure is not retried and
    /// does not consume the auto-resume budget.
    pub fn media_failed(&mut self, generation: u64, reason: &str) -> Vec<CoordinatorAction> {
        if !self.is_live(generation) {
            return Vec::new();
        }
        if let Some(engine) = self.negotiation.as_mut() {
            engine.media_failed(reason);
        }
        warn!(reason, "media capture unavailable; ending chat");
        self.drop_engine();
        self.session = None;
        self.state = SessionState::Idle;
        self.log.clear();
        vec![CoordinatorAction::CloseChannel]
    }

    /// The local peer object for pairing `generation` now exists.
    pub fn peer_ready(&mut self, generation: u64) -> Vec<CoordinatorAction> {
        self.with_live_engine(generation, Negotiation::peer_ready)
    }

    /// The peer transport composed a local description.
    pub fn local_description_ready(
        &mut self,
        generation: u64,
        description: SessionDescription,
    ) -> Vec<CoordinatorAction> {
        self.with_live_engine(generation, |engine| engine.local_description_ready(description))
    }

    /// The peer transport discovered a local candidate.
    pub fn local_candidate(
        &mut self,
        generation: u64,
        candidate: CandidateInit,
    ) -> Vec<CoordinatorAction> {
        self.with_live_engine(generation, |engine| engine.local_candidate(candidate))
    }

    /// The peer transport observed the partner's media stream.
    pub fn remote_stream(&mut self, generation: u64) -> Vec<CoordinatorAction> {
        self.with_live_engine(generation, Negotiation::remote_stream)
    }

    /// The peer transport failed for pairing `generation`.
    ///
    /// Treated like a partner disconnect: log, teardown, bounded re-search.
    pub fn peer_failed(&mut self, generation: u64, reason: &str, now: I) -> Vec<CoordinatorAction> {
        if !self.is_live(generation) {
            return Vec::new();
        }
        if let Some(engine) = self.negotiation.as_mut() {
            engine.transport_failed(reason);
        }
        self.abandon_pairing(now, "Connection failed.")
    }

    /// Advance time: drives the negotiation timeout.
    pub fn tick(&mut self, now: I) -> Vec<CoordinatorAction> {
        let timed_out = self.negotiation.as_mut().is_some_and(|engine| engine.tick(now));
        if timed_out {
            self.abandon_pairing(now, "Connection timed out.")
        } else {
            Vec::new()
        }
    }

    fn handle_paired(&mut self, info: PairedInfo) -> Vec<CoordinatorAction> {
        if self.state == SessionState::Idle {
            // The channel should be closed when idle; a racing `paired`
            // must not resurrect a chat the user already ended.
            debug!(room = %info.room, "ignoring pairing while idle");
            return Vec::new();
        }
        // A re-pair while paired replaces the old session outright.
        self.drop_engine();

        self.generation += 1;
        let role = Role::from_initiator(info.is_initiator);
        debug!(room = %info.room, ?role, generation = self.generation, "paired");

        self.session = Some(Session::new(info.room, role, self.generation));
        self.state = SessionState::Paired;

        let mut engine = Negotiation::with_config(role, self.config.negotiation.clone());
        // A fresh engine is always Idle, so this cannot refuse.
        let _ = engine.begin();
        self.negotiation = Some(engine);

        vec![CoordinatorAction::AcquireMedia {
            generation: self.generation,
            constraints: self.config.constraints,
        }]
    }

    fn handle_signal(&mut self, envelope: SignalEnvelope) -> Vec<CoordinatorAction> {
        let live = self.session.as_ref().is_some_and(|session| session.id == envelope.room);
        if !live {
            self.stale_signals += 1;
            warn!(room = %envelope.room, total = self.stale_signals, "discarding stale signal");
            return Vec::new();
        }
        let Some(engine) = self.negotiation.as_mut() else {
            return Vec::new();
        };
        let actions = engine.remote_signal(envelope.signal);
        self.map_engine_actions(actions)
    }

    /// Tear down the live pairing and either resume searching (within the
    /// retry budget) or end the chat.
    fn abandon_pairing(&mut self, now: I, cause: &str) -> Vec<CoordinatorAction> {
        self.drop_engine();
        self.session = None;

        if self.config.auto_resume && self.retry.note_attempt(now) {
            self.log
                .push(Message::system_emphasized(format!("{cause} Searching for a new partner...")));
            self.state = SessionState::Searching;
            Vec::new()
        } else {
            if self.config.auto_resume {
                warn!(attempts = self.retry.consecutive(), "auto-resume budget exhausted");
            }
            self.state = SessionState::Idle;
            self.log.clear();
            vec![CoordinatorAction::CloseChannel]
        }
    }

    /// Run `f` against the live engine if `generation` still names the
    /// live pairing; late callbacks fall through to nothing.
    fn with_live_engine<F>(&mut self, generation: u64, f: F) -> Vec<CoordinatorAction>
    where
        F: FnOnce(&mut Negotiation<I>) -> Vec<NegotiationAction>,
    {
        if !self.is_live(generation) {
            debug!(generation, "ignoring callback for a superseded pairing");
            return Vec::new();
        }
        let Some(engine) = self.negotiation.as_mut() else {
            return Vec::new();
        };
        let actions = f(engine);
        self.map_engine_actions(actions)
    }

    fn is_live(&self, generation: u64) -> bool {
        self.session.as_ref().is_some_and(|session| session.generation == generation)
    }

    fn drop_engine(&mut self) {
        if let Some(mut engine) = self.negotiation.take() {
            engine.teardown();
        }
    }

    fn map_engine_actions(&self, actions: Vec<NegotiationAction>) -> Vec<CoordinatorAction> {
        let Some(session) = &self.session else {
            return Vec::new();
        };
        actions
            .into_iter()
            .map(|action| match action {
                NegotiationAction::CreatePeer { role } => CoordinatorAction::CreatePeer {
                    generation: session.generation,
                    role,
                },
                NegotiationAction::SendSignal(signal) => CoordinatorAction::Send(
                    ClientEvent::Signal(SignalEnvelope::new(session.id.clone(), signal)),
                ),
                NegotiationAction::ApplyRemoteDescription(description) => {
                    CoordinatorAction::ApplyRemoteDescription {
                        generation: session.generation,
                        description,
                    }
                },
                NegotiationAction::ApplyRemoteCandidate(candidate) => {
                    CoordinatorAction::ApplyRemoteCandidate {
                        generation: session.generation,
                        candidate,
                    }
                },
                NegotiationAction::MediaEstablished => CoordinatorAction::MediaEstablished {
                    generation: session.generation,
                },
            })
            .collect()
    }
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new(CoordinatorConfig::default())
    }
}
