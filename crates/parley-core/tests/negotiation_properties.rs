//! Property-based tests for the negotiation engine.
//!
//! The race buffers must be order-preserving and lossless: however inbound
//! signals interleave with local setup, the transport ends up applying the
//! same things in the same order, and the capture is released exactly once
//! no matter where teardown lands.

#![allow(clippy::unwrap_used)]

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Instant,
};

use parley_core::{Capture, MediaHandle, Negotiation, NegotiationAction, Phase, Role};
use parley_proto::{CandidateInit, SessionDescription, SignalPayload};
use proptest::prelude::*;

struct CountingCapture(Arc<AtomicUsize>);

impl Capture for CountingCapture {
    fn stop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

fn media() -> (MediaHandle, Arc<AtomicUsize>) {
    let stops = Arc::new(AtomicUsize::new(0));
    (MediaHandle::new(Box::new(CountingCapture(Arc::clone(&stops)))), stops)
}

fn candidate(n: usize) -> SignalPayload {
    SignalPayload::from(CandidateInit {
        candidate: format!("candidate:{n} 1 udp 1 192.0.2.1 {n} typ host"),
        sdp_mid: Some("0".into()),
        sdp_mline_index: Some(0),
    })
}

/// An inbound signal sequence: candidates with an offer inserted somewhere.
fn arrival_sequence() -> impl Strategy<Value = Vec<SignalPayload>> {
    (0_usize..6, 0_usize..=6).prop_map(|(candidates, offer_at)| {
        let mut sequence: Vec<SignalPayload> = (0..candidates).map(candidate).collect();
        let at = offer_at.min(sequence.len());
        sequence.insert(at, SignalPayload::from(SessionDescription::offer("v=0")));
        sequence
    })
}

/// Only the actions that touch the peer transport.
fn applied(actions: &[NegotiationAction]) -> Vec<NegotiationAction> {
    actions
        .iter()
        .filter(|a| {
            matches!(
                a,
                NegotiationAction::ApplyRemoteDescription(_)
                    | NegotiationAction::ApplyRemoteCandidate(_)
            )
        })
        .cloned()
        .collect()
}

fn run_responder(
    sequence: &[SignalPayload],
    peer_ready_after: usize,
) -> (Phase, Vec<NegotiationAction>) {
    let mut engine: Negotiation<Instant> = Negotiation::new(Role::Responder);
    engine.begin().unwrap();
    let (handle, _) = media();
    let _ = engine.start(handle, Instant::now()).unwrap();

    let mut actions = Vec::new();
    for (i, payload) in sequence.iter().enumerate() {
        if i == peer_ready_after {
            actions.extend(engine.peer_ready());
        }
        actions.extend(engine.remote_signal(payload.clone()));
    }
    if peer_ready_after >= sequence.len() {
        actions.extend(engine.peer_ready());
    }
    (engine.phase(), actions)
}

proptest! {
    /// Buffering before `peer_ready` never changes what the transport sees:
    /// same applied order, same phase, as if the peer object had existed
    /// from the start.
    #[test]
    fn replay_is_order_preserving_and_lossless(
        sequence in arrival_sequence(),
        split in 0_usize..=7,
    ) {
        let (baseline_phase, baseline_actions) = run_responder(&sequence, 0);
        let (phase, actions) = run_responder(&sequence, split.min(sequence.len()));

        prop_assert_eq!(phase, baseline_phase);
        prop_assert_eq!(applied(&actions), applied(&baseline_actions));
    }

    /// Candidates are applied in arrival order, never before a description.
    #[test]
    fn description_always_precedes_candidates(
        sequence in arrival_sequence(),
        split in 0_usize..=7,
    ) {
        let (_, actions) = run_responder(&sequence, split.min(sequence.len()));
        let applied = applied(&actions);

        let mut seen_description = false;
        for action in &applied {
            match action {
                NegotiationAction::ApplyRemoteDescription(_) => seen_description = true,
                NegotiationAction::ApplyRemoteCandidate(_) => prop_assert!(seen_description),
                _ => {},
            }
        }
    }

    /// Wherever teardown lands in the event stream, the capture stops
    /// exactly once.
    #[test]
    fn teardown_releases_capture_exactly_once(
        sequence in arrival_sequence(),
        teardown_after in 0_usize..=7,
    ) {
        let mut engine: Negotiation<Instant> = Negotiation::new(Role::Responder);
        engine.begin().unwrap();
        let (handle, stops) = media();
        let _ = engine.start(handle, Instant::now()).unwrap();
        let _ = engine.peer_ready();

        for (i, payload) in sequence.iter().enumerate() {
            if i == teardown_after {
                engine.teardown();
            }
            let _ = engine.remote_signal(payload.clone());
        }
        engine.teardown();
        engine.teardown();

        prop_assert_eq!(stops.load(Ordering::SeqCst), 1);
        prop_assert!(engine.phase().is_terminal());
    }
}
