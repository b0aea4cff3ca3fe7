//! Property tests for the session coordinator.
//!
//! These tests verify critical invariants under arbitrary inputs:
//! - Signals for a foreign room never perturb the live session
//! - Callbacks for a dead generation never produce actions
//! - The chat log never grows past its configured capacity

use std::time::Instant;

use parley_client::{Coordinator, CoordinatorAction, CoordinatorConfig, SessionState};
use parley_core::{Capture, MediaHandle};
use parley_proto::{
    PairedInfo, RoomId, ServerEvent, SessionDescription, SignalEnvelope, SignalPayload,
};
use proptest::prelude::*;

struct NullCapture;

impl Capture for NullCapture {
    fn stop(&mut self) {}
}

fn paired_coordinator(room: &str, now: Instant) -> (Coordinator, u64) {
    let mut coordinator = Coordinator::new(CoordinatorConfig::default());
    let _ = coordinator.start_chat().expect("idle");
    let actions = coordinator.handle_server_event(
        ServerEvent::Paired(PairedInfo { room: RoomId::from(room), is_initiator: true }),
        now,
    );
    let CoordinatorAction::AcquireMedia { generation, .. } = actions[0] else {
        panic!("pairing should request media");
    };
    let _ = coordinator.media_ready(generation, MediaHandle::new(Box::new(NullCapture)), now);
    let _ = coordinator.peer_ready(generation);
    (coordinator, generation)
}

proptest! {
    /// Foreign-room signals are dropped: no actions, no phase change, and
    /// every one of them is counted.
    #[test]
    fn foreign_room_signals_are_inert(
        rooms in prop::collection::vec("[a-z0-9]{1,12}", 1..20),
    ) {
        let now = Instant::now();
        let (mut coordinator, _) = paired_coordinator("live", now);
        let phase = coordinator.negotiation_phase();

        let mut foreign = 0_u64;
        for room in rooms {
            if room == "live" {
                continue;
            }
            foreign += 1;
            let actions = coordinator.handle_server_event(
                ServerEvent::Signal(SignalEnvelope::new(
                    RoomId::from(room),
                    SignalPayload::from(SessionDescription::answer("v=0")),
                )),
                now,
            );
            prop_assert!(actions.is_empty());
        }

        prop_assert_eq!(coordinator.stale_signals(), foreign);
        prop_assert_eq!(coordinator.negotiation_phase(), phase);
        prop_assert_eq!(coordinator.state(), SessionState::Paired);
    }

    /// No callback stamped with a dead generation produces actions.
    #[test]
    fn dead_generation_callbacks_are_inert(offsets in prop::collection::vec(1..100_u64, 1..10)) {
        let now = Instant::now();
        let (mut coordinator, live) = paired_coordinator("live", now);

        for offset in offsets {
            let dead = live.wrapping_add(offset);
            prop_assert!(coordinator.peer_ready(dead).is_empty());
            prop_assert!(coordinator.remote_stream(dead).is_empty());
            prop_assert!(coordinator
                .local_description_ready(dead, SessionDescription::offer("v=0"))
                .is_empty());
            prop_assert!(coordinator
                .media_ready(dead, MediaHandle::new(Box::new(NullCapture)), now)
                .is_empty());
        }

        prop_assert_eq!(coordinator.state(), SessionState::Paired);
        prop_assert_eq!(coordinator.session().expect("live").generation, live);
    }

    /// The log is a ring: it holds the newest entries and never exceeds
    /// its capacity.
    #[test]
    fn log_is_bounded_and_keeps_the_newest(
        capacity in 1..16_usize,
        texts in prop::collection::vec("[a-z]{1,8}", 1..64),
    ) {
        let now = Instant::now();
        let config = CoordinatorConfig { log_capacity: capacity, ..CoordinatorConfig::default() };
        let mut coordinator = Coordinator::new(config);
        let _ = coordinator.start_chat().expect("idle");
        let _ = coordinator.handle_server_event(
            ServerEvent::Paired(PairedInfo { room: RoomId::from("live"), is_initiator: true }),
            now,
        );

        for text in &texts {
            let _ = coordinator.send_message(text);
        }

        prop_assert!(coordinator.log().len() <= capacity);
        let expected: Vec<&String> = texts.iter().rev().take(coordinator.log().len()).rev().collect();
        let kept: Vec<&str> = coordinator.log().iter().map(|m| m.text()).collect();
        prop_assert_eq!(kept, expected.iter().map(|s| s.as_str()).collect::<Vec<_>>());
    }
}
