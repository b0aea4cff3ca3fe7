//! Wire model for the Parley rendezvous channel.
//!
//! The rendezvous server speaks a socket-event protocol: every frame is one
//! JSON object `{"event": <name>, "data": <payload>}` on a bidirectional
//! text channel. This crate defines the typed event sets for both directions
//! plus the signaling envelope that negotiation payloads travel in.
//!
//! # Components
//!
//! - [`ServerEvent`]: events the server pushes to a client
//! - [`ClientEvent`]: events a client emits to the server
//! - [`SignalEnvelope`] / [`SignalPayload`]: negotiation signaling units
//! - [`RoomId`]: opaque server-assigned room identifier
//!
//! Payloads are opaque to the session layer: the coordinator routes a
//! [`SignalEnvelope`] by its `room` field only; the typed
//! [`SignalPayload`] inside is interpreted by the negotiation engine.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod error;
mod event;
mod room;
mod signal;

pub use error::ProtocolError;
pub use event::{ChatText, ClientEvent, Notification, OutboundMessage, PairedInfo, ServerEvent};
pub use room::RoomId;
pub use signal::{
    CandidateInit, CandidateSignal, DescriptionKind, SessionDescription, SignalEnvelope,
    SignalPayload,
};
