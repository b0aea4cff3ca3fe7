//! Negotiation core for Parley pair sessions.
//!
//! Sans-IO building blocks for establishing a direct peer-to-peer media path
//! between two freshly paired clients. The negotiation engine is a pure
//! state machine: it receives events from the driver (signals from the
//! partner, callbacks from the local peer transport), mutates owned state,
//! and returns actions for the driver to execute in order. No sockets, no
//! clocks, no device access — those live behind the seams this crate
//! defines, which is what makes every ordering property here testable
//! without a network.
//!
//! # Components
//!
//! - [`Negotiation`]: per-session offer/answer/candidate state machine
//! - [`MediaSource`] / [`MediaHandle`]: capture capability seam
//! - [`Session`] / [`Role`]: pairing identity assigned at match time
//! - [`NegotiationError`]: failure taxonomy reported upward, never retried
//!   here

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod error;
mod media;
mod negotiation;
mod session;

pub use error::NegotiationError;
pub use media::{Capture, FileSource, MediaConstraints, MediaError, MediaHandle, MediaSource};
pub use negotiation::{
    DEFAULT_NEGOTIATION_TIMEOUT, Negotiation, NegotiationAction, NegotiationConfig, Phase,
};
pub use session::{Role, Session};
