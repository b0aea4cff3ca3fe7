//! Session coordinator for Parley pair chat.
//!
//! Sits between the rendezvous channel and the view layer: owns the session
//! lifecycle (Idle → Searching → Paired), demultiplexes chat, notification,
//! and negotiation traffic arriving on the one shared channel, drives the
//! [`parley_core::Negotiation`] engine for the live pairing, and recovers
//! when the partner vanishes mid-session.
//!
//! # Architecture
//!
//! The coordinator follows the same action pattern as the core: events in,
//! owned-state transition, [`CoordinatorAction`]s out for the driver to
//! execute. All staleness handling lives here — signals are matched against
//! the live room id, and every driver callback carries the pairing
//! generation it was issued for so results of a superseded session are
//! discarded instead of applied.
//!
//! # Components
//!
//! - [`Coordinator`]: the session state machine
//! - [`MessageLog`]: bounded append-only chat record for the view
//! - [`CoordinatorAction`] / [`CoordinatorConfig`]: driver contract and
//!   tuning
//!
//! # Transport (optional)
//!
//! With the `transport` feature enabled, this crate also provides:
//! - [`transport::ConnectedChannel`]: rendezvous channel over a websocket
//! - [`transport::connect`]: open the channel and spawn its I/O task

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod coordinator;
mod error;
mod log;
mod retry;

#[cfg(feature = "transport")]
pub mod transport;

pub use action::{CoordinatorAction, CoordinatorConfig};
pub use coordinator::{Coordinator, SessionState};
pub use error::CoordinatorError;
pub use log::{Message, MessageLog, Origin};
pub use parley_core::{MediaConstraints, MediaHandle, Phase, Role, Session};
