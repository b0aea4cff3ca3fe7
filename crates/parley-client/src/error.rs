//! Coordinator error types.

use thiserror::Error;

use crate::coordinator::SessionState;

/// Errors surfaced by coordinator operations.
///
/// Deliberately small: most anomalies (stale signals, late callbacks,
/// duplicate teardown) are protocol realities the coordinator absorbs
/// silently rather than errors for the caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoordinatorError {
    /// `start_chat` was called while a chat is already running.
    #[error("chat already active in state {state:?}")]
    AlreadyActive {
        /// State at the time of the call.
        state: SessionState,
    },
}
