//! Negotiation error taxonomy.

use std::time::Duration;

use thiserror::Error;

use crate::negotiation::Phase;

/// Why a negotiation stopped making progress.
///
/// The engine reports these upward and never retries on its own; whether a
/// failed negotiation means re-search or give-up is session-layer policy.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NegotiationError {
    /// Local media capture could not be acquired.
    #[error("media capture unavailable: {0}")]
    MediaUnavailable(String),

    /// The peer transport rejected the exchange or found no viable path.
    #[error("negotiation failed: {0}")]
    NegotiationFailed(String),

    /// The handshake did not complete within the configured bound.
    #[error("negotiation timed out after {elapsed:?}")]
    NegotiationTimeout {
        /// How long the negotiation had been running.
        elapsed: Duration,
    },

    /// Operation is not valid in the current phase.
    #[error("invalid phase: cannot {operation} while {phase:?}")]
    InvalidPhase {
        /// Phase when the operation was attempted.
        phase: Phase,
        /// Operation that was attempted.
        operation: &'static str,
    },
}

impl NegotiationError {
    /// Whether a fresh pairing could plausibly succeed after this error.
    ///
    /// Timeouts and transport-level failures are often environmental (the
    /// partner vanished, no route existed between these two hosts); a
    /// missing capture device or a phase violation will not fix itself.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::NegotiationFailed(_) | Self::NegotiationTimeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transience_split() {
        assert!(NegotiationError::NegotiationFailed("no path".into()).is_transient());
        assert!(
            NegotiationError::NegotiationTimeout { elapsed: Duration::from_secs(31) }
                .is_transient()
        );
        assert!(!NegotiationError::MediaUnavailable("no camera".into()).is_transient());
        assert!(
            !NegotiationError::InvalidPhase { phase: Phase::Closed, operation: "start" }
                .is_transient()
        );
    }
}
