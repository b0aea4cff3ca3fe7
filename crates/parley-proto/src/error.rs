//! Protocol error types.

use thiserror::Error;

/// Errors produced while decoding or encoding channel frames.
///
/// Decoding never panics: a malformed frame is reported and the caller
/// decides whether to skip it or close the channel.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Frame was not a well-formed event of the expected shape.
    #[error("malformed frame: {0}")]
    Decode(String),

    /// Frame carried an event name outside the protocol.
    #[error("unknown event name: {0}")]
    UnknownEvent(String),
}
