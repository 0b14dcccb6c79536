//! Error types for the Driftroom wire protocol.
//!
//! Codec failures are non-fatal by contract: callers drop the offending frame
//! and log it. The error variants carry the serde diagnostic as a string so
//! they stay `Clone + PartialEq` for state machine tests.

use thiserror::Error;

/// Errors produced by the envelope codec.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Inbound frame was not valid JSON or did not match any known envelope.
    #[error("malformed frame: {reason}")]
    MalformedFrame {
        /// Decoder diagnostic.
        reason: String,
    },

    /// Outbound frame could not be serialized.
    #[error("frame encoding failed: {reason}")]
    Encode {
        /// Encoder diagnostic.
        reason: String,
    },
}
