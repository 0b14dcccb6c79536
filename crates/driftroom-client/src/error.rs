//! Error types for the session engine.
//!
//! The session deliberately has a narrow error surface: transport drops are
//! recovered by the visibility reconnect policy, malformed frames are dropped
//! and logged, and a gone room is signalled through actions rather than
//! errors. The only failure a caller must handle directly is attachment
//! validation, which is reported synchronously so a rejected send is never
//! silently dropped.

use driftroom_core::attachment::AttachmentError;
use thiserror::Error;

/// Errors surfaced synchronously by the session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// An image attachment failed validation.
    #[error("attachment rejected: {source}")]
    Attachment {
        /// The validation failure.
        #[from]
        source: AttachmentError,
    },
}
