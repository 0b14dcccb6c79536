//! Wire protocol for Driftroom chat sessions.
//!
//! Defines the JSON envelopes exchanged over the live room transport and the
//! side-channel room-info payload, together with a codec that translates raw
//! text frames to and from typed values.
//!
//! Envelopes are tagged on a `type` field. The server pushes [`ServerEvent`]
//! frames (`history`, `message`, `user_joined`, `user_left`); the client sends
//! [`ClientFrame`] frames (`text`, `image`). All internal components consume
//! the decoded variants, never raw wire shapes — decoding happens exactly once
//! at the transport boundary.
//!
//! # Invariants
//!
//! - Decoding never panics; malformed input yields [`ProtocolError`].
//! - A missing `message_type` field decodes as [`ContentKind::Text`] so newer
//!   servers can omit it (forward-compatibility guard).
//! - Round-trip encoding of an outbound frame produces an equivalent value.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod envelope;
mod errors;
mod room;

pub use envelope::{ClientFrame, ContentKind, PresenceChange, ReplySnapshot, ServerEvent, WireMessage};
pub use errors::ProtocolError;
pub use room::RoomInfo;
