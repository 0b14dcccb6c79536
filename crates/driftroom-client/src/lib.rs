//! Session engine for Driftroom chat rooms.
//!
//! One [`Session`] owns one user's live presence in one room: the connection
//! lifecycle, the ordered message timeline, the occupant list, the expiry
//! countdown, and the pending quote-reply.
//!
//! # Architecture
//!
//! The session follows the Sans-IO, action-based pattern: it receives events
//! ([`SessionEvent`]), processes them through pure state machine logic, and
//! returns actions ([`SessionAction`]) for the caller to execute. Every
//! ordering and failure-recovery property is therefore testable without a
//! network or a clock.
//!
//! # Components
//!
//! - [`Session`]: the state machine, with convenience methods mirroring the
//!   host-facing API (`open`, `send_text`, `send_image`, `start_reply`,
//!   `cancel_reply`, `leave`)
//! - [`SessionEvent`] / [`SessionAction`]: the event and action vocabulary
//! - [`ConnectionState`]: transport connectivity as the session reports it
//!
//! # Transport (optional)
//!
//! With the `transport` feature enabled, this crate also provides:
//! - [`transport::connect`] / [`transport::ConnectedRoom`]: WebSocket I/O
//! - [`RoomApi`]: the HTTP room-info and leave collaborators
//! - [`Runtime`]: a tokio event loop driving a session against both, with
//!   host callbacks behind the [`Host`] trait

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod error;
mod event;
mod session;

#[cfg(feature = "transport")]
mod rooms;
#[cfg(feature = "transport")]
mod runtime;
#[cfg(feature = "transport")]
pub mod transport;

pub use driftroom_core::EntryId;
pub use driftroom_proto::{ReplySnapshot, RoomInfo};
pub use error::SessionError;
pub use event::{RoomInfoResult, SessionAction, SessionEvent};
#[cfg(feature = "transport")]
pub use rooms::RoomApi;
#[cfg(feature = "transport")]
pub use runtime::{Command, Host, Runtime, RuntimeError};
pub use session::{ConnectionState, Session};
