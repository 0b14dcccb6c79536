//! Core state containers for Driftroom chat sessions.
//!
//! Pure components with no I/O, no timers, and no clock reads: every function
//! is driven by its arguments, with the current time passed in as Unix
//! milliseconds where needed. The session engine in `driftroom-client` owns
//! the orchestration; this crate owns the state the session is made of.
//!
//! # Components
//!
//! - [`Timeline`]: ordered, append/replace-only record of room activity
//! - [`attachment`]: image validation and data-URI encoding
//! - [`reply`]: detached quote snapshots for threading
//! - [`Countdown`]: wall-clock room expiry countdown
//! - [`Presence`]: last-known occupant list

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod attachment;
mod countdown;
mod presence;
pub mod reply;
mod timeline;

pub use countdown::{Countdown, EXPIRED_LABEL, TickOutcome, format_remaining};
pub use presence::Presence;
pub use timeline::{ChatMessage, Entry, EntryBody, EntryId, SystemNotice, Timeline};
