//! Session events and actions.
//!
//! The session is a pure state machine: the driver feeds it [`SessionEvent`]s
//! and executes the [`SessionAction`]s it returns. Events carry everything the
//! session needs to know about the outside world, including the current time
//! on ticks, so the session itself never reads a clock or touches I/O.

use driftroom_core::EntryId;
use driftroom_proto::{ClientFrame, RoomInfo};

/// Events the driver feeds into the session.
///
/// The driver is responsible for:
/// - Opening and closing the live transport and forwarding its frames
/// - Completing room-info fetches and reporting the result
/// - Driving time forward via once-per-second ticks
/// - Forwarding host intents (send, reply, leave) and visibility changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Host wants the session connected to its room.
    Open,

    /// The live transport finished its handshake.
    TransportOpened,

    /// The live transport closed or errored.
    ///
    /// Closure and transport error are deliberately the same event: both mean
    /// the connection is gone and recovery waits for a visibility transition.
    TransportClosed,

    /// A raw text frame arrived on the live transport.
    ///
    /// Decoding happens inside the session, exactly once per frame; malformed
    /// frames are dropped and logged without touching any state.
    FrameReceived {
        /// The frame body as received.
        raw: String,
    },

    /// A room-info fetch completed.
    RoomInfoFetched {
        /// What the room-info collaborator reported.
        result: RoomInfoResult,
    },

    /// The host application moved to the foreground or background.
    VisibilityChanged {
        /// True when the application became visible.
        visible: bool,
    },

    /// Periodic tick carrying the current wall-clock time.
    Tick {
        /// Current time in Unix milliseconds since epoch (UTC).
        now_ms: u64,
    },

    /// Host wants to send a text message.
    SendText {
        /// Message text, trimmed by the session before sending.
        text: String,
    },

    /// Host wants to send an image attachment.
    ///
    /// The driver reads the file; the session validates and encodes it.
    SendImage {
        /// MIME type reported for the file.
        mime: String,
        /// Raw file contents.
        bytes: Vec<u8>,
    },

    /// Host wants to quote a timeline entry in the next message.
    StartReply {
        /// Timeline entry to quote.
        id: EntryId,
    },

    /// Host abandoned the pending reply.
    CancelReply,

    /// Host is leaving the room.
    Leave,
}

/// Outcome of a room-info fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomInfoResult {
    /// The room exists; authoritative occupant list and expiry.
    Available(RoomInfo),

    /// The room no longer exists (not-found or gone). Terminal for the
    /// session.
    Gone,

    /// The fetch failed transiently. The session keeps its last known state.
    Unavailable {
        /// Diagnostic for logging.
        reason: String,
    },
}

/// Actions the session produces for the driver to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Open the live transport for this session's (room, user) pair.
    Connect,

    /// Send an outbound frame over the live transport.
    SendFrame(ClientFrame),

    /// Pull the authoritative room info and feed the result back as
    /// [`SessionEvent::RoomInfoFetched`].
    FetchRoomInfo,

    /// Fire the best-effort leave request. Failure is logged, never blocks
    /// teardown.
    LeaveRoom,

    /// Close the live transport.
    CloseTransport,

    /// Tell the host the room has expired.
    ///
    /// Emitted exactly once per expiry instant. The host applies a grace
    /// delay (2 seconds in the reference behavior) before navigating away so
    /// the expired label is visibly shown.
    NotifyExpired,

    /// Tell the host to leave the room view. The session is over.
    NavigateHome,

    /// Tell the host that observable state changed.
    Render,
}
