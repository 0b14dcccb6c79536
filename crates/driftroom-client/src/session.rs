//! Session state machine.
//!
//! The `Session` owns one user's presence in one room: the connection
//! lifecycle, the message timeline, the occupant list, the expiry countdown,
//! and the pending reply. It is a pure state machine in the Sans-IO style:
//! it consumes [`SessionEvent`]s, mutates its state, and returns
//! [`SessionAction`]s for a driver to execute. No I/O, no timers, no clock
//! reads happen here.
//!
//! # Connection contract
//!
//! At most one live transport exists per session. `Open` is a no-op while the
//! transport is connecting or connected. Reconnection is driven purely by
//! visibility: a foreground transition re-opens the transport only when it is
//! not already open. Transport closure and transport error are the same
//! event and are never fatal on their own; the session only enters
//! [`ConnectionState::Failed`] when the room-info collaborator confirms the
//! room is gone.

use driftroom_core::{
    ChatMessage, Countdown, EntryBody, EntryId, Presence, SystemNotice, TickOutcome, Timeline,
    attachment, reply,
};
use driftroom_proto::{ClientFrame, PresenceChange, ReplySnapshot, ServerEvent};

use crate::{
    error::SessionError,
    event::{RoomInfoResult, SessionAction, SessionEvent},
};

/// Connectivity of the session's live transport.
///
/// Owned exclusively by the session; state transitions are the only way other
/// components learn connectivity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionState {
    /// No live transport.
    #[default]
    Disconnected,
    /// Transport handshake in progress.
    Connecting,
    /// Transport open and healthy.
    Connected,
    /// The room is confirmed gone. Terminal; no reconnects.
    Failed,
}

/// One user's live presence in one room.
#[derive(Debug, Clone)]
pub struct Session {
    /// Room identifier, case-sensitive, server-canonical.
    room: String,
    /// Display name supplied by the host.
    user: String,
    /// Transport connectivity.
    state: ConnectionState,
    /// Ordered record of room activity.
    timeline: Timeline,
    /// Last known occupant list.
    presence: Presence,
    /// Wall-clock countdown to room expiry.
    countdown: Countdown,
    /// Quote attached to the next outbound message, if any.
    pending_reply: Option<ReplySnapshot>,
    /// Set once the host leaves; a departed session ignores reconnects.
    departed: bool,
}

impl Session {
    /// Create a session for the given room and display name.
    ///
    /// The session starts disconnected; feed [`SessionEvent::Open`] (or call
    /// [`Session::open`]) to begin connecting.
    pub fn new(room: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            room: room.into(),
            user: user.into(),
            state: ConnectionState::Disconnected,
            timeline: Timeline::new(),
            presence: Presence::new(),
            countdown: Countdown::new(),
            pending_reply: None,
            departed: false,
        }
    }

    /// Process an event and return resulting actions.
    pub fn handle(&mut self, event: SessionEvent) -> Result<Vec<SessionAction>, SessionError> {
        match event {
            SessionEvent::Open => Ok(self.handle_open()),
            SessionEvent::TransportOpened => Ok(self.handle_transport_opened()),
            SessionEvent::TransportClosed => Ok(self.handle_transport_closed()),
            SessionEvent::FrameReceived { raw } => Ok(self.handle_frame(&raw)),
            SessionEvent::RoomInfoFetched { result } => Ok(self.handle_room_info(result)),
            SessionEvent::VisibilityChanged { visible } => Ok(self.handle_visibility(visible)),
            SessionEvent::Tick { now_ms } => Ok(self.handle_tick(now_ms)),
            SessionEvent::SendText { text } => Ok(self.handle_send_text(&text)),
            SessionEvent::SendImage { mime, bytes } => self.handle_send_image(&mime, &bytes),
            SessionEvent::StartReply { id } => Ok(self.handle_start_reply(id)),
            SessionEvent::CancelReply => Ok(self.handle_cancel_reply()),
            SessionEvent::Leave => Ok(self.handle_leave()),
        }
    }

    /// Begin connecting. No-op while a transport is already connecting or
    /// connected, after the room is confirmed gone, or after leaving.
    pub fn open(&mut self) -> Vec<SessionAction> {
        self.handle_open()
    }

    /// Send a text message, quoting the pending reply if one is set.
    ///
    /// The text is trimmed first; whitespace-only input is a no-op. Sends
    /// while not connected are dropped with a log, matching a composer that
    /// is disabled while offline.
    pub fn send_text(&mut self, text: &str) -> Vec<SessionAction> {
        self.handle_send_text(text)
    }

    /// Validate, encode, and send an image attachment.
    ///
    /// Validation runs before anything else and its failure is returned
    /// synchronously, leaving the pending reply and all other state
    /// untouched.
    pub fn send_image(
        &mut self,
        mime: &str,
        bytes: &[u8],
    ) -> Result<Vec<SessionAction>, SessionError> {
        self.handle_send_image(mime, bytes)
    }

    /// Quote a timeline entry in the next message.
    ///
    /// Captures a detached snapshot immediately; the quote stays intact even
    /// if the timeline is replaced before the message is sent. Starting a new
    /// reply silently replaces any previous pending one. System notices are
    /// not quotable.
    pub fn start_reply(&mut self, id: EntryId) -> Vec<SessionAction> {
        self.handle_start_reply(id)
    }

    /// Abandon the pending reply.
    pub fn cancel_reply(&mut self) -> Vec<SessionAction> {
        self.handle_cancel_reply()
    }

    /// Leave the room. Emits teardown actions in order: best-effort leave
    /// request, transport close, host navigation.
    pub fn leave(&mut self) -> Vec<SessionAction> {
        self.handle_leave()
    }

    /// Room identifier.
    pub fn room(&self) -> &str {
        &self.room
    }

    /// Display name of this session's user.
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Current transport connectivity.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// The message timeline.
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Last known occupant list, in server order.
    pub fn occupants(&self) -> &[String] {
        self.presence.users()
    }

    /// Rendered countdown label. `None` before the first tick or when the
    /// room has no expiry.
    pub fn countdown_label(&self) -> Option<&str> {
        self.countdown.label()
    }

    /// True once the room's expiry instant has been reached.
    pub fn is_expired(&self) -> bool {
        self.countdown.is_expired()
    }

    /// The quote attached to the next outbound message, if any.
    pub fn pending_reply(&self) -> Option<&ReplySnapshot> {
        self.pending_reply.as_ref()
    }

    /// True once the host has left the room.
    pub fn is_departed(&self) -> bool {
        self.departed
    }

    fn handle_open(&mut self) -> Vec<SessionAction> {
        if self.departed || self.state != ConnectionState::Disconnected {
            return vec![];
        }

        self.state = ConnectionState::Connecting;
        // The occupant list may have changed while disconnected, so every
        // open re-pulls room info alongside the transport.
        vec![SessionAction::Connect, SessionAction::FetchRoomInfo, SessionAction::Render]
    }

    fn handle_visibility(&mut self, visible: bool) -> Vec<SessionAction> {
        if !visible {
            return vec![];
        }
        // Reconnect only when the transport is not open; handle_open already
        // enforces that, which bounds attempts to foreground transitions.
        self.handle_open()
    }

    fn handle_transport_opened(&mut self) -> Vec<SessionAction> {
        if self.departed || self.state == ConnectionState::Failed {
            return vec![];
        }
        self.state = ConnectionState::Connected;
        vec![SessionAction::Render]
    }

    fn handle_transport_closed(&mut self) -> Vec<SessionAction> {
        match self.state {
            ConnectionState::Connecting | ConnectionState::Connected => {
                self.state = ConnectionState::Disconnected;
                vec![SessionAction::Render]
            },
            ConnectionState::Disconnected | ConnectionState::Failed => vec![],
        }
    }

    fn handle_frame(&mut self, raw: &str) -> Vec<SessionAction> {
        let event = match ServerEvent::decode(raw) {
            Ok(event) => event,
            Err(err) => {
                tracing::warn!("dropping malformed frame: {err}");
                return vec![];
            },
        };

        match event {
            ServerEvent::History { messages } => {
                self.timeline.replace(messages.into_iter().map(ChatMessage::from).collect());
                vec![SessionAction::Render]
            },
            ServerEvent::Message(message) => {
                self.timeline.append_chat(message.into());
                vec![SessionAction::Render]
            },
            ServerEvent::UserJoined(change) => self.append_presence_notice(&change, "joined"),
            ServerEvent::UserLeft(change) => self.append_presence_notice(&change, "left"),
        }
    }

    /// Presence wire events carry only a username, never the full list, so
    /// each one appends a notice and requests an authoritative refresh.
    fn append_presence_notice(
        &mut self,
        change: &PresenceChange,
        verb: &str,
    ) -> Vec<SessionAction> {
        self.timeline.append_system(SystemNotice {
            content: format!("{} {verb} the room", change.username),
            timestamp_ms: change.timestamp,
        });
        vec![SessionAction::FetchRoomInfo, SessionAction::Render]
    }

    fn handle_room_info(&mut self, result: RoomInfoResult) -> Vec<SessionAction> {
        match result {
            RoomInfoResult::Available(info) => {
                self.presence.apply(info.users);
                self.countdown.set_expiry(info.expire_at);
                vec![SessionAction::Render]
            },
            RoomInfoResult::Gone => {
                if self.departed {
                    return vec![];
                }
                self.state = ConnectionState::Failed;
                vec![SessionAction::CloseTransport, SessionAction::NavigateHome]
            },
            RoomInfoResult::Unavailable { reason } => {
                // Stale-but-consistent: keep the last known occupant list and
                // expiry rather than guessing.
                tracing::debug!("room info refresh failed: {reason}");
                vec![]
            },
        }
    }

    fn handle_tick(&mut self, now_ms: u64) -> Vec<SessionAction> {
        match self.countdown.tick(now_ms) {
            TickOutcome::Expired => vec![SessionAction::NotifyExpired, SessionAction::Render],
            TickOutcome::Updated => vec![SessionAction::Render],
            TickOutcome::Idle => vec![],
        }
    }

    fn handle_send_text(&mut self, text: &str) -> Vec<SessionAction> {
        let content = text.trim();
        if content.is_empty() || self.departed {
            return vec![];
        }
        if self.state != ConnectionState::Connected {
            tracing::debug!("dropping text send while {:?}", self.state);
            return vec![];
        }

        let frame =
            ClientFrame::Text { content: content.to_owned(), reply_to: self.pending_reply.take() };
        vec![SessionAction::SendFrame(frame), SessionAction::Render]
    }

    fn handle_send_image(
        &mut self,
        mime: &str,
        bytes: &[u8],
    ) -> Result<Vec<SessionAction>, SessionError> {
        // Validation runs before the connectivity check so the caller always
        // hears about a rejected file.
        let content = attachment::encode(mime, bytes)?;

        if self.departed {
            return Ok(vec![]);
        }
        if self.state != ConnectionState::Connected {
            tracing::debug!("dropping image send while {:?}", self.state);
            return Ok(vec![]);
        }

        let frame = ClientFrame::Image { content, reply_to: self.pending_reply.take() };
        Ok(vec![SessionAction::SendFrame(frame), SessionAction::Render])
    }

    fn handle_start_reply(&mut self, id: EntryId) -> Vec<SessionAction> {
        let Some(entry) = self.timeline.entry(id) else {
            return vec![];
        };
        let EntryBody::Chat(message) = &entry.body else {
            return vec![];
        };

        self.pending_reply = Some(reply::capture(message));
        vec![SessionAction::Render]
    }

    fn handle_cancel_reply(&mut self) -> Vec<SessionAction> {
        self.pending_reply = None;
        vec![SessionAction::Render]
    }

    fn handle_leave(&mut self) -> Vec<SessionAction> {
        if self.departed {
            return vec![];
        }
        self.departed = true;
        self.state = ConnectionState::Disconnected;
        vec![SessionAction::LeaveRoom, SessionAction::CloseTransport, SessionAction::NavigateHome]
    }
}

#[cfg(test)]
mod tests {
    use driftroom_core::attachment::{AttachmentError, MAX_IMAGE_BYTES};
    use driftroom_proto::ContentKind;

    use super::*;

    fn connected_session() -> Session {
        let mut session = Session::new("lobby", "ada");
        session.open();
        session.handle(SessionEvent::TransportOpened).unwrap();
        session
    }

    fn live_message(sender: &str, content: &str) -> String {
        format!(
            r#"{{"type":"message","username":"{sender}","content":"{content}","message_type":"text","timestamp":1}}"#
        )
    }

    #[test]
    fn open_emits_connect_and_room_info_refresh() {
        let mut session = Session::new("lobby", "ada");
        let actions = session.open();

        assert_eq!(actions, vec![
            SessionAction::Connect,
            SessionAction::FetchRoomInfo,
            SessionAction::Render
        ]);
        assert_eq!(session.state(), ConnectionState::Connecting);
    }

    #[test]
    fn open_is_a_noop_while_transport_is_open() {
        let mut session = Session::new("lobby", "ada");
        session.open();
        assert!(session.open().is_empty());

        session.handle(SessionEvent::TransportOpened).unwrap();
        assert!(session.open().is_empty());
        assert_eq!(session.state(), ConnectionState::Connected);
    }

    #[test]
    fn transport_close_disconnects_but_is_not_fatal() {
        let mut session = connected_session();
        let actions = session.handle(SessionEvent::TransportClosed).unwrap();

        assert_eq!(actions, vec![SessionAction::Render]);
        assert_eq!(session.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn foreground_transition_reconnects_only_when_disconnected() {
        let mut session = connected_session();

        // Visible while connected: nothing to do.
        let actions = session.handle(SessionEvent::VisibilityChanged { visible: true }).unwrap();
        assert!(actions.is_empty());

        // Backgrounding alone never triggers anything.
        session.handle(SessionEvent::TransportClosed).unwrap();
        let actions = session.handle(SessionEvent::VisibilityChanged { visible: false }).unwrap();
        assert!(actions.is_empty());

        // Returning to foreground while disconnected re-opens.
        let actions = session.handle(SessionEvent::VisibilityChanged { visible: true }).unwrap();
        assert!(actions.contains(&SessionAction::Connect));
        assert!(actions.contains(&SessionAction::FetchRoomInfo));
    }

    #[test]
    fn malformed_frames_are_dropped_without_state_change() {
        let mut session = connected_session();
        session.handle(SessionEvent::FrameReceived { raw: live_message("bob", "hi") }).unwrap();

        for raw in ["", "not json", r#"{"type":"mystery"}"#] {
            let actions =
                session.handle(SessionEvent::FrameReceived { raw: raw.to_owned() }).unwrap();
            assert!(actions.is_empty());
        }

        assert_eq!(session.timeline().len(), 1);
        assert_eq!(session.state(), ConnectionState::Connected);
    }

    #[test]
    fn history_replaces_and_live_messages_append() {
        let mut session = connected_session();
        session.handle(SessionEvent::FrameReceived { raw: live_message("bob", "early") }).unwrap();

        let history = r#"{"type":"history","messages":[
            {"username":"ada","content":"one","timestamp":1},
            {"username":"bob","content":"two","timestamp":2}
        ]}"#;
        session.handle(SessionEvent::FrameReceived { raw: history.to_owned() }).unwrap();
        assert_eq!(session.timeline().len(), 2);

        session.handle(SessionEvent::FrameReceived { raw: live_message("eve", "three") }).unwrap();
        assert_eq!(session.timeline().len(), 3);
    }

    #[test]
    fn presence_events_append_notice_and_request_refresh() {
        let mut session = connected_session();
        let raw = r#"{"type":"user_joined","username":"eve","timestamp":7}"#;
        let actions = session.handle(SessionEvent::FrameReceived { raw: raw.to_owned() }).unwrap();

        assert_eq!(actions, vec![SessionAction::FetchRoomInfo, SessionAction::Render]);
        let EntryBody::System(notice) = &session.timeline().entries()[0].body else {
            panic!("expected system notice");
        };
        assert_eq!(notice.content, "eve joined the room");

        let raw = r#"{"type":"user_left","username":"eve","timestamp":9}"#;
        session.handle(SessionEvent::FrameReceived { raw: raw.to_owned() }).unwrap();
        let EntryBody::System(notice) = &session.timeline().entries()[1].body else {
            panic!("expected system notice");
        };
        assert_eq!(notice.content, "eve left the room");
    }

    #[test]
    fn room_info_updates_presence_and_expiry() {
        let mut session = connected_session();
        let info = driftroom_proto::RoomInfo {
            users: vec!["ada".into(), "bob".into()],
            expire_at: Some(100_000),
        };
        session
            .handle(SessionEvent::RoomInfoFetched { result: RoomInfoResult::Available(info) })
            .unwrap();

        assert_eq!(session.occupants(), ["ada".to_string(), "bob".to_string()]);
        session.handle(SessionEvent::Tick { now_ms: 10_000 }).unwrap();
        assert_eq!(session.countdown_label(), Some("1m 30s"));
    }

    #[test]
    fn failed_refresh_keeps_last_known_occupants() {
        let mut session = connected_session();
        let info =
            driftroom_proto::RoomInfo { users: vec!["ada".into(), "bob".into()], expire_at: None };
        session
            .handle(SessionEvent::RoomInfoFetched { result: RoomInfoResult::Available(info) })
            .unwrap();

        // A user_left notice with no successful refresh afterwards must not
        // remove anyone.
        let raw = r#"{"type":"user_left","username":"bob","timestamp":9}"#;
        session.handle(SessionEvent::FrameReceived { raw: raw.to_owned() }).unwrap();
        session
            .handle(SessionEvent::RoomInfoFetched {
                result: RoomInfoResult::Unavailable { reason: "timeout".into() },
            })
            .unwrap();

        assert_eq!(session.occupants(), ["ada".to_string(), "bob".to_string()]);
    }

    #[test]
    fn gone_room_fails_the_session_and_navigates_home() {
        let mut session = connected_session();
        let actions =
            session.handle(SessionEvent::RoomInfoFetched { result: RoomInfoResult::Gone }).unwrap();

        assert_eq!(actions, vec![SessionAction::CloseTransport, SessionAction::NavigateHome]);
        assert_eq!(session.state(), ConnectionState::Failed);

        // Terminal: no reconnect on foreground, no reopen.
        let actions = session.handle(SessionEvent::VisibilityChanged { visible: true }).unwrap();
        assert!(actions.is_empty());
        assert!(session.open().is_empty());
    }

    #[test]
    fn whitespace_only_send_is_a_noop() {
        let mut session = connected_session();
        assert!(session.send_text("   \n\t  ").is_empty());
        assert!(session.send_text("").is_empty());
    }

    #[test]
    fn sends_while_disconnected_are_dropped() {
        let mut session = Session::new("lobby", "ada");
        assert!(session.send_text("hello").is_empty());

        let actions = session.send_image("image/png", &[1, 2, 3]).unwrap();
        assert!(actions.is_empty());
    }

    #[test]
    fn send_text_trims_and_carries_pending_reply() {
        let mut session = connected_session();
        session.handle(SessionEvent::FrameReceived { raw: live_message("bob", "quoted") }).unwrap();
        session.start_reply(session.timeline().entries()[0].id);

        let actions = session.send_text("  a reply  ");
        let SessionAction::SendFrame(ClientFrame::Text { content, reply_to }) = &actions[0] else {
            panic!("expected text frame");
        };
        assert_eq!(content, "a reply");
        assert_eq!(reply_to.as_ref().map(|r| r.content.as_str()), Some("quoted"));

        // Cleared after the successful send.
        assert!(session.pending_reply().is_none());
    }

    #[test]
    fn starting_a_new_reply_replaces_the_previous_one() {
        let mut session = connected_session();
        session.handle(SessionEvent::FrameReceived { raw: live_message("bob", "first") }).unwrap();
        session.handle(SessionEvent::FrameReceived { raw: live_message("eve", "second") }).unwrap();

        session.start_reply(session.timeline().entries()[0].id);
        session.start_reply(session.timeline().entries()[1].id);

        assert_eq!(session.pending_reply().map(|r| r.content.as_str()), Some("second"));
    }

    #[test]
    fn reply_snapshot_survives_history_replace() {
        let mut session = connected_session();
        session.handle(SessionEvent::FrameReceived { raw: live_message("bob", "quoted") }).unwrap();
        session.start_reply(session.timeline().entries()[0].id);

        let history = r#"{"type":"history","messages":[]}"#;
        session.handle(SessionEvent::FrameReceived { raw: history.to_owned() }).unwrap();

        assert!(session.timeline().is_empty());
        assert_eq!(session.pending_reply().map(|r| r.content.as_str()), Some("quoted"));
    }

    #[test]
    fn system_notices_are_not_quotable() {
        let mut session = connected_session();
        let raw = r#"{"type":"user_joined","username":"eve","timestamp":7}"#;
        session.handle(SessionEvent::FrameReceived { raw: raw.to_owned() }).unwrap();

        let actions = session.start_reply(session.timeline().entries()[0].id);
        assert!(actions.is_empty());
        assert!(session.pending_reply().is_none());
    }

    #[test]
    fn cancel_reply_clears_the_pending_snapshot() {
        let mut session = connected_session();
        session.handle(SessionEvent::FrameReceived { raw: live_message("bob", "hi") }).unwrap();
        session.start_reply(session.timeline().entries()[0].id);

        session.cancel_reply();
        assert!(session.pending_reply().is_none());
    }

    #[test]
    fn rejected_attachment_leaves_pending_reply_untouched() {
        let mut session = connected_session();
        session.handle(SessionEvent::FrameReceived { raw: live_message("bob", "hi") }).unwrap();
        session.start_reply(session.timeline().entries()[0].id);

        let oversized = vec![0u8; MAX_IMAGE_BYTES + 1];
        let err = session.send_image("image/png", &oversized).unwrap_err();
        assert!(matches!(err, SessionError::Attachment {
            source: AttachmentError::TooLarge { .. }
        }));

        let err = session.send_image("text/plain", b"not an image").unwrap_err();
        assert!(matches!(err, SessionError::Attachment {
            source: AttachmentError::UnsupportedType { .. }
        }));

        assert!(session.pending_reply().is_some());
    }

    #[test]
    fn send_image_produces_a_data_uri_frame() {
        let mut session = connected_session();
        let actions = session.send_image("image/gif", &[0x47, 0x49, 0x46]).unwrap();

        let SessionAction::SendFrame(ClientFrame::Image { content, reply_to }) = &actions[0] else {
            panic!("expected image frame");
        };
        assert_eq!(content, "data:image/gif;base64,R0lG");
        assert!(reply_to.is_none());
    }

    #[test]
    fn expiry_tick_notifies_exactly_once() {
        let mut session = connected_session();
        let info = driftroom_proto::RoomInfo { users: vec![], expire_at: Some(50_000) };
        session
            .handle(SessionEvent::RoomInfoFetched { result: RoomInfoResult::Available(info) })
            .unwrap();

        let actions = session.handle(SessionEvent::Tick { now_ms: 50_000 }).unwrap();
        assert_eq!(actions, vec![SessionAction::NotifyExpired, SessionAction::Render]);
        assert!(session.is_expired());

        let actions = session.handle(SessionEvent::Tick { now_ms: 51_000 }).unwrap();
        assert!(actions.is_empty());
    }

    #[test]
    fn leave_orders_teardown_actions() {
        let mut session = connected_session();
        let actions = session.leave();

        assert_eq!(actions, vec![
            SessionAction::LeaveRoom,
            SessionAction::CloseTransport,
            SessionAction::NavigateHome
        ]);
        assert!(session.is_departed());

        // Departed sessions ignore further intents and reconnect triggers.
        assert!(session.leave().is_empty());
        assert!(session.handle(SessionEvent::VisibilityChanged { visible: true }).unwrap().is_empty());
        assert!(session.send_text("too late").is_empty());
    }

    #[test]
    fn leave_before_any_transport_still_tears_down() {
        let mut session = Session::new("lobby", "ada");
        let actions = session.leave();

        assert_eq!(actions, vec![
            SessionAction::LeaveRoom,
            SessionAction::CloseTransport,
            SessionAction::NavigateHome
        ]);
    }

    #[test]
    fn image_message_content_kind_round_trips_through_timeline() {
        let mut session = connected_session();
        let raw = r#"{"type":"message","username":"bob","content":"data:image/png;base64,AAAA","message_type":"image","timestamp":3}"#;
        session.handle(SessionEvent::FrameReceived { raw: raw.to_owned() }).unwrap();

        let EntryBody::Chat(message) = &session.timeline().entries()[0].body else {
            panic!("expected chat message");
        };
        assert_eq!(message.kind, ContentKind::Image);
    }
}
