//! Async runtime.
//!
//! Event loop that drives one [`Session`]: it owns the WebSocket transport
//! and the HTTP [`RoomApi`], multiplexes host commands, inbound traffic, and
//! a once-per-second tick with `tokio::select!`, and executes the actions
//! the session returns. The session stays Sans-IO; everything effectful
//! lives here.
//!
//! Teardown is scoped, not best-effort: leaving the loop stops the tick and
//! the command intake, and the transport task is aborted on every exit path,
//! including drop before a transport ever opened.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use driftroom_core::EntryId;
use driftroom_proto::ProtocolError;
use thiserror::Error;
use tokio::sync::mpsc;
use url::Url;

use crate::{
    error::SessionError,
    event::{SessionAction, SessionEvent},
    rooms::RoomApi,
    session::Session,
    transport::{self, ConnectedRoom, TransportError, TransportEvent},
};

/// Runtime errors.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Transport configuration or connection setup failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// An outbound frame could not be encoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

/// Host application callbacks.
///
/// The runtime is generic over the host so the same orchestration drives a
/// GUI shell, a test harness, or a headless embedding.
pub trait Host {
    /// Observable session state changed; re-read it through the accessors.
    fn render(&mut self, session: &Session);

    /// The room reached its expiry instant. Called exactly once per instant;
    /// the host applies a grace delay before navigating away so the expired
    /// label is visibly shown.
    fn notify_expired(&mut self);

    /// The session is over (left, expired out, or room gone); leave the room
    /// view.
    fn navigate_home(&mut self);

    /// An image attachment failed validation. User-facing; the send was not
    /// performed.
    fn attachment_rejected(&mut self, error: SessionError);
}

/// Host intents fed to a running [`Runtime`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Send a text message.
    SendText {
        /// Message text.
        text: String,
    },

    /// Send an image attachment.
    SendImage {
        /// MIME type reported for the file.
        mime: String,
        /// Raw file contents.
        bytes: Vec<u8>,
    },

    /// Quote a timeline entry in the next message.
    StartReply {
        /// Timeline entry to quote.
        id: EntryId,
    },

    /// Abandon the pending reply.
    CancelReply,

    /// The application moved to the foreground or background.
    VisibilityChanged {
        /// True when the application became visible.
        visible: bool,
    },

    /// Leave the room and shut the runtime down.
    Leave,
}

/// Async driver for one session.
pub struct Runtime<H: Host> {
    session: Session,
    host: H,
    api: RoomApi,
    base: Url,
    connection: Option<ConnectedRoom>,
    commands: mpsc::Receiver<Command>,
}

impl<H: Host> Runtime<H> {
    /// Create a runtime for a (room, user) pair against a server base URL.
    ///
    /// `base` serves both collaborators: HTTP calls use it as-is and the
    /// WebSocket connect rewrites the scheme.
    pub fn new(
        base: &str,
        room: &str,
        user: &str,
        host: H,
        commands: mpsc::Receiver<Command>,
    ) -> Result<Self, RuntimeError> {
        let base = Url::parse(base)
            .map_err(|err| TransportError::Endpoint { reason: err.to_string() })?;

        Ok(Self {
            session: Session::new(room, user),
            host,
            api: RoomApi::new(base.clone()),
            base,
            connection: None,
            commands,
        })
    }

    /// Read access to the driven session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Run the event loop until the session ends.
    ///
    /// Ends when the session navigates home (leave, expiry redirect, room
    /// gone) or when the command channel closes, which is treated as a
    /// leave.
    pub async fn run(mut self) -> Result<(), RuntimeError> {
        let actions = self.session.open();
        if self.process_actions(actions).await? {
            return Ok(());
        }

        let mut tick = tokio::time::interval(Duration::from_secs(1));
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            let done = if let Some(connection) = self.connection.as_mut() {
                tokio::select! {
                    maybe_command = self.commands.recv() => {
                        self.handle_command(maybe_command).await?
                    }

                    maybe_event = connection.from_room.recv() => {
                        let event = match maybe_event {
                            Some(TransportEvent::Frame(raw)) => SessionEvent::FrameReceived { raw },
                            Some(TransportEvent::Closed) | None => {
                                self.drop_connection();
                                SessionEvent::TransportClosed
                            },
                        };
                        let actions = self.apply(event);
                        self.process_actions(actions).await?
                    }

                    _ = tick.tick() => {
                        let actions = self.apply(SessionEvent::Tick { now_ms: unix_now_ms() });
                        self.process_actions(actions).await?
                    }
                }
            } else {
                tokio::select! {
                    maybe_command = self.commands.recv() => {
                        self.handle_command(maybe_command).await?
                    }

                    _ = tick.tick() => {
                        let actions = self.apply(SessionEvent::Tick { now_ms: unix_now_ms() });
                        self.process_actions(actions).await?
                    }
                }
            };

            if done {
                break;
            }
        }

        Ok(())
    }

    /// Handle one host command. Returns true when the runtime should stop.
    async fn handle_command(&mut self, command: Option<Command>) -> Result<bool, RuntimeError> {
        // A dropped command sender means the host is gone; leave cleanly.
        let event = match command {
            Some(Command::SendText { text }) => SessionEvent::SendText { text },
            Some(Command::SendImage { mime, bytes }) => SessionEvent::SendImage { mime, bytes },
            Some(Command::StartReply { id }) => SessionEvent::StartReply { id },
            Some(Command::CancelReply) => SessionEvent::CancelReply,
            Some(Command::VisibilityChanged { visible }) => {
                SessionEvent::VisibilityChanged { visible }
            },
            Some(Command::Leave) | None => SessionEvent::Leave,
        };

        let actions = self.apply(event);
        self.process_actions(actions).await
    }

    /// Feed one event to the session, routing synchronous failures to the
    /// host.
    fn apply(&mut self, event: SessionEvent) -> Vec<SessionAction> {
        match self.session.handle(event) {
            Ok(actions) => actions,
            Err(error) => {
                self.host.attachment_rejected(error);
                vec![]
            },
        }
    }

    /// Execute actions, feeding any events they produce back into the
    /// session iteratively to avoid async recursion. Returns true when the
    /// runtime should stop.
    async fn process_actions(
        &mut self,
        initial_actions: Vec<SessionAction>,
    ) -> Result<bool, RuntimeError> {
        let mut pending_actions = initial_actions;

        while !pending_actions.is_empty() {
            let actions = std::mem::take(&mut pending_actions);

            for action in actions {
                match action {
                    SessionAction::Connect => {
                        let event = self.connect().await;
                        pending_actions.extend(self.apply(event));
                    },
                    SessionAction::SendFrame(frame) => {
                        let raw = frame.encode()?;
                        match &self.connection {
                            Some(connection) => {
                                if connection.to_room.send(raw).await.is_err() {
                                    tracing::warn!("transport task gone, dropping frame");
                                }
                            },
                            None => tracing::debug!("no transport, dropping frame"),
                        }
                    },
                    SessionAction::FetchRoomInfo => {
                        let result = self.api.fetch_room_info(self.session.room()).await;
                        pending_actions
                            .extend(self.apply(SessionEvent::RoomInfoFetched { result }));
                    },
                    SessionAction::LeaveRoom => {
                        self.api.leave_room(self.session.room(), self.session.user()).await;
                    },
                    SessionAction::CloseTransport => self.drop_connection(),
                    SessionAction::NotifyExpired => self.host.notify_expired(),
                    SessionAction::NavigateHome => {
                        self.host.navigate_home();
                        return Ok(true);
                    },
                    SessionAction::Render => self.host.render(&self.session),
                }
            }
        }

        Ok(false)
    }

    /// Open the transport and report the outcome as a session event.
    async fn connect(&mut self) -> SessionEvent {
        if self.connection.is_some() {
            // One live transport per session; the session should not have
            // asked, but the invariant holds here too.
            return SessionEvent::TransportOpened;
        }

        match transport::connect(&self.base, self.session.room(), self.session.user()).await {
            Ok(connection) => {
                self.connection = Some(connection);
                SessionEvent::TransportOpened
            },
            Err(err) => {
                // Not fatal: the session flags the disconnect and recovery
                // waits for the next foreground transition.
                tracing::warn!("connect failed: {err}");
                SessionEvent::TransportClosed
            },
        }
    }

    fn drop_connection(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.stop();
        }
    }
}

impl<H: Host> Drop for Runtime<H> {
    fn drop(&mut self) {
        self.drop_connection();
    }
}

/// Current wall-clock time in Unix milliseconds.
fn unix_now_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |elapsed| elapsed.as_millis() as u64)
}
