//! JSON envelopes for the live room transport.
//!
//! The transport carries UTF-8 text frames. Each frame is a single JSON
//! object tagged on a `type` field: the server pushes [`ServerEvent`]s, the
//! client sends [`ClientFrame`]s. The payload type is determined entirely by
//! the tag, so both enums use serde's internal tagging and decode in one pass.

use serde::{Deserialize, Serialize};

use crate::errors::ProtocolError;

/// Kind of content carried by a chat message.
///
/// Absent on the wire for plain text from older servers, so decoding defaults
/// to [`ContentKind::Text`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    /// Plain text content.
    #[default]
    Text,
    /// Image content, transmitted as a self-contained data URI.
    Image,
}

/// Immutable quoted copy of a message, attached to a reply.
///
/// Carries the quoted sender, content, and kind by value. It is a snapshot,
/// never a reference: once captured it is independent of any later mutation
/// or replacement of the original message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplySnapshot {
    /// Display name of the quoted sender.
    pub username: String,

    /// Quoted content (text, or an image data URI).
    pub content: String,

    /// Kind of the quoted content.
    #[serde(default, rename = "message_type")]
    pub kind: ContentKind,
}

/// One chat message as it appears on the wire.
///
/// Used both inside `history` batches and as the body of a live `message`
/// envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    /// Display name of the sender.
    pub username: String,

    /// Message content (text, or an image data URI).
    pub content: String,

    /// Content kind. Defaults to text when the field is absent.
    #[serde(default, rename = "message_type")]
    pub kind: ContentKind,

    /// Server timestamp in Unix milliseconds since epoch (UTC).
    pub timestamp: u64,

    /// Quoted message this one replies to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<ReplySnapshot>,
}

/// Occupant change notification payload.
///
/// Carries only the affected username, never the full occupant list; the
/// authoritative list is pulled from the room-info collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceChange {
    /// Display name of the occupant that joined or left.
    pub username: String,

    /// Server timestamp in Unix milliseconds since epoch (UTC).
    pub timestamp: u64,
}

/// Inbound envelope pushed by the server over the live transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Full message history for the room. Replaces the timeline.
    History {
        /// Ordered historical messages, oldest first.
        messages: Vec<WireMessage>,
    },

    /// One live chat message. Appends to the timeline.
    Message(WireMessage),

    /// An occupant joined the room.
    UserJoined(PresenceChange),

    /// An occupant left the room.
    UserLeft(PresenceChange),
}

impl ServerEvent {
    /// Decode one inbound text frame.
    ///
    /// Never panics; any malformed or unrecognized frame yields
    /// [`ProtocolError::MalformedFrame`], which callers drop and log.
    pub fn decode(raw: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(raw)
            .map_err(|err| ProtocolError::MalformedFrame { reason: err.to_string() })
    }
}

/// Outbound envelope sent by the client over the live transport.
///
/// `reply_to` is omitted from the JSON entirely when the message carries no
/// quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientFrame {
    /// Plain text message.
    Text {
        /// Trimmed message text.
        content: String,

        /// Quoted message, if replying.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reply_to: Option<ReplySnapshot>,
    },

    /// Image message.
    Image {
        /// Self-contained image data URI.
        content: String,

        /// Quoted message, if replying.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reply_to: Option<ReplySnapshot>,
    },
}

impl ClientFrame {
    /// Encode this frame as a JSON text frame.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(|err| ProtocolError::Encode { reason: err.to_string() })
    }
}
