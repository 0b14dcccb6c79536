//! Ordered message timeline.
//!
//! The timeline is the single in-memory record of room activity for a
//! session. It has exactly two mutation paths: [`Timeline::replace`] for
//! history replay and the append methods for live traffic. Display order is
//! strictly arrival order; entries are never reordered by timestamp, even
//! when server timestamps arrive out of order.
//!
//! # Invariants
//!
//! - `replace` is idempotent under identical input.
//! - Appends preserve all prior entries and add exactly one.
//! - History ids are stable within a replay batch and can never collide with
//!   live ids: the live counter is monotonic and never resets.

use std::fmt;

use driftroom_proto::{ContentKind, ReplySnapshot, WireMessage};

/// Locally unique identifier of a timeline entry.
///
/// Not used for protocol correctness — only to give hosts stable iteration
/// keys across re-renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryId {
    /// Entry delivered via history replay; the index within its batch.
    History(usize),
    /// Entry delivered live; drawn from a counter that never resets.
    Live(u64),
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::History(index) => write!(f, "history-{index}"),
            Self::Live(n) => write!(f, "live-{n}"),
        }
    }
}

/// A chat message authored by an occupant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Display name of the sender.
    pub sender: String,

    /// Message content (text, or an image data URI).
    pub content: String,

    /// Kind of the content.
    pub kind: ContentKind,

    /// Server timestamp in Unix milliseconds since epoch (UTC).
    pub timestamp_ms: u64,

    /// Quoted message this one replies to, if any.
    pub reply_to: Option<ReplySnapshot>,
}

impl From<WireMessage> for ChatMessage {
    fn from(wire: WireMessage) -> Self {
        Self {
            sender: wire.username,
            content: wire.content,
            kind: wire.kind,
            timestamp_ms: wire.timestamp,
            reply_to: wire.reply_to,
        }
    }
}

/// A system notice with no sender, such as a join or leave announcement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemNotice {
    /// Human-readable notice text.
    pub content: String,

    /// Server timestamp in Unix milliseconds since epoch (UTC).
    pub timestamp_ms: u64,
}

/// Body of a timeline entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryBody {
    /// Chat message from an occupant.
    Chat(ChatMessage),
    /// System notice.
    System(SystemNotice),
}

/// One timeline entry: a locally unique id plus its body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Locally unique identifier.
    pub id: EntryId,

    /// Entry body.
    pub body: EntryBody,
}

/// Ordered, append/replace-only view of room activity.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    entries: Vec<Entry>,
    next_live: u64,
}

impl Timeline {
    /// Create an empty timeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole timeline with a history replay batch.
    ///
    /// Entries are assigned [`EntryId::History`] ids by batch index. The live
    /// counter is not reset, so ids of entries appended after the replace
    /// stay distinct from ids handed out before it.
    pub fn replace(&mut self, messages: Vec<ChatMessage>) {
        self.entries = messages
            .into_iter()
            .enumerate()
            .map(|(index, message)| Entry {
                id: EntryId::History(index),
                body: EntryBody::Chat(message),
            })
            .collect();
    }

    /// Append one live chat message, returning its assigned id.
    pub fn append_chat(&mut self, message: ChatMessage) -> EntryId {
        self.push_live(EntryBody::Chat(message))
    }

    /// Append one system notice, returning its assigned id.
    pub fn append_system(&mut self, notice: SystemNotice) -> EntryId {
        self.push_live(EntryBody::System(notice))
    }

    fn push_live(&mut self, body: EntryBody) -> EntryId {
        let id = EntryId::Live(self.next_live);
        self.next_live += 1;
        self.entries.push(Entry { id, body });
        id
    }

    /// All entries in arrival order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Look up an entry by id.
    pub fn entry(&self, id: EntryId) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the timeline holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
