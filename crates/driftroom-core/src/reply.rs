//! Quote snapshots for reply threading.
//!
//! Replies carry an immutable copy of the quoted message, never a reference
//! to it. This keeps quotes renderable after the timeline is replaced by a
//! history replay and avoids keeping the message graph alive just to show a
//! preview.

use driftroom_proto::ReplySnapshot;

use crate::timeline::ChatMessage;

/// Capture a detached quote of a chat message.
///
/// Pure copy: the snapshot holds its own sender, content, and kind, and stays
/// unchanged if the source message is later dropped or replaced.
pub fn capture(message: &ChatMessage) -> ReplySnapshot {
    ReplySnapshot {
        username: message.sender.clone(),
        content: message.content.clone(),
        kind: message.kind,
    }
}

#[cfg(test)]
mod tests {
    use driftroom_proto::ContentKind;

    use super::*;

    #[test]
    fn snapshot_outlives_the_source_message() {
        let message = ChatMessage {
            sender: "a".into(),
            content: "hello".into(),
            kind: ContentKind::Text,
            timestamp_ms: 1,
            reply_to: None,
        };

        let snapshot = capture(&message);
        drop(message);

        assert_eq!(snapshot.username, "a");
        assert_eq!(snapshot.content, "hello");
        assert_eq!(snapshot.kind, ContentKind::Text);
    }
}
