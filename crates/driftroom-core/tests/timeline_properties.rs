//! Property-based tests for the timeline model.
//!
//! Verifies the append/replace contract under arbitrary operation sequences:
//! these are the semantics UI scroll and read-state depend on, so they must
//! hold for all inputs, not just hand-picked examples.

use driftroom_core::{ChatMessage, EntryBody, SystemNotice, Timeline};
use driftroom_proto::ContentKind;
use proptest::prelude::*;

/// One timeline operation.
#[derive(Debug, Clone)]
enum Op {
    AppendChat(String),
    AppendSystem(String),
    Replace(Vec<String>),
}

fn chat(content: &str) -> ChatMessage {
    ChatMessage {
        sender: "ada".into(),
        content: content.into(),
        kind: ContentKind::Text,
        timestamp_ms: 0,
        reply_to: None,
    }
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => "[a-z]{0,12}".prop_map(Op::AppendChat),
        2 => "[a-z]{0,12}".prop_map(Op::AppendSystem),
        1 => prop::collection::vec("[a-z]{0,12}", 0..8).prop_map(Op::Replace),
    ]
}

fn apply(timeline: &mut Timeline, op: &Op) {
    match op {
        Op::AppendChat(content) => {
            timeline.append_chat(chat(content));
        },
        Op::AppendSystem(content) => {
            timeline.append_system(SystemNotice { content: content.clone(), timestamp_ms: 0 });
        },
        Op::Replace(batch) => {
            timeline.replace(batch.iter().map(|c| chat(c)).collect());
        },
    }
}

proptest! {
    /// Timeline length equals the size of the last replace batch plus the
    /// number of appends since, and appended content arrives in order.
    #[test]
    fn prop_length_tracks_appends_since_last_replace(ops in prop::collection::vec(op_strategy(), 0..40)) {
        let mut timeline = Timeline::new();
        let mut expected_len = 0usize;
        let mut appended: Vec<String> = Vec::new();

        for op in &ops {
            apply(&mut timeline, op);
            match op {
                Op::AppendChat(content) | Op::AppendSystem(content) => {
                    expected_len += 1;
                    appended.push(content.clone());
                },
                Op::Replace(batch) => {
                    expected_len = batch.len();
                    appended.clear();
                },
            }
        }

        prop_assert_eq!(timeline.len(), expected_len);

        // The tail of the timeline is exactly the appends since the last
        // replace, in arrival order.
        let tail: Vec<String> = timeline.entries()[timeline.len() - appended.len()..]
            .iter()
            .map(|entry| match &entry.body {
                EntryBody::Chat(m) => m.content.clone(),
                EntryBody::System(n) => n.content.clone(),
            })
            .collect();
        prop_assert_eq!(tail, appended);
    }

    /// Entry ids are unique within the timeline after any operation sequence.
    #[test]
    fn prop_entry_ids_stay_unique(ops in prop::collection::vec(op_strategy(), 0..40)) {
        let mut timeline = Timeline::new();
        for op in &ops {
            apply(&mut timeline, op);

            let mut ids: Vec<_> = timeline.entries().iter().map(|e| e.id).collect();
            let total = ids.len();
            ids.sort_by_key(|id| format!("{id}"));
            ids.dedup();
            prop_assert_eq!(ids.len(), total, "duplicate entry id after {:?}", op);
        }
    }

    /// Replacing twice with the same batch yields an identical timeline.
    #[test]
    fn prop_replace_is_idempotent(batch in prop::collection::vec("[a-z]{0,12}", 0..16)) {
        let messages: Vec<ChatMessage> = batch.iter().map(|c| chat(c)).collect();

        let mut timeline = Timeline::new();
        timeline.replace(messages.clone());
        let first: Vec<_> = timeline.entries().to_vec();
        timeline.replace(messages);

        prop_assert_eq!(timeline.entries(), first.as_slice());
    }
}
