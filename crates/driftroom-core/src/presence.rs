//! Occupant list tracking.
//!
//! The occupant list is server-authoritative and refreshed, not streamed:
//! join/leave wire events only signal that a refresh should be pulled. Until
//! a refresh succeeds the tracker keeps the last known list — stale but
//! consistent, never silently dropped.

/// Last known occupant list of the room.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Presence {
    users: Vec<String>,
}

impl Presence {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the list with a fresh server-authoritative snapshot.
    ///
    /// This is the only mutation path; wire events never edit the list
    /// directly.
    pub fn apply(&mut self, users: Vec<String>) {
        self.users = users;
    }

    /// Current occupants, in server order.
    pub fn users(&self) -> &[String] {
        &self.users
    }

    /// Number of known occupants.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// True when no occupants are known.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_replaces_the_whole_list() {
        let mut presence = Presence::new();
        presence.apply(vec!["ada".into(), "bob".into()]);
        presence.apply(vec!["eve".into()]);

        assert_eq!(presence.users(), ["eve".to_string()]);
        assert_eq!(presence.len(), 1);
    }

    #[test]
    fn list_survives_until_the_next_successful_refresh() {
        let mut presence = Presence::new();
        presence.apply(vec!["ada".into(), "bob".into()]);

        // A user_left wire event with no subsequent refresh must not remove
        // anyone; only a fresh snapshot may.
        assert_eq!(presence.users().len(), 2);
    }
}
