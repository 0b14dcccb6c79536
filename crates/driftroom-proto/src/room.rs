//! Room-info payload for the side-channel HTTP collaborator.

use serde::{Deserialize, Serialize};

/// Authoritative room state returned by the room-info endpoint.
///
/// The occupant list is refreshed, never streamed: presence wire events only
/// signal that this payload should be re-fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomInfo {
    /// Current occupants, in server order.
    pub users: Vec<String>,

    /// Room expiry instant in Unix milliseconds since epoch (UTC).
    /// Absent for rooms without a scheduled expiry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expire_at: Option<u64>,
}
