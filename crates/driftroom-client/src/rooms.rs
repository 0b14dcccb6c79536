//! HTTP room-info collaborator.
//!
//! One-shot request/response calls beside the live transport: the
//! authoritative occupant list and expiry come from `GET /api/room/{room}`,
//! and explicit exits fire a best-effort `DELETE /api/leave-room/{room}/{user}`.
//! Fetch outcomes are reported as [`RoomInfoResult`] values rather than
//! errors, because a failed refresh is an expected, recoverable condition.

use driftroom_proto::RoomInfo;
use reqwest::StatusCode;
use url::Url;

use crate::event::RoomInfoResult;

/// Client for the room-info and leave endpoints.
#[derive(Debug, Clone)]
pub struct RoomApi {
    base: Url,
    client: reqwest::Client,
}

impl RoomApi {
    /// Create a client against the given API base URL.
    pub fn new(base: Url) -> Self {
        Self { base, client: reqwest::Client::new() }
    }

    /// Pull the authoritative room info.
    ///
    /// Not-found and gone statuses map to [`RoomInfoResult::Gone`], which is
    /// terminal for the session. Every other failure is transient: the
    /// session keeps its last known state.
    pub async fn fetch_room_info(&self, room: &str) -> RoomInfoResult {
        let url = match self.endpoint(&["api", "room", room]) {
            Ok(url) => url,
            Err(reason) => return RoomInfoResult::Unavailable { reason },
        };

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(err) => return RoomInfoResult::Unavailable { reason: err.to_string() },
        };

        if matches!(response.status(), StatusCode::NOT_FOUND | StatusCode::GONE) {
            return RoomInfoResult::Gone;
        }

        let response = match response.error_for_status() {
            Ok(response) => response,
            Err(err) => return RoomInfoResult::Unavailable { reason: err.to_string() },
        };

        match response.json::<RoomInfo>().await {
            Ok(info) => RoomInfoResult::Available(info),
            Err(err) => RoomInfoResult::Unavailable { reason: err.to_string() },
        }
    }

    /// Tell the server this user is leaving the room.
    ///
    /// Best effort: failures are logged and never block teardown.
    pub async fn leave_room(&self, room: &str, user: &str) {
        let url = match self.endpoint(&["api", "leave-room", room, user]) {
            Ok(url) => url,
            Err(reason) => {
                tracing::warn!("skipping leave request: {reason}");
                return;
            },
        };

        if let Err(err) = self.client.delete(url).send().await {
            tracing::warn!("leave request failed: {err}");
        }
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, String> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| format!("{} cannot be a base", self.base))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}
