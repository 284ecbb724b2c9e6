use serde::Serialize;
use tracing::warn;

use crate::{
    dto::{game::GameStatus, sse::ServerEvent},
    state::SharedState,
};

/// SSE event name carrying a full [`GameStatus`].
pub const EVENT_STATUS: &str = "status";

/// Build the status event sent to a game's subscribers.
pub fn status_event(status: &GameStatus) -> Option<ServerEvent> {
    to_event(EVENT_STATUS, status)
}

/// Broadcast the status of a game to its subscribers.
pub fn broadcast_status(state: &SharedState, status: &GameStatus) {
    if let Some(event) = status_event(status) {
        state.broadcast_to_game(&status.game_id, event);
    }
}

fn to_event(event: &str, payload: &impl Serialize) -> Option<ServerEvent> {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => Some(event),
        Err(err) => {
            warn!(event, error = %err, "failed to serialize SSE payload");
            None
        }
    }
}
