use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::{dto::sse::ServerEvent, state::game::GameId};

/// Per-game SSE hubs carved out from [`AppState`](super::AppState).
///
/// Hubs are created lazily by the first subscriber and dropped with their game.
pub struct SseState {
    hubs: DashMap<GameId, SseHub>,
    capacity: usize,
}

impl SseState {
    /// Build the registry; every hub gets a broadcast channel of `capacity` slots.
    pub fn new(capacity: usize) -> Self {
        Self {
            hubs: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Register a subscriber on the hub of `game_id`, creating it when needed.
    pub fn subscribe(&self, game_id: &str) -> broadcast::Receiver<ServerEvent> {
        self.hubs
            .entry(game_id.to_owned())
            .or_insert_with(|| SseHub::new(self.capacity))
            .subscribe()
    }

    /// Send to the subscribers of `game_id`; no-op when nobody ever subscribed.
    pub fn broadcast(&self, game_id: &str, event: ServerEvent) {
        if let Some(hub) = self.hubs.get(game_id) {
            hub.broadcast(event);
        }
    }

    /// Drop the hub of `game_id`, closing every open stream of that game.
    pub fn remove(&self, game_id: &str) {
        self.hubs.remove(game_id);
    }
}

/// Simple broadcast hub wrapper used by the SSE services.
pub struct SseHub {
    sender: broadcast::Sender<ServerEvent>,
}

impl SseHub {
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    /// Send an event to all current subscribers, ignoring delivery errors.
    pub fn broadcast(&self, event: ServerEvent) {
        let _ = self.sender.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(data: &str) -> ServerEvent {
        ServerEvent {
            event: Some("status".into()),
            data: data.into(),
        }
    }

    #[tokio::test]
    async fn events_reach_only_their_game() {
        let sse = SseState::new(4);
        let mut first = sse.subscribe("AAAAAAAA");
        let mut second = sse.subscribe("BBBBBBBB");

        sse.broadcast("AAAAAAAA", event("one"));

        assert_eq!(first.recv().await.unwrap().data, "one");
        assert!(second.try_recv().is_err());
    }

    #[tokio::test]
    async fn removing_a_hub_closes_its_streams() {
        let sse = SseState::new(4);
        let mut receiver = sse.subscribe("AAAAAAAA");
        sse.remove("AAAAAAAA");
        assert!(matches!(
            receiver.recv().await,
            Err(broadcast::error::RecvError::Closed)
        ));
    }

    #[test]
    fn broadcasting_without_subscribers_is_silent() {
        let sse = SseState::new(4);
        sse.broadcast("CCCCCCCC", event("lost"));
    }
}
