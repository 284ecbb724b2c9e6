//! Periodic eviction of games nobody has touched for a while.

use std::time::{Duration, SystemTime};

use tokio::time::{MissedTickBehavior, interval};
use tracing::{info, warn};

use crate::state::{SharedState, game::GameId};

/// Sweep idle games forever at the configured interval. Returns at once when expiry is disabled.
pub async fn run(state: SharedState) {
    let Some(ttl) = state.config().idle_game_ttl else {
        info!("idle game expiry disabled");
        return;
    };

    let mut ticker = interval(state.config().expiry_sweep_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        sweep(&state, ttl).await;
    }
}

/// Evict games idle for at least `max_idle`, close their streams and delete their stored copy.
pub async fn sweep(state: &SharedState, max_idle: Duration) -> Vec<GameId> {
    let Some(cutoff) = SystemTime::now().checked_sub(max_idle) else {
        return Vec::new();
    };

    let removed = state.sessions().remove_idle_games(cutoff).await;
    if removed.is_empty() {
        return removed;
    }

    info!(count = removed.len(), remaining = state.sessions().len(), "evicted idle games");
    for game_id in &removed {
        state.close_game_streams(game_id);
    }

    if let Some(store) = state.game_store().await {
        for game_id in &removed {
            if let Err(err) = store.delete_game(game_id.clone()).await {
                warn!(
                    game_id = %game_id,
                    error = %err,
                    "failed to delete evicted game from storage"
                );
            }
        }
    }

    removed
}

#[cfg(test)]
mod tests {
    use tokio::sync::broadcast::error::RecvError;

    use super::*;
    use crate::{config::AppConfig, services::game_service, state::AppState};

    #[tokio::test]
    async fn sweep_evicts_idle_games_and_their_sessions() {
        let state = AppState::new(AppConfig::default());
        let alice = game_service::create_game(&state, "Alice").await.unwrap();
        let mut events = state.subscribe_game(&alice.game_ext_id);

        let removed = sweep(&state, Duration::ZERO).await;

        assert_eq!(removed, vec![alice.game_ext_id.clone()]);
        assert!(state.sessions().session_game(&alice.session_key).is_none());
        assert!(matches!(events.recv().await, Err(RecvError::Closed)));
        assert!(
            game_service::buzz(&state, &alice.game_ext_id, &alice.session_key)
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn sweep_keeps_recent_games() {
        let state = AppState::new(AppConfig::default());
        game_service::create_game(&state, "Alice").await.unwrap();

        let removed = sweep(&state, Duration::from_secs(3600)).await;
        assert!(removed.is_empty());
        assert_eq!(state.sessions().len(), 1);
    }
}
