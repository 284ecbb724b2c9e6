//! Write-behind persistence of games and their restoration at startup.
//!
//! Engine operations only queue game IDs; this task snapshots each queued game
//! under its read lock and writes it after the lock is released, so storage
//! latency never delays a buzz.

use std::collections::HashSet;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::{
    dao::{game_store::GameStore, models::GameEntity, storage::StorageResult},
    state::{
        SharedState,
        game::{Game, GameId},
    },
};

/// Drain the dirty-game queue until the application shuts down.
///
/// Writes are coalesced over the configured debounce window. Games that could
/// not be written stay queued and are retried on the next wake-up, which also
/// happens whenever the storage backend comes back.
pub async fn run(state: SharedState) {
    let Some(mut queue) = state.take_dirty_queue().await else {
        warn!("persistence task already running");
        return;
    };
    let debounce = state.config().persist_debounce;
    let mut degraded = state.degraded_watcher();
    let mut pending: HashSet<GameId> = HashSet::new();

    loop {
        tokio::select! {
            received = queue.recv() => match received {
                Some(game_id) => {
                    pending.insert(game_id);
                }
                None => break,
            },
            changed = degraded.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }

        if !debounce.is_zero() {
            sleep(debounce).await;
        }
        while let Ok(game_id) = queue.try_recv() {
            pending.insert(game_id);
        }

        flush(&state, &mut pending).await;
    }

    flush(&state, &mut pending).await;
}

/// Write every pending game that still exists, keeping failed ones queued.
pub async fn flush(state: &SharedState, pending: &mut HashSet<GameId>) {
    // Evicted games are deleted by the expiry sweeper.
    pending.retain(|game_id| state.sessions().game(game_id).is_ok());
    if pending.is_empty() {
        return;
    }

    let Some(store) = state.game_store().await else {
        debug!(pending = pending.len(), "no storage backend; keeping games queued");
        return;
    };

    let batch: Vec<GameId> = pending.drain().collect();
    for game_id in batch {
        let Ok(handle) = state.sessions().game(&game_id) else {
            continue;
        };
        let entity = GameEntity::from(&*handle.read().await);

        if let Err(err) = store.save_game(entity).await {
            warn!(game_id = %game_id, error = %err, "failed to persist game; will retry");
            pending.insert(game_id);
        }
    }
}

/// Load every stored game into memory, skipping records that break game invariants.
///
/// Returns the number of games restored.
pub async fn restore_games(state: &SharedState, store: &dyn GameStore) -> StorageResult<usize> {
    let entities = store.list_games().await?;
    let total = entities.len();
    let mut restored = 0;

    for entity in entities {
        let game_id = entity.id.clone();
        match Game::try_from(entity) {
            Ok(game) => {
                if state.sessions().insert_game(game) {
                    restored += 1;
                } else {
                    debug!(game_id = %game_id, "stored game already known; skipping");
                }
            }
            Err(err) => warn!(game_id = %game_id, error = %err, "skipping invalid stored game"),
        }
    }

    info!(restored, total, "restored games from storage");
    Ok(restored)
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{Arc, Mutex},
        time::Duration,
    };

    use futures::future::BoxFuture;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::storage::StorageError,
        services::game_service,
        state::AppState,
    };

    #[derive(Default)]
    struct MemoryStore {
        games: Mutex<Vec<GameEntity>>,
        fail_saves: bool,
    }

    impl MemoryStore {
        fn saved(&self) -> Vec<GameEntity> {
            self.games.lock().unwrap().clone()
        }
    }

    impl GameStore for Arc<MemoryStore> {
        fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
            let store = Arc::clone(self);
            Box::pin(async move {
                if store.fail_saves {
                    return Err(StorageError::unavailable(
                        "save failed".into(),
                        std::io::Error::other("offline"),
                    ));
                }
                let mut games = store.games.lock().unwrap();
                games.retain(|existing| existing.id != game.id);
                games.push(game);
                Ok(())
            })
        }

        fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
            let games = self.saved();
            Box::pin(async move { Ok(games) })
        }

        fn delete_game(&self, id: String) -> BoxFuture<'static, StorageResult<bool>> {
            let store = Arc::clone(self);
            Box::pin(async move {
                let mut games = store.games.lock().unwrap();
                let before = games.len();
                games.retain(|game| game.id != id);
                Ok(games.len() != before)
            })
        }

        fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
            Box::pin(async { Ok(()) })
        }

        fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
            Box::pin(async { Ok(()) })
        }
    }

    fn state() -> SharedState {
        AppState::new(AppConfig::default())
    }

    #[tokio::test]
    async fn flush_writes_current_snapshot() {
        let state = state();
        let memory = Arc::new(MemoryStore::default());
        state.set_game_store(Arc::new(Arc::clone(&memory))).await;

        let alice = game_service::create_game(&state, "Alice").await.unwrap();
        game_service::buzz(&state, &alice.game_ext_id, &alice.session_key)
            .await
            .unwrap();

        let mut pending = HashSet::from([alice.game_ext_id.clone()]);
        flush(&state, &mut pending).await;

        assert!(pending.is_empty());
        let saved = memory.saved();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].buzz_order, vec![alice.session_key]);
    }

    #[tokio::test]
    async fn failed_writes_stay_queued() {
        let state = state();
        let memory = Arc::new(MemoryStore {
            fail_saves: true,
            ..MemoryStore::default()
        });
        state.set_game_store(Arc::new(memory)).await;

        let alice = game_service::create_game(&state, "Alice").await.unwrap();
        let mut pending = HashSet::from([alice.game_ext_id.clone()]);
        flush(&state, &mut pending).await;

        assert!(pending.contains(&alice.game_ext_id));
    }

    #[tokio::test]
    async fn evicted_games_are_dropped_from_queue() {
        let state = state();
        let mut pending = HashSet::from(["GONEGAME".to_string()]);
        flush(&state, &mut pending).await;
        assert!(pending.is_empty());
    }

    #[tokio::test]
    async fn restore_skips_invalid_records() {
        let source = state();
        let alice = game_service::create_game(&source, "Alice").await.unwrap();
        let bob = game_service::join_game(&source, &alice.game_ext_id, "Bob")
            .await
            .unwrap();
        game_service::buzz(&source, &alice.game_ext_id, &bob.session_key)
            .await
            .unwrap();

        let handle = source.sessions().game(&alice.game_ext_id).unwrap();
        let good = GameEntity::from(&*handle.read().await);
        let mut broken = good.clone();
        broken.id = "BROKENID".into();
        broken.players.clear();

        let memory = Arc::new(MemoryStore::default());
        memory.games.lock().unwrap().extend([good, broken]);

        let target = state();
        let restored = restore_games(&target, &Arc::clone(&memory)).await.unwrap();
        assert_eq!(restored, 1);

        let status = crate::services::public_service::get_status(
            &target,
            &alice.game_ext_id,
            &bob.session_key,
        )
        .await
        .unwrap();
        assert_eq!(status.player_list[1].buzz_order, 0);
        assert!(target.sessions().game("BROKENID").is_err());
    }

    #[tokio::test]
    async fn background_task_persists_new_games() {
        let state = AppState::new(AppConfig {
            persist_debounce: Duration::from_millis(5),
            ..AppConfig::default()
        });
        let memory = Arc::new(MemoryStore::default());
        state.set_game_store(Arc::new(Arc::clone(&memory))).await;
        tokio::spawn(run(Arc::clone(&state)));

        let alice = game_service::create_game(&state, "Alice").await.unwrap();

        for _ in 0..100 {
            if !memory.saved().is_empty() {
                break;
            }
            sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(memory.saved()[0].id, alice.game_ext_id);
    }
}
