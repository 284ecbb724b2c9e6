/// Session key authorization gate.
pub mod auth;
/// Game aggregate and engine rules.
pub mod game;
pub mod keys;
mod sse;
/// Registry of live games and session keys.
pub mod store;

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock, mpsc, watch};

use crate::{config::AppConfig, dao::game_store::GameStore, dto::sse::ServerEvent};

use self::{game::GameId, sse::SseState, store::SessionStore};

/// Handle to the application state shared by handlers and background tasks.
pub type SharedState = Arc<AppState>;

/// Central application state: the game registry, SSE hubs and storage handle.
pub struct AppState {
    config: AppConfig,
    sessions: SessionStore,
    game_store: RwLock<Option<Arc<dyn GameStore>>>,
    degraded: watch::Sender<bool>,
    sse: SseState,
    dirty_tx: mpsc::UnboundedSender<GameId>,
    dirty_rx: Mutex<Option<mpsc::UnboundedReceiver<GameId>>>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The state starts healthy; callers that configure a storage backend mark it
    /// degraded until the backend is reachable.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(false);
        let (dirty_tx, dirty_rx) = mpsc::unbounded_channel();
        Arc::new(Self {
            sessions: SessionStore::new(config.game_id_length, config.session_key_length),
            sse: SseState::new(config.sse_capacity),
            config,
            game_store: RwLock::new(None),
            degraded: degraded_tx,
            dirty_tx,
            dirty_rx: Mutex::new(Some(dirty_rx)),
        })
    }

    /// Configuration the state was built with.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Authoritative registry of games and session keys.
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Obtain a handle to the current game store, if one is installed.
    pub async fn game_store(&self) -> Option<Arc<dyn GameStore>> {
        let guard = self.game_store.read().await;
        guard.as_ref().cloned()
    }

    /// Install a new game store implementation and leave degraded mode.
    pub async fn set_game_store(&self, store: Arc<dyn GameStore>) {
        {
            let mut guard = self.game_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false).await;
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub async fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }

    /// Subscribe to the status stream of one game.
    pub fn subscribe_game(&self, game_id: &str) -> tokio::sync::broadcast::Receiver<ServerEvent> {
        self.sse.subscribe(game_id)
    }

    /// Fan an event out to the subscribers of one game.
    pub fn broadcast_to_game(&self, game_id: &str, event: ServerEvent) {
        self.sse.broadcast(game_id, event);
    }

    /// Close every stream of a game that no longer exists.
    pub fn close_game_streams(&self, game_id: &str) {
        self.sse.remove(game_id);
    }

    /// Queue a game for the write-behind persister.
    pub fn mark_dirty(&self, game_id: &str) {
        // Only fails once the persister receiver has been dropped at shutdown.
        let _ = self.dirty_tx.send(game_id.to_owned());
    }

    /// Hand the dirty-game queue to the persister; `None` once it has been claimed.
    pub async fn take_dirty_queue(&self) -> Option<mpsc::UnboundedReceiver<GameId>> {
        self.dirty_rx.lock().await.take()
    }
}
