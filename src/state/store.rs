//! Authoritative in-memory registry of games and session keys.

use std::{sync::Arc, time::SystemTime};

use dashmap::{DashMap, mapref::entry::Entry};
use tokio::sync::RwLock;
use tracing::debug;

use super::{
    game::{Game, GameError, GameId, Player, SessionKey, normalize_username},
    keys,
};

/// Shared handle to one game; the lock is the unit of mutual exclusion for that game.
pub type GameHandle = Arc<RwLock<Game>>;

/// Outcome of [`SessionStore::create_game`].
#[derive(Debug, Clone)]
pub struct CreatedGame {
    /// Code of the new game.
    pub game_id: GameId,
    /// The creator, holding the game's first session key.
    pub creator: Player,
}

/// Outcome of [`SessionStore::add_player`].
#[derive(Debug, Clone)]
pub struct JoinedGame {
    /// The joined player, new or reused.
    pub player: Player,
    /// `false` when the username was already registered and its session was reused.
    pub is_new: bool,
}

/// Games keyed by ID plus a global index from session key to owning game.
///
/// Each game sits behind its own lock so unrelated games never contend. The
/// session index only ever gains entries while a game lives and loses them when
/// the game is evicted.
pub struct SessionStore {
    games: DashMap<GameId, GameHandle>,
    sessions: DashMap<SessionKey, GameId>,
    game_id_length: usize,
    session_key_length: usize,
}

impl SessionStore {
    /// Empty store issuing identifiers of the given lengths.
    pub fn new(game_id_length: usize, session_key_length: usize) -> Self {
        Self {
            games: DashMap::new(),
            sessions: DashMap::new(),
            game_id_length,
            session_key_length,
        }
    }

    /// Register a new game whose only player is the creator.
    pub fn create_game(&self, username: &str) -> Result<CreatedGame, GameError> {
        let username = normalize_username(username)?;

        loop {
            let game_id = keys::new_game_id(self.game_id_length);
            match self.games.entry(game_id.clone()) {
                Entry::Occupied(_) => {
                    debug!(game_id = %game_id, "generated game id already in use; regenerating");
                }
                Entry::Vacant(slot) => {
                    let session_key = self.reserve_session_key(&game_id);
                    let creator = Player {
                        session_key: session_key.clone(),
                        username: username.clone(),
                        is_creator: true,
                    };
                    let game = Game::new(game_id.clone(), session_key, username);
                    slot.insert(Arc::new(RwLock::new(game)));
                    return Ok(CreatedGame { game_id, creator });
                }
            }
        }
    }

    /// Add a player to an existing game, reusing the session of a player with the same username.
    ///
    /// The username lookup and the insertion happen under the game's write lock.
    pub async fn add_player(&self, game_id: &str, username: &str) -> Result<JoinedGame, GameError> {
        let username = normalize_username(username)?;
        let handle = self.game(game_id)?;
        let mut game = handle.write().await;

        // Eviction removes games while holding their write lock.
        if !self.is_live(game_id, &handle) {
            return Err(GameError::GameNotFound(game_id.to_owned()));
        }

        if let Some(existing) = game.player_by_username(&username) {
            return Ok(JoinedGame {
                player: existing.clone(),
                is_new: false,
            });
        }

        let session_key = self.reserve_session_key(game_id);
        let player = game.add_player(session_key, username);
        Ok(JoinedGame {
            player,
            is_new: true,
        })
    }

    /// Look up the handle of a game.
    pub fn game(&self, game_id: &str) -> Result<GameHandle, GameError> {
        self.games
            .get(game_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| GameError::GameNotFound(game_id.to_owned()))
    }

    /// Whether `handle` is still the registered game for `game_id`.
    ///
    /// Checked after acquiring a game's write lock, since eviction may have run
    /// while the caller waited for it.
    pub fn is_live(&self, game_id: &str, handle: &GameHandle) -> bool {
        self.games
            .get(game_id)
            .is_some_and(|entry| Arc::ptr_eq(entry.value(), handle))
    }

    /// Game owning the session key, if the key was ever issued and its game still lives.
    pub fn session_game(&self, session_key: &str) -> Option<GameId> {
        self.sessions
            .get(session_key)
            .map(|entry| entry.value().clone())
    }

    /// Install a previously persisted game.
    ///
    /// Returns `false` and leaves the store untouched when the game ID or any of
    /// its session keys is already known.
    pub fn insert_game(&self, game: Game) -> bool {
        let game_id = game.id().to_owned();
        let keys: Vec<SessionKey> = game.players().map(|p| p.session_key.clone()).collect();

        let Entry::Vacant(slot) = self.games.entry(game_id.clone()) else {
            return false;
        };
        if keys.iter().any(|key| self.sessions.contains_key(key)) {
            return false;
        }
        for key in keys {
            self.sessions.insert(key, game_id.clone());
        }
        slot.insert(Arc::new(RwLock::new(game)));
        true
    }

    /// Evict every game whose last update is not newer than `cutoff`, returning their IDs.
    pub async fn remove_idle_games(&self, cutoff: SystemTime) -> Vec<GameId> {
        let candidates: Vec<(GameId, GameHandle)> = self
            .games
            .iter()
            .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
            .collect();

        let mut removed = Vec::new();
        for (game_id, handle) in candidates {
            let game = handle.write().await;
            if game.updated_at() > cutoff {
                continue;
            }
            if self
                .games
                .remove_if(&game_id, |_, current| Arc::ptr_eq(current, &handle))
                .is_none()
            {
                continue;
            }
            for player in game.players() {
                self.sessions.remove(&player.session_key);
            }
            removed.push(game_id);
        }
        removed
    }

    /// Number of live games.
    pub fn len(&self) -> usize {
        self.games.len()
    }

    /// Whether no game is live.
    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    /// Draw session keys until one is unused, binding it to `game_id`.
    fn reserve_session_key(&self, game_id: &str) -> SessionKey {
        loop {
            let key = keys::new_session_key(self.session_key_length);
            if let Entry::Vacant(slot) = self.sessions.entry(key.clone()) {
                slot.insert(game_id.to_owned());
                return key;
            }
            debug!(game_id = %game_id, "generated session key already in use; regenerating");
        }
    }
}
