/// CouchDB backend.
#[cfg(feature = "couch-store")]
pub mod couchdb;
/// MongoDB backend.
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::models::GameEntity;
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;

/// Abstraction over the persistence layer shadowing the in-memory games.
pub trait GameStore: Send + Sync {
    /// Insert or replace the stored copy of a game.
    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Every stored game, used to repopulate memory at startup.
    fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>>;
    /// Remove a game; `false` when nothing was stored under `id`.
    fn delete_game(&self, id: String) -> BoxFuture<'static, StorageResult<bool>>;
    /// Cheap round trip proving the backend is reachable.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Re-establish the connection after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
