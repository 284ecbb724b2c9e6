use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Player record persisted alongside its game.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerEntity {
    /// Bearer session key issued on create/join.
    pub session_key: String,
    /// Trimmed display name, unique within the game.
    pub username: String,
    /// Whether this player created the game.
    pub is_creator: bool,
}

/// Aggregate game entity persisted by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameEntity {
    /// External game identifier (primary key).
    pub id: String,
    /// Current question number.
    pub question_number: i64,
    /// Players in join order.
    pub players: Vec<PlayerEntity>,
    /// Session keys in buzz arrival order.
    pub buzz_order: Vec<String>,
    /// Creation timestamp for auditing/debugging.
    pub created_at: SystemTime,
    /// Last time the game entity was updated.
    pub updated_at: SystemTime,
}
