use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use validator::Validate;

use crate::{dto::validation::validate_username, state::keys::MAX_SESSION_KEY_LENGTH};

/// [`MAX_SESSION_KEY_LENGTH`] typed as the validator's length bound expects.
const SESSION_KEY_MAX_LEN: u64 = MAX_SESSION_KEY_LENGTH as u64;

/// Payload used to open a new game.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateGameRequest {
    /// Display name of the creator; surrounding whitespace is ignored.
    #[validate(custom(function = "validate_username"))]
    pub username: String,
}

/// Payload used to enter an existing game.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct JoinGameRequest {
    /// Display name of the joining player; surrounding whitespace is ignored.
    #[validate(custom(function = "validate_username"))]
    pub username: String,
}

/// Credentials handed out by create and join.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    /// Shareable game code.
    pub game_ext_id: String,
    /// Bearer key identifying the player in later requests.
    pub session_key: String,
}

/// Payload carrying only the caller's session key.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SessionRequest {
    /// Key returned by create or join.
    #[validate(length(min = 1, max = SESSION_KEY_MAX_LEN))]
    pub session_key: String,
}

/// Payload used by the creator to change the current question.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SetQuestionNumberRequest {
    /// Creator's session key.
    #[validate(length(min = 1, max = SESSION_KEY_MAX_LEN))]
    pub session_key: String,
    /// Integer, or a string holding an integer.
    #[serde(default)]
    #[schema(value_type = i64)]
    pub q_num: Value,
}

/// Acknowledgement returned by mutating routes.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    /// Human-readable outcome.
    pub message: String,
}

impl MessageResponse {
    /// Wrap a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Result of a buzz, with the caller's position in the buzz order.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BuzzResponse {
    /// `Buzzed` or `Already buzzed`.
    pub message: String,
    /// Zero-based arrival rank.
    pub buzz_order: i64,
}

/// Read-only view of a game as shown to its players.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GameStatus {
    /// Shareable game code.
    pub game_id: String,
    /// Current question number.
    pub q_num: i64,
    /// RFC 3339 timestamp of the last mutation.
    pub updated_at: String,
    /// Players in join order.
    pub player_list: Vec<PlayerStatus>,
}

/// One roster entry of [`GameStatus`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PlayerStatus {
    /// Display name.
    pub username: String,
    /// Whether this player created the game.
    pub is_creator: bool,
    /// Zero-based arrival rank since the last clear, `-1` when not buzzed.
    pub buzz_order: i64,
}

/// Query string of the SSE route.
#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    /// Session key of a player of the streamed game.
    pub session_key: String,
}
