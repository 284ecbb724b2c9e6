use std::{collections::HashSet, time::SystemTime};

use indexmap::{IndexMap, IndexSet};
use serde_json::Value;
use thiserror::Error;

use crate::dao::models::{GameEntity, PlayerEntity};

/// External identifier of a game (uppercase letters, shared between players).
pub type GameId = String;
/// Bearer credential identifying one player of one game.
pub type SessionKey = String;

/// Question number assigned to freshly created games.
pub const INITIAL_QUESTION_NUMBER: i64 = 1;
/// Longest accepted username, counted in characters after trimming.
pub const MAX_USERNAME_CHARS: usize = 64;

/// Failures produced by the game session engine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GameError {
    /// No game is registered under the requested identifier.
    #[error("game `{0}` not found")]
    GameNotFound(GameId),
    /// The session key is unknown or does not belong to the requested game.
    #[error("invalid session")]
    InvalidSession,
    /// The session is not allowed to perform the operation.
    #[error("unauthorized")]
    Unauthorized,
    /// A supplied value (username, question number) is malformed.
    #[error("invalid value: {0}")]
    InvalidValue(String),
}

/// Player registered in a game, identified by its session key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    /// Session key handed to the player on create/join.
    pub session_key: SessionKey,
    /// Trimmed display name, unique within the game.
    pub username: String,
    /// Whether this player created the game.
    pub is_creator: bool,
}

/// In-memory state of a single buzzer game.
///
/// Mutations go through methods so the roster and buzz order stay consistent:
/// every buzzed key belongs to a player and appears at most once.
#[derive(Debug, Clone)]
pub struct Game {
    id: GameId,
    question_number: i64,
    players: IndexMap<SessionKey, Player>,
    buzz_order: IndexSet<SessionKey>,
    created_at: SystemTime,
    updated_at: SystemTime,
}

impl Game {
    /// Build a new game owned by `creator`, starting at question one with no buzzes.
    pub fn new(id: GameId, creator_key: SessionKey, creator_name: String) -> Self {
        let now = SystemTime::now();
        let creator = Player {
            session_key: creator_key.clone(),
            username: creator_name,
            is_creator: true,
        };
        let mut players = IndexMap::new();
        players.insert(creator_key, creator);

        Self {
            id,
            question_number: INITIAL_QUESTION_NUMBER,
            players,
            buzz_order: IndexSet::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Shareable game code.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current question number.
    pub fn question_number(&self) -> i64 {
        self.question_number
    }

    /// Time of the last mutation; drives idle expiry.
    pub fn updated_at(&self) -> SystemTime {
        self.updated_at
    }

    /// Players in join order.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    /// Player holding `session_key`, if any.
    pub fn player(&self, session_key: &str) -> Option<&Player> {
        self.players.get(session_key)
    }

    /// Player registered under an already normalized username.
    pub fn player_by_username(&self, username: &str) -> Option<&Player> {
        self.players.values().find(|player| player.username == username)
    }

    /// Session keys in buzz arrival order.
    pub fn buzz_order(&self) -> impl Iterator<Item = &SessionKey> {
        self.buzz_order.iter()
    }

    /// Zero-based arrival rank of the player's buzz since the last clear.
    pub fn buzz_rank(&self, session_key: &str) -> Option<usize> {
        self.buzz_order.get_index_of(session_key)
    }

    /// Register a non-creator player. The caller guarantees the key and username are fresh.
    pub(crate) fn add_player(&mut self, session_key: SessionKey, username: String) -> Player {
        let player = Player {
            session_key: session_key.clone(),
            username,
            is_creator: false,
        };
        self.players.insert(session_key, player.clone());
        self.touch();
        player
    }

    /// Append the player's buzz unless it is already recorded.
    ///
    /// Returns `true` when the buzz order changed.
    pub fn record_buzz(&mut self, session_key: &str) -> Result<bool, GameError> {
        if !self.players.contains_key(session_key) {
            return Err(GameError::InvalidSession);
        }
        if self.buzz_order.contains(session_key) {
            return Ok(false);
        }
        self.buzz_order.insert(session_key.to_owned());
        self.touch();
        Ok(true)
    }

    /// Forget every buzz; players and question number are left untouched.
    pub fn clear_buzzes(&mut self) {
        self.buzz_order.clear();
        self.touch();
    }

    /// Replace the question number; buzzes are kept.
    pub fn set_question_number(&mut self, value: i64) {
        self.question_number = value;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = SystemTime::now();
    }
}

/// Trim a username and reject empty or overlong results.
pub fn normalize_username(raw: &str) -> Result<String, GameError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(GameError::InvalidValue("username must not be empty".into()));
    }
    if trimmed.chars().count() > MAX_USERNAME_CHARS {
        return Err(GameError::InvalidValue(format!(
            "username must be at most {MAX_USERNAME_CHARS} characters"
        )));
    }
    Ok(trimmed.to_owned())
}

/// Interpret a JSON question number.
///
/// Integers and integral floats are accepted, as are strings holding an integer
/// (surrounding whitespace ignored). Anything else is an [`GameError::InvalidValue`].
pub fn parse_question_number(raw: &Value) -> Result<i64, GameError> {
    let invalid = || GameError::InvalidValue(format!("`{raw}` is not an integer question number"));

    match raw {
        Value::Number(number) => {
            if let Some(value) = number.as_i64() {
                return Ok(value);
            }
            match number.as_f64() {
                Some(value)
                    if value.fract() == 0.0
                        && value >= i64::MIN as f64
                        && value < i64::MAX as f64 =>
                {
                    Ok(value as i64)
                }
                _ => Err(invalid()),
            }
        }
        Value::String(text) => text.trim().parse::<i64>().map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

impl From<&Game> for GameEntity {
    fn from(game: &Game) -> Self {
        Self {
            id: game.id.clone(),
            question_number: game.question_number,
            players: game
                .players
                .values()
                .map(|player| PlayerEntity {
                    session_key: player.session_key.clone(),
                    username: player.username.clone(),
                    is_creator: player.is_creator,
                })
                .collect(),
            buzz_order: game.buzz_order.iter().cloned().collect(),
            created_at: game.created_at,
            updated_at: game.updated_at,
        }
    }
}

/// Reasons a persisted game cannot be restored into memory.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RestoreError {
    /// Not exactly one player is flagged as creator.
    #[error("game `{0}` must have exactly one creator (found {1})")]
    CreatorCount(GameId, usize),
    /// The same session key appears twice in the roster.
    #[error("game `{0}` lists session key more than once")]
    DuplicateSession(GameId),
    /// Two players share a username.
    #[error("game `{0}` has duplicate username `{1}`")]
    DuplicateUsername(GameId, String),
    /// The buzz order names a stranger or repeats a player.
    #[error("game `{0}` buzz order references an unknown or repeated session")]
    InvalidBuzzOrder(GameId),
}

impl TryFrom<GameEntity> for Game {
    type Error = RestoreError;

    fn try_from(entity: GameEntity) -> Result<Self, Self::Error> {
        let id = entity.id;

        let creators = entity.players.iter().filter(|p| p.is_creator).count();
        if creators != 1 {
            return Err(RestoreError::CreatorCount(id, creators));
        }

        let mut usernames = HashSet::new();
        let mut players = IndexMap::with_capacity(entity.players.len());
        for player in entity.players {
            if !usernames.insert(player.username.clone()) {
                return Err(RestoreError::DuplicateUsername(id, player.username));
            }
            let previous = players.insert(
                player.session_key.clone(),
                Player {
                    session_key: player.session_key,
                    username: player.username,
                    is_creator: player.is_creator,
                },
            );
            if previous.is_some() {
                return Err(RestoreError::DuplicateSession(id));
            }
        }

        let mut buzz_order = IndexSet::with_capacity(entity.buzz_order.len());
        for key in entity.buzz_order {
            if !players.contains_key(&key) || !buzz_order.insert(key) {
                return Err(RestoreError::InvalidBuzzOrder(id));
            }
        }

        Ok(Self {
            id,
            question_number: entity.question_number,
            players,
            buzz_order,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample_game() -> Game {
        let mut game = Game::new("GAMEABCD".into(), "alice-key".into(), "Alice".into());
        game.add_player("bob-key".into(), "Bob".into());
        game
    }

    #[test]
    fn new_game_has_single_creator_and_no_buzzes() {
        let game = sample_game();
        assert_eq!(game.question_number(), INITIAL_QUESTION_NUMBER);
        assert_eq!(game.players().filter(|p| p.is_creator).count(), 1);
        assert_eq!(game.buzz_order().count(), 0);
        assert!(game.player("alice-key").is_some_and(|p| p.is_creator));
    }

    #[test]
    fn buzz_is_recorded_once() {
        let mut game = sample_game();
        assert_eq!(game.record_buzz("bob-key"), Ok(true));
        assert_eq!(game.record_buzz("alice-key"), Ok(true));
        assert_eq!(game.record_buzz("bob-key"), Ok(false));
        assert_eq!(game.buzz_rank("bob-key"), Some(0));
        assert_eq!(game.buzz_rank("alice-key"), Some(1));
    }

    #[test]
    fn buzz_from_unknown_session_is_rejected() {
        let mut game = sample_game();
        assert_eq!(game.record_buzz("mallory"), Err(GameError::InvalidSession));
        assert_eq!(game.buzz_order().count(), 0);
    }

    #[test]
    fn clear_keeps_players_and_question() {
        let mut game = sample_game();
        game.set_question_number(4);
        game.record_buzz("bob-key").unwrap();
        game.clear_buzzes();

        assert_eq!(game.buzz_rank("bob-key"), None);
        assert_eq!(game.question_number(), 4);
        assert_eq!(game.players().count(), 2);

        game.record_buzz("alice-key").unwrap();
        assert_eq!(game.buzz_rank("alice-key"), Some(0));
    }

    #[test]
    fn usernames_are_trimmed_and_required() {
        assert_eq!(normalize_username("  Bob \t").unwrap(), "Bob");
        assert!(matches!(
            normalize_username("   "),
            Err(GameError::InvalidValue(_))
        ));
    }

    #[test]
    fn usernames_are_bounded_after_trimming() {
        let longest = "ü".repeat(MAX_USERNAME_CHARS);
        assert_eq!(normalize_username(&format!(" {longest} ")).unwrap(), longest);
        assert!(matches!(
            normalize_username(&"x".repeat(MAX_USERNAME_CHARS + 1)),
            Err(GameError::InvalidValue(_))
        ));
    }

    #[test]
    fn question_numbers_parse_leniently() {
        assert_eq!(parse_question_number(&json!(7)), Ok(7));
        assert_eq!(parse_question_number(&json!(-3)), Ok(-3));
        assert_eq!(parse_question_number(&json!(2.0)), Ok(2));
        assert_eq!(parse_question_number(&json!(" 12 ")), Ok(12));
    }

    #[test]
    fn malformed_question_numbers_are_rejected() {
        for raw in [json!(1.5), json!("two"), json!(null), json!(true), json!([1])] {
            assert!(
                matches!(parse_question_number(&raw), Err(GameError::InvalidValue(_))),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn entity_restore_keeps_order_and_ranks() {
        let mut game = sample_game();
        game.record_buzz("bob-key").unwrap();
        game.set_question_number(3);

        let restored = Game::try_from(GameEntity::from(&game)).unwrap();
        assert_eq!(restored.id(), "GAMEABCD");
        assert_eq!(restored.question_number(), 3);
        assert_eq!(restored.buzz_rank("bob-key"), Some(0));
        let names: Vec<_> = restored.players().map(|p| p.username.as_str()).collect();
        assert_eq!(names, ["Alice", "Bob"]);
    }

    #[test]
    fn entity_with_foreign_buzz_is_refused() {
        let mut entity = GameEntity::from(&sample_game());
        entity.buzz_order.push("ghost".into());
        assert_eq!(
            Game::try_from(entity).unwrap_err(),
            RestoreError::InvalidBuzzOrder("GAMEABCD".into())
        );
    }

    #[test]
    fn entity_without_creator_is_refused() {
        let mut entity = GameEntity::from(&sample_game());
        for player in &mut entity.players {
            player.is_creator = false;
        }
        assert!(matches!(
            Game::try_from(entity),
            Err(RestoreError::CreatorCount(_, 0))
        ));
    }
}
