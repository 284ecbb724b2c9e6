//! Buzzer game operations: create, join, buzz, clear and question changes.

use std::ops::Deref;

use serde_json::Value;
use tokio::sync::RwLockWriteGuard;
use tracing::{debug, info};

use crate::{
    dto::game::{BuzzResponse, MessageResponse, SessionResponse},
    error::ServiceError,
    services::{
        public_service::{project, rank_value},
        sse_events,
    },
    state::{
        SharedState,
        auth::{Authorized, authorize},
        game::{Game, GameError, parse_question_number},
        store::GameHandle,
    },
};

/// Open a new game owned by `username` and return the creator's credentials.
pub async fn create_game(
    state: &SharedState,
    username: &str,
) -> Result<SessionResponse, ServiceError> {
    let created = state.sessions().create_game(username)?;
    info!(game_id = %created.game_id, "game created");
    state.mark_dirty(&created.game_id);

    Ok(SessionResponse {
        game_ext_id: created.game_id,
        session_key: created.creator.session_key,
    })
}

/// Enter `game_id` as `username`, reusing the session of an existing player with that name.
pub async fn join_game(
    state: &SharedState,
    game_id: &str,
    username: &str,
) -> Result<SessionResponse, ServiceError> {
    let joined = state.sessions().add_player(game_id, username).await?;

    if joined.is_new {
        info!(game_id = %game_id, "player joined game");
        if let Ok(handle) = state.sessions().game(game_id) {
            publish_change(state, handle.read().await);
        }
    } else {
        debug!(game_id = %game_id, "username already present; returning existing session");
    }

    Ok(SessionResponse {
        game_ext_id: game_id.to_owned(),
        session_key: joined.player.session_key,
    })
}

/// Record the caller's buzz. A repeated buzz keeps the original rank.
pub async fn buzz(
    state: &SharedState,
    game_id: &str,
    session_key: &str,
) -> Result<BuzzResponse, ServiceError> {
    let authorized = authorize_player(state, game_id, session_key, false).await?;

    let mut game = lock_live(state, game_id, &authorized.game).await?;
    let recorded = game.record_buzz(session_key)?;
    let rank = rank_value(game.buzz_rank(session_key));
    if recorded {
        debug!(game_id = %game_id, rank, "buzz recorded");
        publish_change(state, game);
    }

    let message = if recorded { "Buzzed" } else { "Already buzzed" };
    Ok(BuzzResponse {
        message: message.into(),
        buzz_order: rank,
    })
}

/// Forget every buzz of the game. Creator only.
pub async fn clear_buzzes(
    state: &SharedState,
    game_id: &str,
    session_key: &str,
) -> Result<MessageResponse, ServiceError> {
    let authorized = authorize_player(state, game_id, session_key, true).await?;

    let mut game = lock_live(state, game_id, &authorized.game).await?;
    game.clear_buzzes();
    debug!(game_id = %game_id, "buzzes cleared");
    publish_change(state, game);

    Ok(MessageResponse::new("Buzzes cleared"))
}

/// Change the current question number. Creator only.
pub async fn set_question_number(
    state: &SharedState,
    game_id: &str,
    session_key: &str,
    raw: &Value,
) -> Result<MessageResponse, ServiceError> {
    let authorized = authorize_player(state, game_id, session_key, true).await?;
    let value = parse_question_number(raw)?;

    let mut game = lock_live(state, game_id, &authorized.game).await?;
    game.set_question_number(value);
    debug!(game_id = %game_id, q_num = value, "question number updated");
    publish_change(state, game);

    Ok(MessageResponse::new("Question number updated"))
}

/// Run the authorization gate for an operation on `game_id`.
///
/// Unknown games surface as not found; every other rejection is the same
/// opaque unauthorized error.
pub(crate) async fn authorize_player(
    state: &SharedState,
    game_id: &str,
    session_key: &str,
    require_creator: bool,
) -> Result<Authorized, ServiceError> {
    state.sessions().game(game_id)?;

    authorize(state.sessions(), session_key, Some(game_id), require_creator)
        .await
        .map_err(|_| {
            if require_creator {
                GameError::Unauthorized
            } else {
                GameError::InvalidSession
            }
        })
        .map_err(ServiceError::from)
}

/// Take the game's write lock, failing if the game was evicted after the gate passed.
async fn lock_live<'a>(
    state: &SharedState,
    game_id: &str,
    game: &'a GameHandle,
) -> Result<RwLockWriteGuard<'a, Game>, ServiceError> {
    let guard = game.write().await;
    if !state.sessions().is_live(game_id, game) {
        return Err(GameError::GameNotFound(game_id.to_owned()).into());
    }
    Ok(guard)
}

/// Broadcast the new status while the lock is still held, then queue the game for storage.
fn publish_change(state: &SharedState, guard: impl Deref<Target = Game>) {
    sse_events::broadcast_status(state, &project(&*guard));
    let game_id = guard.id().to_owned();
    drop(guard);
    state.mark_dirty(&game_id);
}
