//! Session key checks shared by every authenticated operation.

use thiserror::Error;
use tracing::debug;

use super::{
    game::Player,
    store::{GameHandle, SessionStore},
};

/// Opaque denial; the cause is only logged, never reported to the caller.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("unauthorized")]
pub struct Unauthorized;

/// A session key that passed the gate, with the game it belongs to.
pub struct Authorized {
    /// Handle of the caller's game.
    pub game: GameHandle,
    /// The caller, as registered in that game.
    pub player: Player,
}

/// Resolve `session_key` to its player, optionally requiring it to belong to
/// `game_id` and to be the game creator.
pub async fn authorize(
    store: &SessionStore,
    session_key: &str,
    game_id: Option<&str>,
    require_creator: bool,
) -> Result<Authorized, Unauthorized> {
    let Some(owner) = store.session_game(session_key) else {
        return deny(game_id, "unknown session key");
    };

    if let Some(requested) = game_id
        && !owner.eq_ignore_ascii_case(requested)
    {
        return deny(game_id, "session key belongs to another game");
    }

    let Ok(game) = store.game(&owner) else {
        return deny(game_id, "game of session key no longer exists");
    };

    let player = game.read().await.player(session_key).cloned();
    let Some(player) = player else {
        return deny(game_id, "session key missing from game roster");
    };

    if require_creator && !player.is_creator {
        return deny(game_id, "creator privilege required");
    }

    Ok(Authorized { game, player })
}

fn deny<T>(game_id: Option<&str>, reason: &'static str) -> Result<T, Unauthorized> {
    debug!(game_id = game_id.unwrap_or("-"), reason, "session rejected");
    Err(Unauthorized)
}
