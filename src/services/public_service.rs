//! Read-only projections of a game, as shown to its players.

use crate::{
    dto::{
        format_system_time,
        game::{GameStatus, PlayerStatus},
    },
    error::ServiceError,
    services::game_service::authorize_player,
    state::{SharedState, game::Game},
};

/// Rank reported for players who have not buzzed since the last clear.
pub const NOT_BUZZED: i64 = -1;

/// Derive the status view of a game. Callers hold the game's lock so the view is consistent.
pub fn project(game: &Game) -> GameStatus {
    let player_list = game
        .players()
        .map(|player| PlayerStatus {
            username: player.username.clone(),
            is_creator: player.is_creator,
            buzz_order: rank_value(game.buzz_rank(&player.session_key)),
        })
        .collect();

    GameStatus {
        game_id: game.id().to_owned(),
        q_num: game.question_number(),
        updated_at: format_system_time(game.updated_at()),
        player_list,
    }
}

/// Wire representation of an optional buzz rank.
pub fn rank_value(rank: Option<usize>) -> i64 {
    rank.and_then(|rank| i64::try_from(rank).ok()).unwrap_or(NOT_BUZZED)
}

/// Return the status of a game to one of its players.
pub async fn get_status(
    state: &SharedState,
    game_id: &str,
    session_key: &str,
) -> Result<GameStatus, ServiceError> {
    let authorized = authorize_player(state, game_id, session_key, false).await?;
    let game = authorized.game.read().await;
    Ok(project(&game))
}
