use std::convert::Infallible;

use axum::{
    Router,
    extract::{Path, Query, State},
    response::sse::{Event, Sse},
    routing::get,
};
use futures::Stream;
use tracing::info;

use crate::{
    dto::{game::StreamQuery, validation::normalize_game_id},
    error::AppError,
    services::sse_service,
    state::SharedState,
};

#[utoipa::path(
    get,
    path = "/sse/{game_id}",
    tag = "sse",
    params(
        ("game_id" = String, Path, description = "Game code, case-insensitive"),
        ("session_key" = String, Query, description = "Session key of a player of the game")
    ),
    responses(
        (status = 200, description = "Stream of `status` events, starting with the current status", content_type = "text/event-stream", body = String),
        (status = 401, description = "Invalid session"),
        (status = 404, description = "Unknown game")
    )
)]
/// Stream the status of a game to one of its players.
pub async fn game_stream(
    State(state): State<SharedState>,
    Path(game_id): Path<String>,
    Query(query): Query<StreamQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let game_id = normalize_game_id(&game_id);
    let (receiver, initial) =
        sse_service::subscribe_game(&state, &game_id, &query.session_key).await?;
    info!(game_id = %game_id, "new game SSE connection");
    Ok(sse_service::to_sse_stream(receiver, initial, game_id))
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/sse/{game_id}", get(game_stream))
}
