use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};
use validator::Validate;

use crate::{
    dto::{
        game::{
            BuzzResponse, CreateGameRequest, GameStatus, JoinGameRequest, MessageResponse,
            SessionRequest, SessionResponse, SetQuestionNumberRequest,
        },
        validation::normalize_game_id,
    },
    error::AppError,
    services::{game_service, public_service},
    state::SharedState,
};

/// Routes driving a buzzer game.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/create", post(create_game))
        .route("/api/{game_id}", post(get_status))
        .route("/api/{game_id}/join", post(join_game))
        .route("/api/{game_id}/buzz", post(buzz))
        .route("/api/{game_id}/clearbuzz", post(clear_buzzes))
        .route("/api/{game_id}/set_q_num", post(set_question_number))
}

/// Open a new game; the caller becomes its creator.
#[utoipa::path(
    post,
    path = "/api/create",
    tag = "game",
    request_body = CreateGameRequest,
    responses(
        (status = 200, description = "Game created", body = SessionResponse),
        (status = 400, description = "Invalid username", body = MessageResponse)
    )
)]
pub async fn create_game(
    State(state): State<SharedState>,
    Json(payload): Json<CreateGameRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    payload.validate()?;
    let session = game_service::create_game(&state, &payload.username).await?;
    Ok(Json(session))
}

/// Join an existing game, or recover the session of an existing username.
#[utoipa::path(
    post,
    path = "/api/{game_id}/join",
    tag = "game",
    params(("game_id" = String, Path, description = "Game code, case-insensitive")),
    request_body = JoinGameRequest,
    responses(
        (status = 200, description = "Joined game", body = SessionResponse),
        (status = 400, description = "Invalid username", body = MessageResponse),
        (status = 404, description = "Unknown game", body = MessageResponse)
    )
)]
pub async fn join_game(
    State(state): State<SharedState>,
    Path(game_id): Path<String>,
    Json(payload): Json<JoinGameRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    payload.validate()?;
    let game_id = normalize_game_id(&game_id);
    let session = game_service::join_game(&state, &game_id, &payload.username).await?;
    Ok(Json(session))
}

/// Current status of the game as seen by one of its players.
#[utoipa::path(
    post,
    path = "/api/{game_id}",
    tag = "game",
    params(("game_id" = String, Path, description = "Game code, case-insensitive")),
    request_body = SessionRequest,
    responses(
        (status = 200, description = "Game status", body = GameStatus),
        (status = 401, description = "Invalid session", body = MessageResponse),
        (status = 404, description = "Unknown game", body = MessageResponse)
    )
)]
pub async fn get_status(
    State(state): State<SharedState>,
    Path(game_id): Path<String>,
    Json(payload): Json<SessionRequest>,
) -> Result<Json<GameStatus>, AppError> {
    payload.validate()?;
    let game_id = normalize_game_id(&game_id);
    let status = public_service::get_status(&state, &game_id, &payload.session_key).await?;
    Ok(Json(status))
}

/// Buzz in; the answer carries the caller's arrival rank.
#[utoipa::path(
    post,
    path = "/api/{game_id}/buzz",
    tag = "game",
    params(("game_id" = String, Path, description = "Game code, case-insensitive")),
    request_body = SessionRequest,
    responses(
        (status = 200, description = "Buzz recorded or already present", body = BuzzResponse),
        (status = 401, description = "Invalid session", body = MessageResponse),
        (status = 404, description = "Unknown game", body = MessageResponse)
    )
)]
pub async fn buzz(
    State(state): State<SharedState>,
    Path(game_id): Path<String>,
    Json(payload): Json<SessionRequest>,
) -> Result<Json<BuzzResponse>, AppError> {
    payload.validate()?;
    let game_id = normalize_game_id(&game_id);
    let response = game_service::buzz(&state, &game_id, &payload.session_key).await?;
    Ok(Json(response))
}

/// Reset the buzz order. Creator only.
#[utoipa::path(
    post,
    path = "/api/{game_id}/clearbuzz",
    tag = "game",
    params(("game_id" = String, Path, description = "Game code, case-insensitive")),
    request_body = SessionRequest,
    responses(
        (status = 200, description = "Buzzes cleared", body = MessageResponse),
        (status = 401, description = "Invalid session or not the creator", body = MessageResponse),
        (status = 404, description = "Unknown game", body = MessageResponse)
    )
)]
pub async fn clear_buzzes(
    State(state): State<SharedState>,
    Path(game_id): Path<String>,
    Json(payload): Json<SessionRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    payload.validate()?;
    let game_id = normalize_game_id(&game_id);
    let response = game_service::clear_buzzes(&state, &game_id, &payload.session_key).await?;
    Ok(Json(response))
}

/// Change the current question number. Creator only.
#[utoipa::path(
    post,
    path = "/api/{game_id}/set_q_num",
    tag = "game",
    params(("game_id" = String, Path, description = "Game code, case-insensitive")),
    request_body = SetQuestionNumberRequest,
    responses(
        (status = 200, description = "Question number updated", body = MessageResponse),
        (status = 400, description = "Question number is not an integer", body = MessageResponse),
        (status = 401, description = "Invalid session or not the creator", body = MessageResponse),
        (status = 404, description = "Unknown game", body = MessageResponse)
    )
)]
pub async fn set_question_number(
    State(state): State<SharedState>,
    Path(game_id): Path<String>,
    Json(payload): Json<SetQuestionNumberRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    payload.validate()?;
    let game_id = normalize_game_id(&game_id);
    let response = game_service::set_question_number(
        &state,
        &game_id,
        &payload.session_key,
        &payload.q_num,
    )
    .await?;
    Ok(Json(response))
}
