use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI document for Buzz Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::game::create_game,
        crate::routes::game::join_game,
        crate::routes::game::get_status,
        crate::routes::game::buzz,
        crate::routes::game::clear_buzzes,
        crate::routes::game::set_question_number,
        crate::routes::sse::game_stream,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::game::CreateGameRequest,
            crate::dto::game::JoinGameRequest,
            crate::dto::game::SessionRequest,
            crate::dto::game::SetQuestionNumberRequest,
            crate::dto::game::SessionResponse,
            crate::dto::game::MessageResponse,
            crate::dto::game::BuzzResponse,
            crate::dto::game::GameStatus,
            crate::dto::game::PlayerStatus,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "game", description = "Buzzer game operations"),
        (name = "sse", description = "Server-sent events streams"),
    )
)]
pub struct ApiDoc;
