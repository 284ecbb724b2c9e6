use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::state::{auth::Unauthorized, game::GameError};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Unauthorized access attempt.
    #[error("unauthorized")]
    Unauthorized,
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
}

impl From<GameError> for ServiceError {
    fn from(err: GameError) -> Self {
        match err {
            GameError::GameNotFound(id) => ServiceError::NotFound(format!("game {id}")),
            GameError::InvalidSession | GameError::Unauthorized => ServiceError::Unauthorized,
            GameError::InvalidValue(message) => ServiceError::InvalidInput(message),
        }
    }
}

impl From<Unauthorized> for ServiceError {
    fn from(_: Unauthorized) -> Self {
        ServiceError::Unauthorized
    }
}

impl From<ValidationErrors> for AppError {
    /// Reports field names and rule codes only; rejected values may be credentials.
    fn from(err: ValidationErrors) -> Self {
        let mut fields: Vec<String> = err
            .field_errors()
            .into_iter()
            .map(|(field, errors)| {
                let reasons: Vec<String> = errors
                    .iter()
                    .map(|error| match &error.message {
                        Some(message) => message.to_string(),
                        None => error.code.to_string(),
                    })
                    .collect();
                format!("{field}: {}", reasons.join(", "))
            })
            .collect();
        fields.sort();
        AppError::BadRequest(format!("validation failed: {}", fields.join("; ")))
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Session key rejected; one message for every cause.
    #[error("invalid or unauthorized session")]
    Unauthorized,
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unauthorized => AppError::Unauthorized,
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::NotFound(message) => AppError::NotFound(message),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_failures_share_one_response() {
        let invalid = AppError::from(ServiceError::from(GameError::InvalidSession));
        let denied = AppError::from(ServiceError::from(GameError::Unauthorized));
        assert_eq!(invalid.to_string(), denied.to_string());
        assert_eq!(
            invalid.into_response().status(),
            denied.into_response().status()
        );
    }

    #[test]
    fn validation_message_does_not_echo_session_key() {
        use validator::Validate;

        use crate::dto::game::SessionRequest;

        let secret = "k".repeat(300);
        let request = SessionRequest {
            session_key: secret.clone(),
        };
        let err = AppError::from(request.validate().unwrap_err());
        let message = err.to_string();
        assert!(message.contains("session_key: length"), "{message}");
        assert!(!message.contains(&secret));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn game_errors_map_to_http_statuses() {
        let cases = [
            (GameError::GameNotFound("X".into()), StatusCode::NOT_FOUND),
            (GameError::InvalidValue("bad".into()), StatusCode::BAD_REQUEST),
            (GameError::Unauthorized, StatusCode::UNAUTHORIZED),
        ];
        for (err, status) in cases {
            let response = AppError::from(ServiceError::from(err)).into_response();
            assert_eq!(response.status(), status);
        }
    }
}
