//! Validation helpers for DTOs.

use validator::ValidationError;

use crate::state::game::MAX_USERNAME_CHARS;

/// Validates that a username is non-blank and at most [`MAX_USERNAME_CHARS`] long once trimmed.
///
/// # Examples
///
/// ```ignore
/// validate_username("Alice")   // Ok
/// validate_username("   ")     // Err - blank
/// ```
pub fn validate_username(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        let mut err = ValidationError::new("username_blank");
        err.message = Some("Username must not be empty".into());
        return Err(err);
    }

    let chars = trimmed.chars().count();
    if chars > MAX_USERNAME_CHARS {
        let mut err = ValidationError::new("username_length");
        err.message = Some(
            format!("Username must be at most {MAX_USERNAME_CHARS} characters (got {chars})")
                .into(),
        );
        return Err(err);
    }

    Ok(())
}

/// Trim and uppercase a game ID taken from a request path.
pub fn normalize_game_id(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}
