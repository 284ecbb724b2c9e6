//! Random identifier generation for game IDs and session keys.

use rand::{Rng, distr::Alphanumeric};

/// Smallest game ID length accepted from configuration.
pub const MIN_GAME_ID_LENGTH: usize = 8;
/// Smallest session key length accepted from configuration.
pub const MIN_SESSION_KEY_LENGTH: usize = 32;
/// Longest session key issued; request validation rejects anything longer.
pub const MAX_SESSION_KEY_LENGTH: usize = 128;

/// Generate a shareable game ID made of uppercase ASCII letters.
///
/// Lengths below [`MIN_GAME_ID_LENGTH`] are raised to the minimum.
pub fn new_game_id(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length.max(MIN_GAME_ID_LENGTH))
        .map(|_| char::from(rng.random_range(b'A'..=b'Z')))
        .collect()
}

/// Generate a bearer session key made of ASCII letters and digits.
///
/// Lengths are clamped to [`MIN_SESSION_KEY_LENGTH`]..=[`MAX_SESSION_KEY_LENGTH`].
pub fn new_session_key(length: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(length.clamp(MIN_SESSION_KEY_LENGTH, MAX_SESSION_KEY_LENGTH))
        .map(char::from)
        .collect()
}
