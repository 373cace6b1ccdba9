//! Internal helpers for input normalization and validation.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation so every operation enforces the same rules.

use unicode_normalization::UnicodeNormalization;

use crate::{EngineError, ResultEngine, ids::GAME_ID_LEN};

pub(crate) const MIN_NAME_LEN: usize = 2;

/// Trim a player name and require at least two characters.
pub(crate) fn normalize_player_name(value: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.chars().count() < MIN_NAME_LEN {
        return Err(EngineError::InvalidName(format!(
            "name must be at least {MIN_NAME_LEN} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Comparison key for player names: trimmed, NFKC-normalized, lowercased.
pub(crate) fn name_key(value: &str) -> String {
    value.trim().nfkc().collect::<String>().to_lowercase()
}

/// Upper-case a typed game code and check its shape.
pub(crate) fn normalize_game_id(value: &str) -> ResultEngine<String> {
    let id = value.trim().to_ascii_uppercase();
    if id.len() != GAME_ID_LEN || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(EngineError::InvalidId(format!(
            "game id must be {GAME_ID_LEN} letters or digits, got '{}'",
            value.trim()
        )));
    }
    Ok(id)
}

/// Trim free text; whitespace-only becomes empty.
pub(crate) fn normalize_text(value: &str) -> String {
    value.trim().to_string()
}
