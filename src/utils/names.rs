// src/utils/names.rs

//! Champion name helpers.

/// Normalize a champion name for comparison and storage.
///
/// Keeps alphabetic characters only and lowercases them, so "Rek'Sai",
/// "reksai" and "REKSAI" all normalize to the same key.
pub fn normalize_champion(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphabetic())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Whether a raw champion string has anything left after normalization.
pub fn is_valid_champion(raw: &str) -> bool {
    raw.chars().any(char::is_alphabetic)
}
