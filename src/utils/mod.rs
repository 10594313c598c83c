//! Utility functions and helpers.

pub mod http;
pub mod names;

pub use names::{is_valid_champion, normalize_champion};
