//! Live match observation records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single observation of an in-progress match.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LiveMatch {
    /// Tracked account the observation belongs to
    pub account_id: u64,

    /// When the observation was made
    pub observed_at: DateTime<Utc>,

    /// Game mode label from the spectate page
    pub game_mode: String,

    /// Champion the account is playing, normalized
    pub champion: String,

    /// First summoner spell
    pub spell_one: String,

    /// Second summoner spell
    pub spell_two: String,
}

impl LiveMatch {
    /// Whether two observations describe the same match content.
    ///
    /// The page exposes no match identifier, so equality of mode, champion
    /// and both spells is the strongest identity signal available.
    pub fn same_content(&self, other: &LiveMatch) -> bool {
        self.game_mode == other.game_mode
            && self.champion == other.champion
            && self.spell_one == other.spell_one
            && self.spell_two == other.spell_two
    }
}
