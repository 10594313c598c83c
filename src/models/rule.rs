//! Restricted champion rules and citation records.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::utils::normalize_champion;

/// A restriction placed on a champion.
///
/// At most one rule per champion is active at any time; retired rules stay
/// in the store as history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChampionRule {
    /// Store-assigned identifier
    pub id: u64,

    /// Normalized champion name the rule applies to
    pub champion: String,

    /// Penalty weight charged per violation
    pub weight: u32,

    /// Whether the rule is currently in force
    pub is_active: bool,

    /// When the rule was created
    pub created_at: DateTime<Utc>,

    /// When the rule was retired, if it ever was
    pub closed_at: Option<DateTime<Utc>>,
}

/// Selects a rule for administration, by id or by champion name.
///
/// Parsed from operator input: an all-digit token is an id, anything else
/// is a champion name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleKey {
    Id(u64),
    Champion(String),
}

impl RuleKey {
    /// Whether this key selects the given rule.
    ///
    /// Champion names are normalized before the comparison, so any spelling
    /// of the name selects the same rule.
    pub fn selects(&self, rule: &ChampionRule) -> bool {
        match self {
            RuleKey::Id(id) => rule.id == *id,
            RuleKey::Champion(name) => rule.champion == normalize_champion(name),
        }
    }
}

impl FromStr for RuleKey {
    type Err = AppError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(AppError::invalid_parameter(
                "rule id or champion name is empty",
            ));
        }
        match trimmed.parse::<u64>() {
            Ok(id) => Ok(RuleKey::Id(id)),
            Err(_) => Ok(RuleKey::Champion(trimmed.to_string())),
        }
    }
}

/// A recorded rule violation.
///
/// Written once per alerted match; the leaderboard is an aggregation over
/// these records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Citation {
    /// Store-assigned identifier
    pub id: u64,

    /// Account the citation was issued against
    pub account_id: u64,

    /// Champion that triggered the rule
    pub champion: String,

    /// Weight copied from the rule at issue time
    pub weight: u32,

    /// When the violation was recorded
    pub issued_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(id: u64, champion: &str) -> ChampionRule {
        ChampionRule {
            id,
            champion: champion.to_string(),
            weight: 1,
            is_active: true,
            created_at: Utc::now(),
            closed_at: None,
        }
    }

    #[test]
    fn test_rule_key_parses_digits_as_id() {
        assert_eq!("12".parse::<RuleKey>().unwrap(), RuleKey::Id(12));
        assert_eq!(" 3 ".parse::<RuleKey>().unwrap(), RuleKey::Id(3));
    }

    #[test]
    fn test_rule_key_parses_anything_else_as_champion() {
        assert_eq!(
            "Rek'Sai".parse::<RuleKey>().unwrap(),
            RuleKey::Champion("Rek'Sai".to_string())
        );
    }

    #[test]
    fn test_rule_key_rejects_empty_input() {
        let err = "   ".parse::<RuleKey>().unwrap_err();
        assert!(matches!(err, AppError::InvalidParameter(_)));
    }

    #[test]
    fn test_rule_key_selects_by_id_or_normalized_name() {
        let teemo = rule(4, "teemo");
        assert!(RuleKey::Id(4).selects(&teemo));
        assert!(!RuleKey::Id(5).selects(&teemo));

        let reksai = rule(6, "reksai");
        assert!(RuleKey::Champion("Rek'Sai".to_string()).selects(&reksai));
        assert!(!RuleKey::Champion("Teemo".to_string()).selects(&reksai));
    }
}
