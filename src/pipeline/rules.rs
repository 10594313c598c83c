//! Rule evaluation against live matches.

use std::sync::Arc;

use crate::error::Result;
use crate::models::LiveMatch;
use crate::storage::WatchStore;

/// A rule hit for a live match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Normalized champion name that matched
    pub champion: String,

    /// Penalty weight of the matching rule
    pub weight: u32,
}

/// Evaluates live matches against the active rule set.
///
/// The engine only reads; rule activation and retirement happen through
/// the store's administrative operations.
pub struct RuleEngine {
    store: Arc<dyn WatchStore>,
}

impl RuleEngine {
    pub fn new(store: Arc<dyn WatchStore>) -> Self {
        Self { store }
    }

    /// Check the observation's champion against the active rules.
    ///
    /// Champion names are stored normalized, so the lookup is a direct
    /// key comparison.
    pub async fn evaluate(&self, observed: &LiveMatch) -> Result<Option<Violation>> {
        let rule = self.store.active_rule_for(&observed.champion).await?;
        Ok(rule.map(|rule| Violation {
            champion: rule.champion,
            weight: rule.weight,
        }))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::models::RuleKey;
    use crate::storage::MemoryStore;

    fn observation(champion: &str) -> LiveMatch {
        LiveMatch {
            account_id: 1,
            observed_at: Utc::now(),
            game_mode: "Summoner's Rift".to_string(),
            champion: champion.to_string(),
            spell_one: "Flash".to_string(),
            spell_two: "Ignite".to_string(),
        }
    }

    #[tokio::test]
    async fn test_active_rule_yields_violation() {
        let store = Arc::new(MemoryStore::new());
        store.insert_rule("Teemo", 3).await.unwrap();

        let engine = RuleEngine::new(store);
        let violation = engine.evaluate(&observation("teemo")).await.unwrap();

        assert_eq!(
            violation,
            Some(Violation {
                champion: "teemo".to_string(),
                weight: 3,
            })
        );
    }

    #[tokio::test]
    async fn test_no_rule_yields_none() {
        let store = Arc::new(MemoryStore::new());
        let engine = RuleEngine::new(store);

        let violation = engine.evaluate(&observation("teemo")).await.unwrap();
        assert!(violation.is_none());
    }

    #[tokio::test]
    async fn test_retired_rule_no_longer_fires() {
        let store = Arc::new(MemoryStore::new());
        store.insert_rule("teemo", 1).await.unwrap();
        store
            .retire_rule(&RuleKey::Champion("teemo".to_string()))
            .await
            .unwrap();

        let engine = RuleEngine::new(store);
        let violation = engine.evaluate(&observation("teemo")).await.unwrap();
        assert!(violation.is_none());
    }
}
