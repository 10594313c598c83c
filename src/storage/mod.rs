//! Persistence for the surveillance roster and its history.
//!
//! Two backends share one trait: `MemoryStore` for tests and short-lived
//! tooling, `JsonStore` for durable single-process deployments.
//!
//! ## JsonStore Directory Structure
//!
//! ```text
//! storage/
//! ├── config.toml      # runtime configuration (read by the CLI)
//! ├── accounts.json    # tracked account roster
//! ├── matches.json     # observed live matches
//! ├── rules.json       # champion restriction rules, active and retired
//! └── citations.json   # issued citations
//! ```

pub mod json;
pub mod memory;

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
    CandidateAccount, ChampionRule, Citation, LiveMatch, Region, RuleKey, TrackedAccount,
};

// Re-export for convenience
pub use json::JsonStore;
pub use memory::MemoryStore;

/// Aggregated citation standing of one account owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitationTotal {
    pub owner_id: u64,
    pub citations: usize,
    pub total_weight: u64,
}

/// Trait for surveillance state backends.
///
/// Champion arguments are normalized internally (lowercased, non-alphabetic
/// characters stripped), so callers may pass display names as scraped.
#[async_trait]
pub trait WatchStore: Send + Sync {
    /// Add an account to the roster and assign its id.
    ///
    /// Fails with `Duplicate` if the name/region pair is already tracked.
    /// The uniqueness check and the insert are a single atomic step.
    async fn insert_account(&self, candidate: CandidateAccount) -> Result<TrackedAccount>;

    /// Whether a name/region pair is already tracked. Name matching is
    /// case-insensitive.
    async fn account_exists(&self, summoner_name: &str, region: Region) -> Result<bool>;

    /// The full roster in registration order.
    async fn all_accounts(&self) -> Result<Vec<TrackedAccount>>;

    /// Remove an account, returning it if it was tracked.
    async fn delete_account(&self, id: u64) -> Result<Option<TrackedAccount>>;

    /// Append an observed live match.
    async fn insert_match(&self, observed: &LiveMatch) -> Result<()>;

    /// The most recently recorded match for an account.
    async fn latest_match_for(&self, account_id: u64) -> Result<Option<LiveMatch>>;

    /// Create an active restriction rule for a champion.
    ///
    /// Fails with `Duplicate` if an active rule for that champion exists,
    /// and with `InvalidParameter` if the name normalizes to nothing.
    /// A retired rule does not block a new one.
    async fn insert_rule(&self, champion: &str, weight: u32) -> Result<ChampionRule>;

    /// The active rule for a champion, if any.
    async fn active_rule_for(&self, champion: &str) -> Result<Option<ChampionRule>>;

    /// Retire the active rule selected by id or champion name, returning it
    /// if one existed. Retired rules stay on record with their closing time;
    /// an already retired rule is never selected.
    async fn retire_rule(&self, key: &RuleKey) -> Result<Option<ChampionRule>>;

    /// All rules, newest first. With `active_only`, retired rules are
    /// filtered out.
    async fn rules(&self, active_only: bool) -> Result<Vec<ChampionRule>>;

    /// Record a citation against an account.
    async fn insert_citation(
        &self,
        account_id: u64,
        champion: &str,
        weight: u32,
    ) -> Result<Citation>;

    /// Citation standings grouped by account owner, heaviest first.
    ///
    /// Citations whose account has left the roster are not counted.
    async fn citation_totals(&self) -> Result<Vec<CitationTotal>>;
}

/// Group citations by owner and sort by total weight descending, owner id
/// ascending on ties.
fn aggregate_citations(accounts: &[TrackedAccount], citations: &[Citation]) -> Vec<CitationTotal> {
    let owners: HashMap<u64, u64> = accounts
        .iter()
        .map(|account| (account.id, account.owner_id))
        .collect();

    let mut totals: HashMap<u64, (usize, u64)> = HashMap::new();
    for citation in citations {
        let Some(owner_id) = owners.get(&citation.account_id) else {
            continue;
        };
        let entry = totals.entry(*owner_id).or_default();
        entry.0 += 1;
        entry.1 += u64::from(citation.weight);
    }

    let mut standings: Vec<CitationTotal> = totals
        .into_iter()
        .map(|(owner_id, (citations, total_weight))| CitationTotal {
            owner_id,
            citations,
            total_weight,
        })
        .collect();
    standings.sort_by(|a, b| {
        b.total_weight
            .cmp(&a.total_weight)
            .then(a.owner_id.cmp(&b.owner_id))
    });
    standings
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn account(id: u64, owner_id: u64) -> TrackedAccount {
        TrackedAccount {
            id,
            owner_id,
            summoner_name: format!("account-{id}"),
            region: Region::Euw,
            profile_url: String::new(),
            registered_at: Utc::now(),
        }
    }

    fn citation(account_id: u64, weight: u32) -> Citation {
        Citation {
            id: 0,
            account_id,
            champion: "teemo".to_string(),
            weight,
            issued_at: Utc::now(),
        }
    }

    #[test]
    fn test_totals_sum_per_owner_across_accounts() {
        let accounts = vec![account(1, 10), account(2, 10), account(3, 20)];
        let citations = vec![citation(1, 2), citation(2, 3), citation(3, 4)];

        let totals = aggregate_citations(&accounts, &citations);
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].owner_id, 10);
        assert_eq!(totals[0].citations, 2);
        assert_eq!(totals[0].total_weight, 5);
        assert_eq!(totals[1].owner_id, 20);
        assert_eq!(totals[1].total_weight, 4);
    }

    #[test]
    fn test_totals_tie_breaks_on_owner_id() {
        let accounts = vec![account(1, 30), account(2, 20)];
        let citations = vec![citation(1, 2), citation(2, 2)];

        let totals = aggregate_citations(&accounts, &citations);
        assert_eq!(totals[0].owner_id, 20);
        assert_eq!(totals[1].owner_id, 30);
    }

    #[test]
    fn test_totals_skip_citations_for_removed_accounts() {
        let accounts = vec![account(1, 10)];
        let citations = vec![citation(1, 1), citation(99, 5)];

        let totals = aggregate_citations(&accounts, &citations);
        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0].total_weight, 1);
    }
}
