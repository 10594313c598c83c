// src/storage/json.rs

//! JSON file store backend.
//!
//! One JSON file per collection under a root directory, rewritten in full
//! after every mutation. Writes go through a temp file plus rename, so a
//! reader never sees a half-written file. Id counters are persisted with
//! their collection; a deleted id is never handed out again.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::models::{
    CandidateAccount, ChampionRule, Citation, LiveMatch, Region, RuleKey, TrackedAccount,
};
use crate::storage::{aggregate_citations, CitationTotal, WatchStore};
use crate::utils::normalize_champion;

const ACCOUNTS_FILE: &str = "accounts.json";
const MATCHES_FILE: &str = "matches.json";
const RULES_FILE: &str = "rules.json";
const CITATIONS_FILE: &str = "citations.json";

/// An id-assigning collection as stored on disk.
#[derive(Debug, Serialize, Deserialize)]
struct Ledger<T> {
    next_id: u64,
    items: Vec<T>,
}

impl<T> Ledger<T> {
    fn new() -> Self {
        Self {
            next_id: 1,
            items: Vec::new(),
        }
    }

    fn take_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

struct Collections {
    accounts: Ledger<TrackedAccount>,
    matches: Vec<LiveMatch>,
    rules: Ledger<ChampionRule>,
    citations: Ledger<Citation>,
}

/// Durable store backend over plain JSON files.
pub struct JsonStore {
    root_dir: PathBuf,
    state: Mutex<Collections>,
}

impl JsonStore {
    /// Open a store rooted at the given directory, creating it and loading
    /// any collections already present.
    pub async fn open(root_dir: impl Into<PathBuf>) -> Result<Self> {
        let root_dir = root_dir.into();
        tokio::fs::create_dir_all(&root_dir).await?;

        let accounts = read_json(&root_dir.join(ACCOUNTS_FILE))
            .await?
            .unwrap_or_else(Ledger::new);
        let matches = read_json(&root_dir.join(MATCHES_FILE))
            .await?
            .unwrap_or_default();
        let rules = read_json(&root_dir.join(RULES_FILE))
            .await?
            .unwrap_or_else(Ledger::new);
        let citations = read_json(&root_dir.join(CITATIONS_FILE))
            .await?
            .unwrap_or_else(Ledger::new);

        Ok(Self {
            root_dir,
            state: Mutex::new(Collections {
                accounts,
                matches,
                rules,
                citations,
            }),
        })
    }

    fn path(&self, name: &str) -> PathBuf {
        self.root_dir.join(name)
    }
}

/// Read a JSON file, returning None if it doesn't exist.
async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(AppError::Io(e)),
    }
}

/// Write JSON atomically (write to temp, then rename).
async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value)?;

    let tmp = path.with_extension("tmp");
    let mut file = tokio::fs::File::create(&tmp).await?;
    file.write_all(&bytes).await?;
    file.flush().await?;
    drop(file);

    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

#[async_trait]
impl WatchStore for JsonStore {
    async fn insert_account(&self, candidate: CandidateAccount) -> Result<TrackedAccount> {
        let mut state = self.state.lock().await;

        let key = TrackedAccount::identity_key(&candidate.summoner_name, candidate.region);
        let taken = state.accounts.items.iter().any(|account| {
            TrackedAccount::identity_key(&account.summoner_name, account.region) == key
        });
        if taken {
            return Err(AppError::duplicate(format!(
                "{} ({}) is already tracked",
                candidate.summoner_name, candidate.region
            )));
        }

        let account = TrackedAccount {
            id: state.accounts.take_id(),
            owner_id: candidate.owner_id,
            summoner_name: candidate.summoner_name,
            region: candidate.region,
            profile_url: candidate.profile_url,
            registered_at: Utc::now(),
        };
        state.accounts.items.push(account.clone());
        write_json(&self.path(ACCOUNTS_FILE), &state.accounts).await?;
        Ok(account)
    }

    async fn account_exists(&self, summoner_name: &str, region: Region) -> Result<bool> {
        let state = self.state.lock().await;
        let key = TrackedAccount::identity_key(summoner_name, region);
        Ok(state.accounts.items.iter().any(|account| {
            TrackedAccount::identity_key(&account.summoner_name, account.region) == key
        }))
    }

    async fn all_accounts(&self) -> Result<Vec<TrackedAccount>> {
        let state = self.state.lock().await;
        Ok(state.accounts.items.clone())
    }

    async fn delete_account(&self, id: u64) -> Result<Option<TrackedAccount>> {
        let mut state = self.state.lock().await;
        let position = state
            .accounts
            .items
            .iter()
            .position(|account| account.id == id);
        let Some(index) = position else {
            return Ok(None);
        };

        let removed = state.accounts.items.remove(index);
        write_json(&self.path(ACCOUNTS_FILE), &state.accounts).await?;
        Ok(Some(removed))
    }

    async fn insert_match(&self, observed: &LiveMatch) -> Result<()> {
        let mut state = self.state.lock().await;
        state.matches.push(observed.clone());
        write_json(&self.path(MATCHES_FILE), &state.matches).await
    }

    async fn latest_match_for(&self, account_id: u64) -> Result<Option<LiveMatch>> {
        let state = self.state.lock().await;
        Ok(state
            .matches
            .iter()
            .rev()
            .find(|observed| observed.account_id == account_id)
            .cloned())
    }

    async fn insert_rule(&self, champion: &str, weight: u32) -> Result<ChampionRule> {
        let normalized = normalize_champion(champion);
        if normalized.is_empty() {
            return Err(AppError::invalid_parameter(format!(
                "'{champion}' is not a champion name"
            )));
        }

        let mut state = self.state.lock().await;
        let active = state
            .rules
            .items
            .iter()
            .any(|rule| rule.is_active && rule.champion == normalized);
        if active {
            return Err(AppError::duplicate(format!(
                "an active rule for {normalized} already exists"
            )));
        }

        let rule = ChampionRule {
            id: state.rules.take_id(),
            champion: normalized,
            weight,
            is_active: true,
            created_at: Utc::now(),
            closed_at: None,
        };
        state.rules.items.push(rule.clone());
        write_json(&self.path(RULES_FILE), &state.rules).await?;
        Ok(rule)
    }

    async fn active_rule_for(&self, champion: &str) -> Result<Option<ChampionRule>> {
        let normalized = normalize_champion(champion);
        let state = self.state.lock().await;
        Ok(state
            .rules
            .items
            .iter()
            .find(|rule| rule.is_active && rule.champion == normalized)
            .cloned())
    }

    async fn retire_rule(&self, key: &RuleKey) -> Result<Option<ChampionRule>> {
        let mut state = self.state.lock().await;

        let Some(rule) = state
            .rules
            .items
            .iter_mut()
            .find(|rule| rule.is_active && key.selects(rule))
        else {
            return Ok(None);
        };
        rule.is_active = false;
        rule.closed_at = Some(Utc::now());
        let retired = rule.clone();

        write_json(&self.path(RULES_FILE), &state.rules).await?;
        Ok(Some(retired))
    }

    async fn rules(&self, active_only: bool) -> Result<Vec<ChampionRule>> {
        let state = self.state.lock().await;
        let mut listed: Vec<ChampionRule> = state
            .rules
            .items
            .iter()
            .filter(|rule| !active_only || rule.is_active)
            .cloned()
            .collect();
        listed.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(listed)
    }

    async fn insert_citation(
        &self,
        account_id: u64,
        champion: &str,
        weight: u32,
    ) -> Result<Citation> {
        let mut state = self.state.lock().await;
        let citation = Citation {
            id: state.citations.take_id(),
            account_id,
            champion: normalize_champion(champion),
            weight,
            issued_at: Utc::now(),
        };
        state.citations.items.push(citation.clone());
        write_json(&self.path(CITATIONS_FILE), &state.citations).await?;
        Ok(citation)
    }

    async fn citation_totals(&self) -> Result<Vec<CitationTotal>> {
        let state = self.state.lock().await;
        Ok(aggregate_citations(
            &state.accounts.items,
            &state.citations.items,
        ))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use tempfile::TempDir;

    use super::*;

    fn candidate(name: &str, region: Region, owner_id: u64) -> CandidateAccount {
        CandidateAccount {
            owner_id,
            summoner_name: name.to_string(),
            region,
            profile_url: format!("https://{region}.op.gg/summoner/userName={name}"),
        }
    }

    #[tokio::test]
    async fn test_open_fresh_directory_starts_empty() {
        let tmp = TempDir::new().unwrap();
        let store = JsonStore::open(tmp.path()).await.unwrap();

        assert!(store.all_accounts().await.unwrap().is_empty());
        assert!(store.rules(false).await.unwrap().is_empty());
        assert!(store.citation_totals().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_roster_survives_reopen() {
        let tmp = TempDir::new().unwrap();
        {
            let store = JsonStore::open(tmp.path()).await.unwrap();
            store
                .insert_account(candidate("shadowfox", Region::Euw, 7))
                .await
                .unwrap();
            store
                .insert_account(candidate("modoc", Region::Na, 8))
                .await
                .unwrap();
        }

        let store = JsonStore::open(tmp.path()).await.unwrap();
        let roster = store.all_accounts().await.unwrap();
        assert_eq!(roster.len(), 2);
        assert_eq!(roster[0].summoner_name, "shadowfox");

        let next = store
            .insert_account(candidate("third", Region::Kr, 9))
            .await
            .unwrap();
        assert_eq!(next.id, 3);
    }

    #[tokio::test]
    async fn test_duplicate_check_survives_reopen() {
        let tmp = TempDir::new().unwrap();
        {
            let store = JsonStore::open(tmp.path()).await.unwrap();
            store
                .insert_account(candidate("ShadowFox", Region::Euw, 7))
                .await
                .unwrap();
        }

        let store = JsonStore::open(tmp.path()).await.unwrap();
        let result = store
            .insert_account(candidate("shadowfox", Region::Euw, 9))
            .await;
        assert!(matches!(result, Err(AppError::Duplicate(_))));
    }

    #[tokio::test]
    async fn test_deleted_id_is_not_reused_after_reopen() {
        let tmp = TempDir::new().unwrap();
        {
            let store = JsonStore::open(tmp.path()).await.unwrap();
            store
                .insert_account(candidate("alpha", Region::Euw, 1))
                .await
                .unwrap();
            let second = store
                .insert_account(candidate("beta", Region::Euw, 1))
                .await
                .unwrap();
            store.delete_account(second.id).await.unwrap();
        }

        let store = JsonStore::open(tmp.path()).await.unwrap();
        let third = store
            .insert_account(candidate("gamma", Region::Euw, 1))
            .await
            .unwrap();
        assert_eq!(third.id, 3);
    }

    #[tokio::test]
    async fn test_latest_match_survives_reopen() {
        let tmp = TempDir::new().unwrap();
        let base = Utc::now();
        {
            let store = JsonStore::open(tmp.path()).await.unwrap();
            for (minutes, champion) in [(0, "teemo"), (30, "shen")] {
                store
                    .insert_match(&LiveMatch {
                        account_id: 4,
                        observed_at: base + Duration::minutes(minutes),
                        game_mode: "Summoner's Rift".to_string(),
                        champion: champion.to_string(),
                        spell_one: "Flash".to_string(),
                        spell_two: "Ignite".to_string(),
                    })
                    .await
                    .unwrap();
            }
        }

        let store = JsonStore::open(tmp.path()).await.unwrap();
        let latest = store.latest_match_for(4).await.unwrap().unwrap();
        assert_eq!(latest.champion, "shen");
    }

    #[tokio::test]
    async fn test_rules_and_citations_survive_reopen() {
        let tmp = TempDir::new().unwrap();
        {
            let store = JsonStore::open(tmp.path()).await.unwrap();
            let account = store
                .insert_account(candidate("shadowfox", Region::Euw, 7))
                .await
                .unwrap();
            store.insert_rule("Teemo", 2).await.unwrap();
            store
                .insert_citation(account.id, "Teemo", 2)
                .await
                .unwrap();
        }

        let store = JsonStore::open(tmp.path()).await.unwrap();
        let rule = store.active_rule_for("teemo").await.unwrap().unwrap();
        assert_eq!(rule.weight, 2);

        let totals = store.citation_totals().await.unwrap();
        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0].owner_id, 7);
        assert_eq!(totals[0].total_weight, 2);

        let result = store.insert_rule("teemo", 9).await;
        assert!(matches!(result, Err(AppError::Duplicate(_))));
    }

    #[tokio::test]
    async fn test_retired_rule_keeps_record_on_disk() {
        let tmp = TempDir::new().unwrap();
        {
            let store = JsonStore::open(tmp.path()).await.unwrap();
            let rule = store.insert_rule("Teemo", 2).await.unwrap();
            store.retire_rule(&RuleKey::Id(rule.id)).await.unwrap();
        }

        let store = JsonStore::open(tmp.path()).await.unwrap();
        assert!(store.active_rule_for("teemo").await.unwrap().is_none());

        let all = store.rules(false).await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(all[0].closed_at.is_some());

        let reinstated = store.insert_rule("Teemo", 4).await.unwrap();
        assert_eq!(reinstated.id, 2);
    }
}
