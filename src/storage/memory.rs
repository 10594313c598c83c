// src/storage/memory.rs

//! In-memory store backend.
//!
//! State lives behind a single `RwLock`, so every check-then-insert runs
//! under one write lock and stays atomic. Nothing survives the process;
//! durable deployments use `JsonStore`.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::{AppError, Result};
use crate::models::{
    CandidateAccount, ChampionRule, Citation, LiveMatch, Region, RuleKey, TrackedAccount,
};
use crate::storage::{aggregate_citations, CitationTotal, WatchStore};
use crate::utils::normalize_champion;

#[derive(Default)]
struct State {
    accounts: Vec<TrackedAccount>,
    matches: Vec<LiveMatch>,
    rules: Vec<ChampionRule>,
    citations: Vec<Citation>,
    next_account_id: u64,
    next_rule_id: u64,
    next_citation_id: u64,
}

impl State {
    fn new() -> Self {
        Self {
            next_account_id: 1,
            next_rule_id: 1,
            next_citation_id: 1,
            ..Self::default()
        }
    }
}

/// Volatile store backend.
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WatchStore for MemoryStore {
    async fn insert_account(&self, candidate: CandidateAccount) -> Result<TrackedAccount> {
        let mut state = self.state.write().await;

        let key = TrackedAccount::identity_key(&candidate.summoner_name, candidate.region);
        let taken = state
            .accounts
            .iter()
            .any(|account| TrackedAccount::identity_key(&account.summoner_name, account.region) == key);
        if taken {
            return Err(AppError::duplicate(format!(
                "{} ({}) is already tracked",
                candidate.summoner_name, candidate.region
            )));
        }

        let account = TrackedAccount {
            id: state.next_account_id,
            owner_id: candidate.owner_id,
            summoner_name: candidate.summoner_name,
            region: candidate.region,
            profile_url: candidate.profile_url,
            registered_at: Utc::now(),
        };
        state.next_account_id += 1;
        state.accounts.push(account.clone());
        Ok(account)
    }

    async fn account_exists(&self, summoner_name: &str, region: Region) -> Result<bool> {
        let state = self.state.read().await;
        let key = TrackedAccount::identity_key(summoner_name, region);
        Ok(state
            .accounts
            .iter()
            .any(|account| TrackedAccount::identity_key(&account.summoner_name, account.region) == key))
    }

    async fn all_accounts(&self) -> Result<Vec<TrackedAccount>> {
        let state = self.state.read().await;
        Ok(state.accounts.clone())
    }

    async fn delete_account(&self, id: u64) -> Result<Option<TrackedAccount>> {
        let mut state = self.state.write().await;
        let position = state.accounts.iter().position(|account| account.id == id);
        Ok(position.map(|index| state.accounts.remove(index)))
    }

    async fn insert_match(&self, observed: &LiveMatch) -> Result<()> {
        let mut state = self.state.write().await;
        state.matches.push(observed.clone());
        Ok(())
    }

    async fn latest_match_for(&self, account_id: u64) -> Result<Option<LiveMatch>> {
        let state = self.state.read().await;
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

        let mut state = self.state.write().await;
        let active = state
            .rules
            .iter()
            .any(|rule| rule.is_active && rule.champion == normalized);
        if active {
            return Err(AppError::duplicate(format!(
                "an active rule for {normalized} already exists"
            )));
        }

        let rule = ChampionRule {
            id: state.next_rule_id,
            champion: normalized,
            weight,
            is_active: true,
            created_at: Utc::now(),
            closed_at: None,
        };
        state.next_rule_id += 1;
        state.rules.push(rule.clone());
        Ok(rule)
    }

    async fn active_rule_for(&self, champion: &str) -> Result<Option<ChampionRule>> {
        let normalized = normalize_champion(champion);
        let state = self.state.read().await;
        Ok(state
            .rules
            .iter()
            .find(|rule| rule.is_active && rule.champion == normalized)
            .cloned())
    }

    async fn retire_rule(&self, key: &RuleKey) -> Result<Option<ChampionRule>> {
        let mut state = self.state.write().await;
        let rule = state
            .rules
            .iter_mut()
            .find(|rule| rule.is_active && key.selects(rule));
        Ok(rule.map(|rule| {
            rule.is_active = false;
            rule.closed_at = Some(Utc::now());
            rule.clone()
        }))
    }

    async fn rules(&self, active_only: bool) -> Result<Vec<ChampionRule>> {
        let state = self.state.read().await;
        let mut listed: Vec<ChampionRule> = state
            .rules
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
        let mut state = self.state.write().await;
        let citation = Citation {
            id: state.next_citation_id,
            account_id,
            champion: normalize_champion(champion),
            weight,
            issued_at: Utc::now(),
        };
        state.next_citation_id += 1;
        state.citations.push(citation.clone());
        Ok(citation)
    }

    async fn citation_totals(&self) -> Result<Vec<CitationTotal>> {
        let state = self.state.read().await;
        Ok(aggregate_citations(&state.accounts, &state.citations))
    }
}
