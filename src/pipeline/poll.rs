// src/pipeline/poll.rs

//! Periodic surveillance loop.
//!
//! One long-lived task walks the roster on a fixed interval. Per account:
//! scrape, dedup-check, persist, evaluate rules, dispatch alerts. Fetches
//! overlap up to the configured concurrency; everything after the fetch is
//! serialized in arrival order, so a given account's persist always happens
//! before its alert.

use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use tokio::sync::watch;
use tokio::time::{self, Duration, MissedTickBehavior};

use crate::error::Result;
use crate::models::{Config, LiveMatch, TrackedAccount};
use crate::notify::{AlertPayload, Notifier, ReadyGate};
use crate::pipeline::alerts::ChannelSelector;
use crate::pipeline::dedup;
use crate::pipeline::rules::{RuleEngine, Violation};
use crate::services::{AccountScraper, LiveGame};
use crate::storage::WatchStore;

/// Counters for one poll cycle.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub accounts_polled: usize,
    pub live_observations: usize,
    pub duplicates_suppressed: usize,
    pub matches_persisted: usize,
    pub alerts_dispatched: usize,
    pub failures: usize,
}

/// Requests the poller stop after any in-flight tick.
pub struct ShutdownHandle {
    tx: watch::Sender<bool>,
}

impl ShutdownHandle {
    /// Signal shutdown. Idempotent.
    pub fn shutdown(&self) {
        let _ = self.tx.send(true);
    }
}

/// Receiver side observed by the poller loop.
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Wait until shutdown is requested or the handle is dropped.
    pub async fn recv(&mut self) {
        while !*self.rx.borrow() {
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}

/// Create a linked shutdown handle/signal pair.
pub fn shutdown_channel() -> (ShutdownHandle, ShutdownSignal) {
    let (tx, rx) = watch::channel(false);
    (ShutdownHandle { tx }, ShutdownSignal { rx })
}

/// The periodic surveillance task.
pub struct Poller {
    config: Arc<Config>,
    store: Arc<dyn WatchStore>,
    scraper: Arc<AccountScraper>,
    rules: RuleEngine,
    selector: ChannelSelector,
    notifier: Arc<dyn Notifier>,
}

impl Poller {
    pub fn new(
        config: Arc<Config>,
        store: Arc<dyn WatchStore>,
        scraper: Arc<AccountScraper>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let rules = RuleEngine::new(Arc::clone(&store));
        let selector = ChannelSelector::new(&config.alerts.channel_priorities);
        Self {
            config,
            store,
            scraper,
            rules,
            selector,
            notifier,
        }
    }

    /// Run the surveillance loop until shutdown.
    ///
    /// The first tick waits for the readiness gate. A shutdown request is
    /// only honored between ticks, so an in-flight tick always completes.
    pub async fn run(&self, ready: ReadyGate, mut shutdown: ShutdownSignal) -> Result<()> {
        if !ready.wait().await {
            log::warn!("Readiness signal dropped before startup; poller exiting");
            return Ok(());
        }

        let period = Duration::from_secs(self.config.poller.interval_minutes * 60);
        let mut ticker = time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        log::info!(
            "Surveillance poller running every {} minutes",
            self.config.poller.interval_minutes
        );

        loop {
            tokio::select! {
                biased;

                _ = shutdown.recv() => {
                    log::info!("Poller stopping");
                    return Ok(());
                }
                _ = ticker.tick() => {
                    let report = self.tick().await;
                    log::info!(
                        "Tick done: {} accounts, {} live, {} duplicates, {} persisted, {} alerts, {} failures",
                        report.accounts_polled,
                        report.live_observations,
                        report.duplicates_suppressed,
                        report.matches_persisted,
                        report.alerts_dispatched,
                        report.failures
                    );
                }
            }
        }
    }

    /// Execute one poll cycle over the whole roster.
    ///
    /// Per-account failures are counted and logged; they never abort the
    /// cycle for the remaining accounts.
    pub async fn tick(&self) -> TickReport {
        let mut report = TickReport::default();

        let accounts = match self.store.all_accounts().await {
            Ok(accounts) => accounts,
            Err(error) => {
                log::error!("Roster load failed: {error}");
                report.failures += 1;
                return report;
            }
        };
        report.accounts_polled = accounts.len();

        let concurrency = self.config.scraper.max_concurrent.max(1);
        let mut observations = stream::iter(accounts)
            .map(|account| {
                let scraper = Arc::clone(&self.scraper);
                async move {
                    let result = scraper
                        .live_game(&account.summoner_name, account.region)
                        .await;
                    (account, result)
                }
            })
            .buffer_unordered(concurrency);

        while let Some((account, result)) = observations.next().await {
            match result {
                Ok(Some(game)) => {
                    if let Err(error) = self.process_observation(&account, game, &mut report).await
                    {
                        report.failures += 1;
                        log::warn!(
                            "Processing {} ({}) failed: {error}",
                            account.summoner_name,
                            account.region
                        );
                    }
                }
                Ok(None) => {}
                Err(error) => {
                    report.failures += 1;
                    log::warn!(
                        "Polling {} ({}) failed: {error}",
                        account.summoner_name,
                        account.region
                    );
                }
            }
        }

        report
    }

    /// Dedup, persist, evaluate and alert for one live observation.
    async fn process_observation(
        &self,
        account: &TrackedAccount,
        game: LiveGame,
        report: &mut TickReport,
    ) -> Result<()> {
        report.live_observations += 1;

        let observed = LiveMatch {
            account_id: account.id,
            observed_at: Utc::now(),
            game_mode: game.game_mode,
            champion: game.champion,
            spell_one: game.spell_one,
            spell_two: game.spell_two,
        };

        let last = self.store.latest_match_for(account.id).await?;
        let window = self.config.poller.interval_minutes as i64;
        if dedup::is_duplicate(&observed, last.as_ref(), window) {
            report.duplicates_suppressed += 1;
            log::debug!(
                "Duplicate observation for {} suppressed",
                account.summoner_name
            );
            return Ok(());
        }

        // The persist happens before rule evaluation and alerting; an alert
        // always describes a match the store already holds.
        self.store.insert_match(&observed).await?;
        report.matches_persisted += 1;

        let Some(violation) = self.rules.evaluate(&observed).await? else {
            return Ok(());
        };

        log::info!(
            "{} is playing restricted champion {} (weight {})",
            account.summoner_name,
            violation.champion,
            violation.weight
        );

        self.store
            .insert_citation(account.id, &violation.champion, violation.weight)
            .await?;

        report.alerts_dispatched += self.dispatch(account, &violation).await;
        Ok(())
    }

    /// Alert every broadcast group, one destination each.
    ///
    /// A group without an eligible destination is logged and skipped; it
    /// never silences the remaining groups.
    async fn dispatch(&self, account: &TrackedAccount, violation: &Violation) -> usize {
        let payload = AlertPayload {
            owner_id: account.owner_id,
            summoner_name: account.summoner_name.clone(),
            champion: violation.champion.clone(),
            weight: violation.weight,
            profile_url: account.profile_url.clone(),
        };

        let mut dispatched = 0;
        for group in self.notifier.groups() {
            let destination = match self.selector.select(&group.destinations) {
                Ok(destination) => destination,
                Err(error) => {
                    log::warn!("No alert target in group '{}': {error}", group.name);
                    continue;
                }
            };

            match self.notifier.send(&group.name, destination, &payload).await {
                Ok(()) => dispatched += 1,
                Err(error) => {
                    log::warn!(
                        "Alert to '{}' in group '{}' failed: {error}",
                        destination.name,
                        group.name
                    );
                }
            }
        }
        dispatched
    }
}
