//! Watchbot CLI
//!
//! Local entry point: runs the surveillance loop and administers the
//! roster, rules and citation standings backed by a JSON file store.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use watchbot::{
    error::{AppError, Result},
    models::{Config, Region, RuleKey},
    notify::{ready_gate, LogNotifier},
    pipeline::{shutdown_channel, Poller},
    services::{
        Ack, AckDecision, AckRouter, AccountScraper, HttpFetcher, LiveGameParser,
        PendingConfirmation, ProposalPresenter, RegistrationOutcome, RegistrationRequest,
        RegistrationWorkflow,
    },
    storage::{JsonStore, WatchStore},
};

/// Watchbot - Live Match Surveillance
#[derive(Parser, Debug)]
#[command(
    name = "watchbot",
    version,
    about = "Watches tracked game accounts for live matches and raises rule alerts"
)]

struct Cli {
    /// Path to storage directory containing config and state files
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the surveillance loop until Ctrl-C
    Watch,

    /// Look up one account's live-match status once
    Check {
        /// Summoner name to look up
        name: String,

        /// Region code (br, eune, euw, jp, kr, lan, las, na, oce, ru, tr)
        region: String,
    },

    /// Register an account on the roster (asks for confirmation)
    AddAccount {
        /// Summoner name to track
        name: String,

        /// Region code
        region: String,

        /// Identity the account belongs to (default: the requester)
        #[arg(long)]
        owner: Option<u64>,

        /// Identity issuing the command
        #[arg(long, default_value_t = 0)]
        requester: u64,
    },

    /// List all tracked accounts
    ListAccounts,

    /// Remove an account from the roster
    RemoveAccount {
        /// Account id as shown by list-accounts
        id: u64,

        /// Identity issuing the command
        #[arg(long, default_value_t = 0)]
        requester: u64,
    },

    /// Restrict a champion
    AddRule {
        /// Champion name
        champion: String,

        /// Citation weight per observed match
        #[arg(long, default_value_t = 1)]
        weight: u32,
    },

    /// Lift an active restriction
    RetireRule {
        /// Rule id as shown by list-rules, or a champion name
        rule: String,
    },

    /// List restriction rules
    ListRules {
        /// Only rules currently in force
        #[arg(long)]
        active: bool,
    },

    /// Show citation standings per account owner
    Leaderboard,

    /// Validate configuration files
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Presenter that prints the proposal and reads the decision from stdin.
struct StdinPresenter {
    router: Arc<AckRouter>,
    actor_id: u64,
}

#[async_trait]
impl ProposalPresenter for StdinPresenter {
    async fn present(&self, pending: &PendingConfirmation) -> Result<()> {
        println!(
            "About to track {} ({}) for owner {}.",
            pending.candidate.summoner_name, pending.candidate.region, pending.candidate.owner_id
        );
        println!("Profile: {}", pending.candidate.profile_url);
        println!("Confirm? [y/N]");

        let router = Arc::clone(&self.router);
        let token = pending.token;
        let actor_id = self.actor_id;
        tokio::spawn(async move {
            let line = tokio::task::spawn_blocking(|| {
                let mut line = String::new();
                std::io::stdin().read_line(&mut line).map(|_| line)
            })
            .await;

            let decision = match line {
                Ok(Ok(line)) if matches!(line.trim().to_lowercase().as_str(), "y" | "yes") => {
                    AckDecision::Confirm
                }
                _ => AckDecision::Abort,
            };
            router.submit(token, Ack { actor_id, decision }).await;
        });
        Ok(())
    }
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    log::info!("Watchbot starting...");

    // Load configuration
    let config_path = cli.storage_dir.join("config.toml");
    let config = Config::load_or_default(&config_path);

    let config = Arc::new(config);
    let store: Arc<dyn WatchStore> = Arc::new(JsonStore::open(&cli.storage_dir).await?);

    match cli.command {
        Command::Watch => {
            config.validate()?;

            let fetcher = Arc::new(HttpFetcher::new(&config)?);
            let scraper = Arc::new(AccountScraper::new(&config, fetcher)?);
            let notifier = Arc::new(LogNotifier::new(config.alerts.groups.clone()));
            let poller = Poller::new(
                Arc::clone(&config),
                Arc::clone(&store),
                scraper,
                notifier,
            );

            let (ready_signal, gate) = ready_gate();
            let (shutdown_handle, shutdown_signal) = shutdown_channel();
            let poller_task =
                tokio::spawn(async move { poller.run(gate, shutdown_signal).await });

            ready_signal.set_ready();
            log::info!("Watching. Press Ctrl-C to stop.");

            tokio::signal::ctrl_c().await?;
            log::info!("Ctrl-C received, shutting down...");
            shutdown_handle.shutdown();

            match poller_task.await {
                Ok(result) => result?,
                Err(join_error) => log::error!("Poller task failed: {}", join_error),
            }
        }

        Command::Check { name, region } => {
            let region: Region = region.parse()?;
            let fetcher = Arc::new(HttpFetcher::new(&config)?);
            let scraper = AccountScraper::new(&config, fetcher)?;

            match scraper.live_game(&name, region).await? {
                Some(game) => log::info!(
                    "{name} ({region}) is in game on {}: {} with {} / {}",
                    game.game_mode,
                    game.champion,
                    game.spell_one,
                    game.spell_two
                ),
                None => log::info!("{name} ({region}) is not in a live match"),
            }
        }

        Command::AddAccount {
            name,
            region,
            owner,
            requester,
        } => {
            let region: Region = region.parse()?;
            let fetcher = Arc::new(HttpFetcher::new(&config)?);
            let scraper = Arc::new(AccountScraper::new(&config, fetcher)?);
            let router = Arc::new(AckRouter::new());
            let presenter = Arc::new(StdinPresenter {
                router: Arc::clone(&router),
                actor_id: requester,
            });
            let workflow = RegistrationWorkflow::new(
                Arc::clone(&config),
                Arc::clone(&store),
                scraper,
                router,
                presenter,
            );

            let request = RegistrationRequest {
                requester_id: requester,
                owner_id: owner.unwrap_or(requester),
                summoner_name: name,
                region,
            };
            match workflow.register(request).await? {
                RegistrationOutcome::Confirmed(account) => log::info!(
                    "Tracking {} ({}) as account #{}",
                    account.summoner_name,
                    account.region,
                    account.id
                ),
                RegistrationOutcome::Aborted => log::warn!("Registration aborted"),
                RegistrationOutcome::Expired => log::warn!("Confirmation timed out"),
            }
        }

        Command::ListAccounts => {
            let accounts = store.all_accounts().await?;
            if accounts.is_empty() {
                log::info!("No accounts tracked.");
            }
            for account in accounts {
                log::info!(
                    "#{} {} ({}) owner {} since {}",
                    account.id,
                    account.summoner_name,
                    account.region,
                    account.owner_id,
                    account.registered_at.format("%Y-%m-%d")
                );
            }
        }

        Command::RemoveAccount { id, requester } => {
            let accounts = store.all_accounts().await?;
            let Some(account) = accounts.iter().find(|account| account.id == id) else {
                return Err(AppError::no_target(format!("no tracked account #{id}")));
            };

            let allowed = account.owner_id == requester
                || config.registration.operators.contains(&requester);
            if !allowed {
                return Err(AppError::permission(
                    "only the owner or an operator may remove an account",
                ));
            }

            if let Some(removed) = store.delete_account(id).await? {
                log::info!(
                    "Stopped tracking {} ({})",
                    removed.summoner_name,
                    removed.region
                );
            }
        }

        Command::AddRule { champion, weight } => {
            let rule = store.insert_rule(&champion, weight).await?;
            log::info!(
                "Rule #{}: {} restricted at weight {}",
                rule.id,
                rule.champion,
                rule.weight
            );
        }

        Command::RetireRule { rule } => {
            let key = rule.parse::<RuleKey>()?;
            match store.retire_rule(&key).await? {
                Some(rule) => log::info!("Rule #{} on {} retired", rule.id, rule.champion),
                None => log::warn!("No active rule matching '{}'", rule),
            }
        }

        Command::ListRules { active } => {
            let rules = store.rules(active).await?;
            if rules.is_empty() {
                log::info!("No rules on record.");
            }
            for rule in rules {
                let status = if rule.is_active { "active" } else { "retired" };
                log::info!(
                    "#{} {} weight {} [{}] since {}",
                    rule.id,
                    rule.champion,
                    rule.weight,
                    status,
                    rule.created_at.format("%Y-%m-%d")
                );
            }
        }

        Command::Leaderboard => {
            let totals = store.citation_totals().await?;
            if totals.is_empty() {
                log::info!("No citations issued.");
            }
            for (rank, entry) in totals.iter().enumerate() {
                log::info!(
                    "{}. owner {} - {} citations, total weight {}",
                    rank + 1,
                    entry.owner_id,
                    entry.citations,
                    entry.total_weight
                );
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");

            if let Err(e) = LiveGameParser::new(&config.selectors) {
                log::error!("Selector validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Selectors OK");

            log::info!("All validations passed!");
        }
    }

    log::info!("Done!");

    Ok(())
}
