// src/services/registration.rs

//! Account registration confirmation workflow.
//!
//! Linking an account to an owner is a two-phase dialog: the workflow
//! proposes the candidate, then waits for the requester's explicit
//! confirmation. Nothing touches the store until a positive decision
//! arrives in time.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::time::{Duration, Instant};

use crate::error::{AppError, Result};
use crate::models::{CandidateAccount, Config, Region, TrackedAccount};
use crate::services::ack::{AckOutcome, AckRouter, CorrelationToken};
use crate::services::scraper::{self, AccountScraper};
use crate::storage::WatchStore;

/// A request to link an account to an owner.
#[derive(Debug, Clone)]
pub struct RegistrationRequest {
    /// Identity driving the dialog
    pub requester_id: u64,

    /// Identity the account will belong to
    pub owner_id: u64,

    /// In-game name to link
    pub summoner_name: String,

    /// Routing region
    pub region: Region,
}

/// A proposal awaiting its confirmation dialog. Never persisted.
#[derive(Debug, Clone)]
pub struct PendingConfirmation {
    /// Token the front-end must tag decisions with
    pub token: CorrelationToken,

    /// Identity whose decision is honored
    pub requester_id: u64,

    /// The account that would be created
    pub candidate: CandidateAccount,

    /// When the proposal was made
    pub created_at: DateTime<Utc>,
}

/// Terminal state of a registration attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationOutcome {
    /// Requester confirmed in time; the account is now tracked.
    Confirmed(TrackedAccount),
    /// Requester declined; nothing was stored.
    Aborted,
    /// Nobody answered in time; nothing was stored.
    Expired,
}

/// Seam through which a proposal is shown to the requester.
#[async_trait]
pub trait ProposalPresenter: Send + Sync {
    /// Present the pending proposal so the requester can answer.
    async fn present(&self, pending: &PendingConfirmation) -> Result<()>;
}

/// Drives registration attempts from request to terminal outcome.
pub struct RegistrationWorkflow {
    config: Arc<Config>,
    store: Arc<dyn WatchStore>,
    scraper: Arc<AccountScraper>,
    router: Arc<AckRouter>,
    presenter: Arc<dyn ProposalPresenter>,
}

impl RegistrationWorkflow {
    pub fn new(
        config: Arc<Config>,
        store: Arc<dyn WatchStore>,
        scraper: Arc<AccountScraper>,
        router: Arc<AckRouter>,
        presenter: Arc<dyn ProposalPresenter>,
    ) -> Self {
        Self {
            config,
            store,
            scraper,
            router,
            presenter,
        }
    }

    /// Run one registration attempt end to end.
    ///
    /// Checks run in a fixed order: authorization, duplicate identity,
    /// account verification, then the confirmation dialog. The earlier a
    /// request can fail, the earlier it does.
    pub async fn register(&self, request: RegistrationRequest) -> Result<RegistrationOutcome> {
        self.authorize(&request)?;

        let name = request.summoner_name.trim();
        if name.is_empty() {
            return Err(AppError::invalid_parameter("summoner name is empty"));
        }

        if self.store.account_exists(name, request.region).await? {
            return Err(AppError::duplicate(format!(
                "{name} ({}) is already tracked",
                request.region
            )));
        }

        if !self.scraper.verify_account(name, request.region).await? {
            return Err(AppError::invalid_parameter(format!(
                "no account named '{name}' on {}",
                request.region
            )));
        }

        let candidate = CandidateAccount {
            owner_id: request.owner_id,
            summoner_name: name.to_string(),
            region: request.region,
            profile_url: scraper::profile_url(name, request.region)?,
        };

        let (token, mut rx) = self.router.open().await;
        let pending = PendingConfirmation {
            token,
            requester_id: request.requester_id,
            candidate: candidate.clone(),
            created_at: Utc::now(),
        };

        if let Err(error) = self.presenter.present(&pending).await {
            self.router.close(token).await;
            return Err(error);
        }

        let deadline =
            Instant::now() + Duration::from_secs(self.config.registration.ack_timeout_secs);
        let outcome = self
            .router
            .await_decision(token, &mut rx, request.requester_id, deadline)
            .await;

        match outcome {
            AckOutcome::Positive => {
                // Uniqueness is re-checked inside the store; a race with a
                // parallel registration resolves to one winner.
                let account = self.store.insert_account(candidate).await?;
                log::info!(
                    "Registered {} ({}) for owner {}",
                    account.summoner_name,
                    account.region,
                    account.owner_id
                );
                Ok(RegistrationOutcome::Confirmed(account))
            }
            AckOutcome::Negative => {
                log::info!("Registration of {name} aborted by requester");
                Ok(RegistrationOutcome::Aborted)
            }
            AckOutcome::TimedOut => {
                log::info!("Registration of {name} expired without a decision");
                Ok(RegistrationOutcome::Expired)
            }
        }
    }

    /// Registering on behalf of someone else requires operator status.
    fn authorize(&self, request: &RegistrationRequest) -> Result<()> {
        if request.requester_id == request.owner_id
            || self
                .config
                .registration
                .operators
                .contains(&request.requester_id)
        {
            return Ok(());
        }
        Err(AppError::permission(format!(
            "identity {} may not register accounts for {}",
            request.requester_id, request.owner_id
        )))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::services::ack::{Ack, AckDecision};
    use crate::services::scraper::{FetchedPage, PageFetcher};
    use crate::storage::MemoryStore;

    /// Fetcher whose history pages always verify.
    struct VerifyingFetcher;

    #[async_trait]
    impl PageFetcher for VerifyingFetcher {
        async fn fetch(&self, _url: &str) -> Result<FetchedPage> {
            Ok(FetchedPage {
                status: 200,
                body: "<html><body></body></html>".to_string(),
            })
        }
    }

    /// Fetcher whose pages carry the account-not-found marker.
    struct UnknownAccountFetcher;

    #[async_trait]
    impl PageFetcher for UnknownAccountFetcher {
        async fn fetch(&self, _url: &str) -> Result<FetchedPage> {
            Ok(FetchedPage {
                status: 200,
                body: r#"<div class="SummonerNotFoundLayout"></div>"#.to_string(),
            })
        }
    }

    /// Presenter that replays scripted decisions into the router.
    struct ScriptedPresenter {
        router: Arc<AckRouter>,
        acks: Vec<Ack>,
        presented: AtomicUsize,
    }

    impl ScriptedPresenter {
        fn new(router: Arc<AckRouter>, acks: Vec<Ack>) -> Self {
            Self {
                router,
                acks,
                presented: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ProposalPresenter for ScriptedPresenter {
        async fn present(&self, pending: &PendingConfirmation) -> Result<()> {
            self.presented.fetch_add(1, Ordering::SeqCst);
            for ack in &self.acks {
                self.router.submit(pending.token, *ack).await;
            }
            Ok(())
        }
    }

    struct Harness {
        workflow: RegistrationWorkflow,
        store: Arc<MemoryStore>,
        presenter: Arc<ScriptedPresenter>,
    }

    fn harness_with(
        fetcher: Arc<dyn PageFetcher>,
        acks: Vec<Ack>,
        mut mutate: impl FnMut(&mut Config),
    ) -> Harness {
        let mut config = Config::default();
        config.registration.ack_timeout_secs = 5;
        mutate(&mut config);
        let config = Arc::new(config);

        let store = Arc::new(MemoryStore::new());
        let scraper = Arc::new(AccountScraper::new(&config, fetcher).unwrap());
        let router = Arc::new(AckRouter::new());
        let presenter = Arc::new(ScriptedPresenter::new(Arc::clone(&router), acks));

        let workflow = RegistrationWorkflow::new(
            config,
            Arc::clone(&store) as Arc<dyn WatchStore>,
            scraper,
            router,
            Arc::clone(&presenter) as Arc<dyn ProposalPresenter>,
        );

        Harness {
            workflow,
            store,
            presenter,
        }
    }

    fn request(requester_id: u64, owner_id: u64, name: &str) -> RegistrationRequest {
        RegistrationRequest {
            requester_id,
            owner_id,
            summoner_name: name.to_string(),
            region: Region::Euw,
        }
    }

    fn ack(actor_id: u64, decision: AckDecision) -> Ack {
        Ack { actor_id, decision }
    }

    #[tokio::test]
    async fn test_confirmed_registration_persists_one_account() {
        let h = harness_with(
            Arc::new(VerifyingFetcher),
            vec![ack(7, AckDecision::Confirm)],
            |_| {},
        );

        let outcome = h.workflow.register(request(7, 7, "shadowfox")).await.unwrap();
        let RegistrationOutcome::Confirmed(account) = outcome else {
            panic!("expected confirmation");
        };

        assert_eq!(account.summoner_name, "shadowfox");
        assert_eq!(account.region, Region::Euw);
        assert_eq!(account.owner_id, 7);

        let accounts = h.store.all_accounts().await.unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].id, account.id);
    }

    #[tokio::test]
    async fn test_aborted_registration_stores_nothing() {
        let h = harness_with(
            Arc::new(VerifyingFetcher),
            vec![ack(7, AckDecision::Abort)],
            |_| {},
        );

        let outcome = h.workflow.register(request(7, 7, "shadowfox")).await.unwrap();
        assert_eq!(outcome, RegistrationOutcome::Aborted);
        assert!(h.store.all_accounts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_expired_registration_stores_nothing() {
        let h = harness_with(Arc::new(VerifyingFetcher), vec![], |config| {
            config.registration.ack_timeout_secs = 1;
        });

        let outcome = h.workflow.register(request(7, 7, "shadowfox")).await.unwrap();
        assert_eq!(outcome, RegistrationOutcome::Expired);
        assert!(h.store.all_accounts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_foreign_acks_do_not_resolve_the_dialog() {
        // Strangers confirm, the requester aborts; only the latter counts.
        let h = harness_with(
            Arc::new(VerifyingFetcher),
            vec![
                ack(1, AckDecision::Confirm),
                ack(2, AckDecision::Confirm),
                ack(7, AckDecision::Abort),
            ],
            |_| {},
        );

        let outcome = h.workflow.register(request(7, 7, "shadowfox")).await.unwrap();
        assert_eq!(outcome, RegistrationOutcome::Aborted);
        assert!(h.store.all_accounts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_identity_rejected_before_proposal() {
        let h = harness_with(
            Arc::new(VerifyingFetcher),
            vec![ack(7, AckDecision::Confirm)],
            |_| {},
        );

        h.workflow.register(request(7, 7, "shadowfox")).await.unwrap();

        // Same identity, different case: still a duplicate, and no second
        // dialog is opened.
        let err = h
            .workflow
            .register(request(7, 7, "ShadowFox"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Duplicate(_)));
        assert_eq!(h.presenter.presented.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unknown_account_rejected_before_proposal() {
        let h = harness_with(Arc::new(UnknownAccountFetcher), vec![], |_| {});

        let err = h
            .workflow
            .register(request(7, 7, "nobody"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidParameter(_)));
        assert_eq!(h.presenter.presented.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_registering_for_others_requires_operator() {
        let h = harness_with(Arc::new(VerifyingFetcher), vec![], |_| {});

        let err = h
            .workflow
            .register(request(7, 8, "shadowfox"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Permission(_)));
        assert_eq!(h.presenter.presented.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_operator_may_register_for_others() {
        let h = harness_with(
            Arc::new(VerifyingFetcher),
            vec![ack(7, AckDecision::Confirm)],
            |config| config.registration.operators = vec![7],
        );

        let outcome = h.workflow.register(request(7, 8, "shadowfox")).await.unwrap();
        let RegistrationOutcome::Confirmed(account) = outcome else {
            panic!("expected confirmation");
        };
        assert_eq!(account.owner_id, 8);
    }
}
