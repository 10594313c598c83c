//! Service layer for the watchbot application.
//!
//! This module contains the business logic for:
//! - Page scraping (`AccountScraper`)
//! - Spectate page parsing (`LiveGameParser`)
//! - Confirmation routing (`AckRouter`)
//! - Account registration (`RegistrationWorkflow`)

mod ack;
mod live_game;
mod registration;
mod scraper;

pub use ack::{Ack, AckDecision, AckOutcome, AckRouter, CorrelationToken};
pub use live_game::{LiveGame, LiveGameParser, parse_selector};
pub use registration::{
    PendingConfirmation, ProposalPresenter, RegistrationOutcome, RegistrationRequest,
    RegistrationWorkflow,
};
pub use scraper::{
    AccountScraper, FetchedPage, HttpFetcher, LookupMode, PageFetcher, build_lookup_url,
    profile_url,
};
