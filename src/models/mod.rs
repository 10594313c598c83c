// src/models/mod.rs

//! Domain models for the watchbot application.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod account;
mod config;
mod live_match;
mod rule;

// Re-export all public types
pub use account::{CandidateAccount, Region, TrackedAccount};
pub use config::{
    AlertsConfig, BroadcastGroup, ChannelPriority, Config, Destination, PollerConfig,
    RegistrationConfig, ScraperConfig, SpectateSelectors,
};
pub use live_match::LiveMatch;
pub use rule::{ChampionRule, Citation, RuleKey};
