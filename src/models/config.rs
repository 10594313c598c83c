//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP fetch behavior for profile-site requests
    #[serde(default)]
    pub scraper: ScraperConfig,

    /// Surveillance loop settings
    #[serde(default)]
    pub poller: PollerConfig,

    /// Alert routing settings
    #[serde(default)]
    pub alerts: AlertsConfig,

    /// Registration workflow settings
    #[serde(default)]
    pub registration: RegistrationConfig,

    /// CSS selectors for the spectate page
    #[serde(default)]
    pub selectors: SpectateSelectors,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.scraper.user_agent.trim().is_empty() {
            return Err(AppError::validation("scraper.user_agent is empty"));
        }
        if self.scraper.timeout_secs == 0 {
            return Err(AppError::validation("scraper.timeout_secs must be > 0"));
        }
        if self.scraper.max_concurrent == 0 {
            return Err(AppError::validation("scraper.max_concurrent must be > 0"));
        }
        if self.poller.interval_minutes == 0 {
            return Err(AppError::validation("poller.interval_minutes must be > 0"));
        }
        if self.registration.ack_timeout_secs == 0 {
            return Err(AppError::validation(
                "registration.ack_timeout_secs must be > 0",
            ));
        }
        if self.alerts.channel_priorities.is_empty() {
            return Err(AppError::validation("alerts.channel_priorities is empty"));
        }
        for group in &self.alerts.groups {
            if group.destinations.is_empty() {
                return Err(AppError::validation(format!(
                    "alerts group '{}' has no destinations",
                    group.name
                )));
            }
        }
        for (field, selector) in self.selectors.fields() {
            if selector.trim().is_empty() {
                return Err(AppError::validation(format!("selectors.{field} is empty")));
            }
        }
        Ok(())
    }
}

/// HTTP client behavior for profile-site requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Accept header sent with page requests
    #[serde(default = "defaults::accept")]
    pub accept: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Maximum concurrent page fetches during a poll cycle
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            accept: defaults::accept(),
            timeout_secs: defaults::timeout(),
            max_concurrent: defaults::max_concurrent(),
        }
    }
}

/// Surveillance loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerConfig {
    /// Minutes between poll cycles; doubles as the dedup window
    #[serde(default = "defaults::interval_minutes")]
    pub interval_minutes: u64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_minutes: defaults::interval_minutes(),
        }
    }
}

/// Alert routing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertsConfig {
    /// Channel-name preference table used by the selector
    #[serde(default = "defaults::channel_priorities")]
    pub channel_priorities: Vec<ChannelPriority>,

    /// Broadcast groups served by the log notifier
    #[serde(default)]
    pub groups: Vec<BroadcastGroup>,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            channel_priorities: defaults::channel_priorities(),
            groups: Vec::new(),
        }
    }
}

/// A channel name with its selection score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelPriority {
    /// Channel name to match against destinations
    pub name: String,

    /// Higher scores win; negative scores mark last resorts
    pub score: i32,
}

/// A concrete alert target inside a broadcast group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Destination {
    /// Transport-level channel identifier
    pub id: u64,

    /// Channel name used for priority lookup
    pub name: String,
}

/// A named community with its candidate alert destinations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BroadcastGroup {
    /// Group display name
    pub name: String,

    /// Candidate destinations; order matters for tie-breaking
    pub destinations: Vec<Destination>,
}

/// Registration workflow settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationConfig {
    /// Seconds to wait for the requester's confirmation
    #[serde(default = "defaults::ack_timeout")]
    pub ack_timeout_secs: u64,

    /// Identities allowed to act on accounts they do not own
    #[serde(default)]
    pub operators: Vec<u64>,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            ack_timeout_secs: defaults::ack_timeout(),
            operators: Vec::new(),
        }
    }
}

/// CSS selectors for the spectate page.
///
/// The page markup is the brittle part of the system. Every selector is
/// configurable so a markup change is a config edit, not a code change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpectateSelectors {
    /// Marker meaning "not currently in a match"
    #[serde(default = "defaults::spectator_error")]
    pub spectator_error: String,

    /// Marker meaning "no such account"
    #[serde(default = "defaults::not_found")]
    pub not_found: String,

    /// Game mode label
    #[serde(default = "defaults::game_mode")]
    pub game_mode: String,

    /// One row per participant, across both team tables
    #[serde(default = "defaults::team_row")]
    pub team_row: String,

    /// Participant name link inside a row
    #[serde(default = "defaults::name_link")]
    pub name_link: String,

    /// Summoner spell icons inside a row
    #[serde(default = "defaults::spell_icon")]
    pub spell_icon: String,

    /// Champion link inside a row
    #[serde(default = "defaults::champion_link")]
    pub champion_link: String,

    /// Attribute carrying spell and champion names
    #[serde(default = "defaults::title_attr")]
    pub title_attr: String,
}

impl SpectateSelectors {
    /// Field name/value pairs for validation and diagnostics.
    pub fn fields(&self) -> [(&'static str, &str); 8] {
        [
            ("spectator_error", &self.spectator_error),
            ("not_found", &self.not_found),
            ("game_mode", &self.game_mode),
            ("team_row", &self.team_row),
            ("name_link", &self.name_link),
            ("spell_icon", &self.spell_icon),
            ("champion_link", &self.champion_link),
            ("title_attr", &self.title_attr),
        ]
    }
}

impl Default for SpectateSelectors {
    fn default() -> Self {
        Self {
            spectator_error: defaults::spectator_error(),
            not_found: defaults::not_found(),
            game_mode: defaults::game_mode(),
            team_row: defaults::team_row(),
            name_link: defaults::name_link(),
            spell_icon: defaults::spell_icon(),
            champion_link: defaults::champion_link(),
            title_attr: defaults::title_attr(),
        }
    }
}

mod defaults {
    use super::ChannelPriority;

    // Scraper defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/85.0.4183.83 Safari/537.36"
            .into()
    }
    pub fn accept() -> String {
        "application/json, text/javascript, */*; q=0.01".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn max_concurrent() -> usize {
        5
    }

    // Poller defaults
    pub fn interval_minutes() -> u64 {
        14
    }

    // Alert defaults
    pub fn channel_priorities() -> Vec<ChannelPriority> {
        vec![
            ChannelPriority {
                name: "alert".into(),
                score: 1,
            },
            ChannelPriority {
                name: "punish".into(),
                score: 2,
            },
            ChannelPriority {
                name: "general".into(),
                score: -1,
            },
        ]
    }

    // Registration defaults
    pub fn ack_timeout() -> u64 {
        60
    }

    // Spectate page selectors
    pub fn spectator_error() -> String {
        "div.SpectatorError".into()
    }
    pub fn not_found() -> String {
        "div.SummonerNotFoundLayout".into()
    }
    pub fn game_mode() -> String {
        "small.MapName".into()
    }
    pub fn team_row() -> String {
        "tbody.Body tr".into()
    }
    pub fn name_link() -> String {
        "td.SummonerName.Cell a".into()
    }
    pub fn spell_icon() -> String {
        "td.SummonerSpell.Cell div.Spell".into()
    }
    pub fn champion_link() -> String {
        "td.ChampionImage.Cell a".into()
    }
    pub fn title_attr() -> String {
        "title".into()
    }
}
