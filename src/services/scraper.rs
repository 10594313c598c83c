// src/services/scraper.rs

//! Account page scraping service.
//!
//! Builds lookup URLs for the profile site, fetches them through the
//! `PageFetcher` boundary and hands the markup to the parser. Transport
//! failures are soft: a failed fetch is "no data this cycle", never a
//! reason to abort a poll.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use url::form_urlencoded;

use crate::error::{AppError, Result};
use crate::models::{Config, Region};
use crate::services::live_game::{LiveGame, LiveGameParser};
use crate::utils::http;

/// Which view of an account profile to request.
///
/// The set is closed: there is no way to request an arbitrary page through
/// this service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupMode {
    /// Match history overview
    History,
    /// Live spectate view
    Spectate,
    /// Per-champion statistics
    Champions,
    /// Ranked league standing
    League,
}

impl LookupMode {
    /// URL template with `{region}` and `{name}` placeholders.
    fn template(&self) -> &'static str {
        match self {
            LookupMode::History => "https://{region}.op.gg/summoner/userName={name}",
            LookupMode::Spectate => "https://{region}.op.gg/summoner/spectator/userName={name}&",
            LookupMode::Champions => "https://{region}.op.gg/summoner/champions/userName={name}&",
            LookupMode::League => "https://{region}.op.gg/summoner/league/userName={name}&",
        }
    }
}

/// Build the lookup URL for an account and mode.
///
/// The name is form-encoded (spaces become `+`) before substitution, so a
/// malformed name can never change the URL structure.
pub fn build_lookup_url(summoner_name: &str, region: Region, mode: LookupMode) -> Result<String> {
    let name = summoner_name.trim();
    if name.is_empty() {
        return Err(AppError::invalid_parameter("summoner name is empty"));
    }

    let encoded: String = form_urlencoded::byte_serialize(name.as_bytes()).collect();
    Ok(mode
        .template()
        .replace("{region}", region.code())
        .replace("{name}", &encoded))
}

/// The profile page URL shown to humans in proposals and alerts.
pub fn profile_url(summoner_name: &str, region: Region) -> Result<String> {
    build_lookup_url(summoner_name, region, LookupMode::History)
}

/// A fetched page with its transport status.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// HTTP status code
    pub status: u16,

    /// Raw page text
    pub body: String,
}

/// Boundary for retrieving raw page text.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch a URL, returning the status and body.
    async fn fetch(&self, url: &str) -> Result<FetchedPage>;
}

/// reqwest-backed fetcher.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Create a fetcher with the configured client settings.
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: http::create_client(&config.scraper)?,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::fetch(url, e))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::fetch(url, e))?;
        Ok(FetchedPage { status, body })
    }
}

/// Scrapes account pages and extracts live-game state.
pub struct AccountScraper {
    fetcher: Arc<dyn PageFetcher>,
    parser: LiveGameParser,
}

impl AccountScraper {
    /// Create a scraper over the given fetcher.
    pub fn new(config: &Config, fetcher: Arc<dyn PageFetcher>) -> Result<Self> {
        Ok(Self {
            fetcher,
            parser: LiveGameParser::new(&config.selectors)?,
        })
    }

    /// Look up the spectate view for an in-progress match.
    ///
    /// `Ok(None)` covers both "not in a match" and a failed fetch; the
    /// distinction only matters for logs. Malformed in-match pages surface
    /// as parse errors.
    pub async fn live_game(&self, summoner_name: &str, region: Region) -> Result<Option<LiveGame>> {
        let url = build_lookup_url(summoner_name, region, LookupMode::Spectate)?;
        let Some(page) = self.fetch_ok(&url).await else {
            return Ok(None);
        };
        self.parser.parse_live_game(&page.body, summoner_name)
    }

    /// Check whether the profile site knows the account at all.
    ///
    /// A failed fetch counts as unverified; callers should not propose a
    /// registration they could not check.
    pub async fn verify_account(&self, summoner_name: &str, region: Region) -> Result<bool> {
        let url = build_lookup_url(summoner_name, region, LookupMode::History)?;
        let Some(page) = self.fetch_ok(&url).await else {
            return Ok(false);
        };
        Ok(!self.parser.is_unknown_account(&page.body))
    }

    /// Fetch a URL, absorbing transport failures and non-2xx statuses.
    async fn fetch_ok(&self, url: &str) -> Option<FetchedPage> {
        match self.fetcher.fetch(url).await {
            Ok(page) if (200..300).contains(&page.status) => Some(page),
            Ok(page) => {
                log::warn!("Fetch of {url} returned status {}", page.status);
                None
            }
            Err(error) => {
                log::warn!("Fetch of {url} failed: {error}");
                None
            }
        }
    }
}
