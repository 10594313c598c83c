// src/services/live_game.rs

//! Spectate page parsing.
//!
//! Turns raw profile-site markup into a structured live-game record using
//! the configured CSS selectors. All markup knowledge lives here; the rest
//! of the pipeline only sees typed fields.

use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::models::SpectateSelectors;
use crate::utils::names;

/// Extracted state of an in-progress match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveGame {
    /// Game mode label
    pub game_mode: String,

    /// Champion played by the tracked account, normalized
    pub champion: String,

    /// First summoner spell
    pub spell_one: String,

    /// Second summoner spell
    pub spell_two: String,
}

/// Selector-driven parser for the spectate page.
pub struct LiveGameParser {
    spectator_error: Selector,
    not_found: Selector,
    game_mode: Selector,
    team_row: Selector,
    name_link: Selector,
    spell_icon: Selector,
    champion_link: Selector,
    title_attr: String,
}

impl LiveGameParser {
    /// Build a parser from configured selectors.
    pub fn new(selectors: &SpectateSelectors) -> Result<Self> {
        Ok(Self {
            spectator_error: parse_selector(&selectors.spectator_error)?,
            not_found: parse_selector(&selectors.not_found)?,
            game_mode: parse_selector(&selectors.game_mode)?,
            team_row: parse_selector(&selectors.team_row)?,
            name_link: parse_selector(&selectors.name_link)?,
            spell_icon: parse_selector(&selectors.spell_icon)?,
            champion_link: parse_selector(&selectors.champion_link)?,
            title_attr: selectors.title_attr.clone(),
        })
    }

    /// Parse the spectate page for the given account.
    ///
    /// `Ok(None)` means the page positively reports "not in a match". A page
    /// without that marker that is also missing the mode label or the
    /// account's row is malformed and yields a parse error instead.
    pub fn parse_live_game(&self, html: &str, summoner_name: &str) -> Result<Option<LiveGame>> {
        let document = Html::parse_document(html);

        if document.select(&self.spectator_error).next().is_some() {
            return Ok(None);
        }

        let game_mode = document
            .select(&self.game_mode)
            .next()
            .map(|el| element_text(&el))
            .ok_or_else(|| AppError::parse("spectate page", "game mode label not found"))?;

        let row = self
            .find_account_row(&document, summoner_name)
            .ok_or_else(|| {
                AppError::parse(
                    "spectate page",
                    format!("no participant row for '{summoner_name}'"),
                )
            })?;

        let (spell_one, spell_two) = self.extract_spells(&row)?;
        let champion = self.extract_champion(&row)?;
        if !names::is_valid_champion(&champion) {
            return Err(AppError::parse(
                "spectate page",
                format!("champion title '{champion}' has no letters"),
            ));
        }

        Ok(Some(LiveGame {
            game_mode,
            champion: names::normalize_champion(&champion),
            spell_one,
            spell_two,
        }))
    }

    /// Whether a profile page reports that the account does not exist.
    pub fn is_unknown_account(&self, html: &str) -> bool {
        let document = Html::parse_document(html);
        document.select(&self.not_found).next().is_some()
    }

    /// Locate the participant row whose name matches, case-insensitively.
    fn find_account_row<'a>(
        &self,
        document: &'a Html,
        summoner_name: &str,
    ) -> Option<ElementRef<'a>> {
        let wanted = summoner_name.trim().to_lowercase();
        document.select(&self.team_row).find(|row| {
            row.select(&self.name_link)
                .next()
                .map(|link| element_text(&link).to_lowercase() == wanted)
                .unwrap_or(false)
        })
    }

    fn extract_spells(&self, row: &ElementRef<'_>) -> Result<(String, String)> {
        let mut titles = row.select(&self.spell_icon).filter_map(|el| {
            el.value()
                .attr(&self.title_attr)
                .map(|title| title.trim().to_string())
        });

        let one = titles
            .next()
            .ok_or_else(|| AppError::parse("spectate page", "first summoner spell missing"))?;
        let two = titles
            .next()
            .ok_or_else(|| AppError::parse("spectate page", "second summoner spell missing"))?;
        Ok((one, two))
    }

    fn extract_champion(&self, row: &ElementRef<'_>) -> Result<String> {
        row.select(&self.champion_link)
            .next()
            .and_then(|el| el.value().attr(&self.title_attr))
            .map(|title| title.trim().to_string())
            .ok_or_else(|| AppError::parse("spectate page", "champion title missing"))
    }
}

/// Parse a CSS selector, mapping syntax errors into the unified error type.
pub fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

fn element_text(el: &ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}
