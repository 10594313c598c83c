//! Tracked account identity types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Routing region of the profile site.
///
/// Region codes double as the subdomain in lookup URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Br,
    Eune,
    Euw,
    Jp,
    Kr,
    Lan,
    Las,
    Na,
    Oce,
    Ru,
    Tr,
}

impl Region {
    /// All known regions, in display order.
    pub const ALL: [Region; 11] = [
        Region::Br,
        Region::Eune,
        Region::Euw,
        Region::Jp,
        Region::Kr,
        Region::Lan,
        Region::Las,
        Region::Na,
        Region::Oce,
        Region::Ru,
        Region::Tr,
    ];

    /// Subdomain code used in profile URLs.
    pub fn code(&self) -> &'static str {
        match self {
            Region::Br => "br",
            Region::Eune => "eune",
            Region::Euw => "euw",
            Region::Jp => "jp",
            Region::Kr => "kr",
            Region::Lan => "lan",
            Region::Las => "las",
            Region::Na => "na",
            Region::Oce => "oce",
            Region::Ru => "ru",
            Region::Tr => "tr",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Region {
    type Err = AppError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "br" => Ok(Region::Br),
            "eune" => Ok(Region::Eune),
            "euw" => Ok(Region::Euw),
            "jp" => Ok(Region::Jp),
            "kr" => Ok(Region::Kr),
            "lan" => Ok(Region::Lan),
            "las" => Ok(Region::Las),
            "na" => Ok(Region::Na),
            "oce" => Ok(Region::Oce),
            "ru" => Ok(Region::Ru),
            "tr" => Ok(Region::Tr),
            other => Err(AppError::invalid_parameter(format!(
                "unknown region '{other}'"
            ))),
        }
    }
}

/// A registration candidate that has not been confirmed yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateAccount {
    /// Identity the account will belong to
    pub owner_id: u64,

    /// In-game name as requested
    pub summoner_name: String,

    /// Routing region
    pub region: Region,

    /// Profile page URL built at proposal time
    pub profile_url: String,
}

/// A confirmed account under surveillance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackedAccount {
    /// Store-assigned identifier
    pub id: u64,

    /// Chat identity that owns this account
    pub owner_id: u64,

    /// In-game name as registered
    pub summoner_name: String,

    /// Routing region
    pub region: Region,

    /// Profile page URL built at registration time
    pub profile_url: String,

    /// When the registration was confirmed
    pub registered_at: DateTime<Utc>,
}

impl TrackedAccount {
    /// Identity key used for uniqueness checks.
    ///
    /// Names are compared case-insensitively; the region is part of the key,
    /// so the same name may be tracked on two regions.
    pub fn identity_key(summoner_name: &str, region: Region) -> (String, Region) {
        (summoner_name.trim().to_lowercase(), region)
    }
}
