// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};

use crate::error::{AppError, Result};
use crate::models::ScraperConfig;

/// Create a configured asynchronous HTTP client.
///
/// The Accept-Encoding header is managed by the client itself based on the
/// enabled compression features.
pub fn create_client(config: &ScraperConfig) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    let accept = HeaderValue::from_str(&config.accept)
        .map_err(|e| AppError::config(format!("scraper.accept is not a valid header: {e}")))?;
    headers.insert(ACCEPT, accept);

    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}
