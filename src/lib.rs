// src/lib.rs

//! Watchbot Library
//!
//! Watches tracked game accounts for live matches, suppresses repeated
//! observations, evaluates restricted-champion rules and raises alerts.

pub mod error;
pub mod models;
pub mod notify;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
