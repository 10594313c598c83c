//! Pipeline stages for the surveillance loop.
//!
//! - `poll`: the periodic roster walk driving everything else
//! - `dedup`: suppression of repeated live-match observations
//! - `rules`: restricted-champion evaluation
//! - `alerts`: priority-based destination selection

pub mod alerts;
pub mod dedup;
pub mod poll;
pub mod rules;

pub use alerts::ChannelSelector;
pub use poll::{shutdown_channel, Poller, ShutdownHandle, ShutdownSignal, TickReport};
pub use rules::{RuleEngine, Violation};
