//! Alert delivery seam.
//!
//! The poller hands finished alerts to a `Notifier`; what transport sits
//! behind it is the deployment's business. `LogNotifier` is the built-in
//! backend used by the CLI.

pub mod ready;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{BroadcastGroup, Destination};

// Re-export for convenience
pub use ready::{ready_gate, ReadyGate, ReadySignal};

/// Content of one restricted-champion alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertPayload {
    pub owner_id: u64,
    pub summoner_name: String,
    pub champion: String,
    pub weight: u32,
    pub profile_url: String,
}

/// Trait for alert delivery backends.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Broadcast groups this notifier serves. Selection picks one
    /// destination per group.
    fn groups(&self) -> Vec<BroadcastGroup>;

    /// Deliver one alert to one destination.
    async fn send(
        &self,
        group: &str,
        destination: &Destination,
        payload: &AlertPayload,
    ) -> Result<()>;
}

/// Backend that writes alerts to the log, for deployments without a chat
/// transport wired up.
pub struct LogNotifier {
    groups: Vec<BroadcastGroup>,
}

impl LogNotifier {
    pub fn new(groups: Vec<BroadcastGroup>) -> Self {
        Self { groups }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    fn groups(&self) -> Vec<BroadcastGroup> {
        self.groups.clone()
    }

    async fn send(
        &self,
        group: &str,
        destination: &Destination,
        payload: &AlertPayload,
    ) -> Result<()> {
        log::info!(
            "[{group}/{}] {} (owner {}) is live as restricted champion {} (weight {}): {}",
            destination.name,
            payload.summoner_name,
            payload.owner_id,
            payload.champion,
            payload.weight,
            payload.profile_url
        );
        Ok(())
    }
}
