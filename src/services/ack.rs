// src/services/ack.rs

//! Acknowledgment routing for confirmation dialogs.
//!
//! A front-end submits decisions tagged with a correlation token; the
//! workflow that opened the dialog awaits them with a deadline. Resolution
//! is always an explicit [`AckOutcome`] value; a timeout is an outcome,
//! not an error.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{Mutex, mpsc};
use tokio::time::Instant;

/// Token correlating a confirmation dialog with incoming decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CorrelationToken(u64);

/// What an actor decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckDecision {
    Confirm,
    Abort,
}

/// A decision submitted by some identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack {
    /// Identity that submitted the decision
    pub actor_id: u64,

    /// The decision itself
    pub decision: AckDecision,
}

/// Resolution of a confirmation dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckOutcome {
    /// The honored identity confirmed in time
    Positive,
    /// The honored identity declined in time
    Negative,
    /// The deadline passed without an honored decision
    TimedOut,
}

/// Routes submitted decisions to the workflow waiting on them.
///
/// Decisions for unknown tokens are dropped silently; a dialog that already
/// resolved behaves the same as one that never existed.
pub struct AckRouter {
    next_token: AtomicU64,
    waiters: Mutex<HashMap<CorrelationToken, mpsc::Sender<Ack>>>,
}

impl AckRouter {
    pub fn new() -> Self {
        Self {
            next_token: AtomicU64::new(1),
            waiters: Mutex::new(HashMap::new()),
        }
    }

    /// Open a dialog, returning its token and the receiving end.
    pub async fn open(&self) -> (CorrelationToken, mpsc::Receiver<Ack>) {
        let token = CorrelationToken(self.next_token.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::channel(8);
        self.waiters.lock().await.insert(token, tx);
        (token, rx)
    }

    /// Submit a decision for a dialog.
    ///
    /// Unknown tokens are ignored, as are decisions past the small buffer
    /// limit; a flood of foreign submissions cannot block the submitter.
    pub async fn submit(&self, token: CorrelationToken, ack: Ack) {
        let sender = self.waiters.lock().await.get(&token).cloned();
        if let Some(sender) = sender {
            let _ = sender.try_send(ack);
        }
    }

    /// Close a dialog, dropping any unconsumed decisions.
    pub async fn close(&self, token: CorrelationToken) {
        self.waiters.lock().await.remove(&token);
    }

    /// Wait for `requester_id`'s decision until `deadline`.
    ///
    /// Decisions from any other identity are consumed and ignored; they do
    /// not resolve the dialog and do not extend the deadline. The dialog is
    /// closed before returning, whatever the outcome.
    pub async fn await_decision(
        &self,
        token: CorrelationToken,
        rx: &mut mpsc::Receiver<Ack>,
        requester_id: u64,
        deadline: Instant,
    ) -> AckOutcome {
        let outcome = loop {
            match tokio::time::timeout_at(deadline, rx.recv()).await {
                Ok(Some(ack)) if ack.actor_id == requester_id => {
                    break match ack.decision {
                        AckDecision::Confirm => AckOutcome::Positive,
                        AckDecision::Abort => AckOutcome::Negative,
                    };
                }
                // Someone else's decision; keep waiting.
                Ok(Some(_)) => continue,
                // Sender side vanished; nothing more can arrive.
                Ok(None) => break AckOutcome::TimedOut,
                Err(_) => break AckOutcome::TimedOut,
            }
        };
        self.close(token).await;
        outcome
    }
}

impl Default for AckRouter {
    fn default() -> Self {
        Self::new()
    }
}
