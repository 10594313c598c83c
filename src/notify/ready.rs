// src/notify/ready.rs

//! Startup readiness gate.
//!
//! The poller must not start its first tick until the rest of the process
//! (store opened, transports connected) says go. One `ReadySignal` releases
//! any number of cloned `ReadyGate` waiters.

use tokio::sync::watch;

/// Sender half. Dropping it unreleased tells waiters startup failed.
pub struct ReadySignal {
    tx: watch::Sender<bool>,
}

impl ReadySignal {
    /// Release all gates. One-shot.
    pub fn set_ready(self) {
        let _ = self.tx.send(true);
    }
}

/// Waiter half.
#[derive(Clone)]
pub struct ReadyGate {
    rx: watch::Receiver<bool>,
}

impl ReadyGate {
    /// Wait for the signal. Returns false if the signal was dropped
    /// without ever being set.
    pub async fn wait(mut self) -> bool {
        loop {
            if *self.rx.borrow() {
                return true;
            }
            if self.rx.changed().await.is_err() {
                return *self.rx.borrow();
            }
        }
    }
}

/// Create a linked signal/gate pair.
pub fn ready_gate() -> (ReadySignal, ReadyGate) {
    let (tx, rx) = watch::channel(false);
    (ReadySignal { tx }, ReadyGate { rx })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_wait_after_set_ready_returns_immediately() {
        let (signal, gate) = ready_gate();
        signal.set_ready();
        assert!(gate.wait().await);
    }

    #[tokio::test]
    async fn test_wait_released_by_later_signal() {
        let (signal, gate) = ready_gate();
        let waiter = tokio::spawn(gate.wait());

        tokio::time::sleep(Duration::from_millis(20)).await;
        signal.set_ready();

        let released = tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .expect("gate never released")
            .unwrap();
        assert!(released);
    }

    #[tokio::test]
    async fn test_dropped_signal_releases_with_false() {
        let (signal, gate) = ready_gate();
        drop(signal);
        assert!(!gate.wait().await);
    }

    #[tokio::test]
    async fn test_all_cloned_gates_release() {
        let (signal, gate) = ready_gate();
        let first = tokio::spawn(gate.clone().wait());
        let second = tokio::spawn(gate.wait());

        signal.set_ready();
        assert!(first.await.unwrap());
        assert!(second.await.unwrap());
    }
}
