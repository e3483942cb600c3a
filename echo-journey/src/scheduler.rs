//! Delayed stage transitions
//!
//! One timer task per pending ticket. A ticket that is cancelled before
//! its delay elapses is never delivered. The controller still checks
//! every delivered ticket, so a timer that wins a race with `cancel`
//! is harmless.

use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::controller::TransitionTicket;

pub struct TransitionScheduler {
    fired_tx: mpsc::UnboundedSender<TransitionTicket>,
    pending: HashMap<u64, CancellationToken>,
}

impl TransitionScheduler {
    /// Fired tickets are delivered on the returned receiver
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TransitionTicket>) {
        let (fired_tx, fired_rx) = mpsc::unbounded_channel();
        (
            Self {
                fired_tx,
                pending: HashMap::new(),
            },
            fired_rx,
        )
    }

    pub fn schedule(&mut self, ticket: TransitionTicket, delay: Duration) {
        let cancel = CancellationToken::new();
        if let Some(previous) = self.pending.insert(ticket.id, cancel.clone()) {
            previous.cancel();
        }

        let fired_tx = self.fired_tx.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(ticket = ticket.id, "Transition cancelled");
                }
                _ = tokio::time::sleep(delay) => {
                    let _ = fired_tx.send(ticket);
                }
            }
        });
    }

    pub fn cancel(&mut self, ticket: TransitionTicket) {
        if let Some(cancel) = self.pending.remove(&ticket.id) {
            cancel.cancel();
        }
    }

    /// Forget a ticket that has been delivered
    pub fn complete(&mut self, ticket: TransitionTicket) {
        self.pending.remove(&ticket.id);
    }

    pub fn cancel_all(&mut self) {
        for (_, cancel) in self.pending.drain() {
            cancel.cancel();
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

impl Drop for TransitionScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use echo_common::models::Stage;

    fn ticket(id: u64) -> TransitionTicket {
        TransitionTicket {
            id,
            from: Stage::Intro,
        }
    }

    #[tokio::test]
    async fn test_ticket_fires_after_delay() {
        let (mut scheduler, mut fired) = TransitionScheduler::new();
        scheduler.schedule(ticket(1), Duration::from_millis(10));

        let delivered = tokio::time::timeout(Duration::from_secs(2), fired.recv())
            .await
            .expect("timer should fire");
        assert_eq!(delivered, Some(ticket(1)));
    }

    #[tokio::test]
    async fn test_cancelled_ticket_never_fires() {
        let (mut scheduler, mut fired) = TransitionScheduler::new();
        scheduler.schedule(ticket(1), Duration::from_millis(50));
        scheduler.cancel(ticket(1));
        scheduler.schedule(ticket(2), Duration::from_millis(80));

        let first = tokio::time::timeout(Duration::from_secs(2), fired.recv())
            .await
            .unwrap();
        assert_eq!(first, Some(ticket(2)));
        assert_eq!(scheduler.pending_count(), 1);

        // Nothing else arrives
        let again = tokio::time::timeout(Duration::from_millis(150), fired.recv()).await;
        assert!(again.is_err());
    }

    #[tokio::test]
    async fn test_cancel_all() {
        let (mut scheduler, mut fired) = TransitionScheduler::new();
        scheduler.schedule(ticket(1), Duration::from_millis(20));
        scheduler.schedule(ticket(2), Duration::from_millis(20));
        scheduler.cancel_all();
        assert_eq!(scheduler.pending_count(), 0);

        let none = tokio::time::timeout(Duration::from_millis(100), fired.recv()).await;
        assert!(none.is_err());
    }
}
