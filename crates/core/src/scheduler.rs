use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Delivers delayed inputs back into a session's queue.
///
/// Every task is tied to the scheduler's current cancellation token, so a
/// session can drop all outstanding delayed work at once. Dropping the
/// scheduler cancels everything that is still pending.
pub struct Scheduler<T> {
    tx: mpsc::WeakUnboundedSender<T>,
    token: CancellationToken,
}

impl<T: Send + 'static> Scheduler<T> {
    pub fn new(tx: mpsc::WeakUnboundedSender<T>) -> Self {
        Self {
            tx,
            token: CancellationToken::new(),
        }
    }

    /// Sends `input` after `delay` unless cancelled first. Returns `false`
    /// when the receiving queue is already gone.
    pub fn schedule(&self, delay: Duration, input: T) -> bool {
        let Some(tx) = self.tx.upgrade() else {
            return false;
        };
        let task_token = self.token.child_token();
        tokio::spawn(async move {
            tokio::select! {
                _ = task_token.cancelled() => {
                    tracing::trace!("scheduled input cancelled");
                }
                _ = tokio::time::sleep(delay) => {
                    if tx.send(input).is_err() {
                        tracing::debug!("scheduled input dropped, session already closed");
                    }
                }
            }
        });
        true
    }

    /// Cancels everything scheduled so far. Later calls to `schedule` are
    /// unaffected.
    pub fn cancel_pending(&mut self) {
        self.token.cancel();
        self.token = CancellationToken::new();
    }
}

impl<T> Drop for Scheduler<T> {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_input_is_delivered_after_delay() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let scheduler = Scheduler::new(tx.downgrade());

        scheduler.schedule(Duration::from_millis(1500), "advance");
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_millis(1499)).await;
        assert!(rx.try_recv().is_err());

        assert_eq!(rx.recv().await, Some("advance"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_pending_drops_outstanding_work() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut scheduler = Scheduler::new(tx.downgrade());

        scheduler.schedule(Duration::from_millis(100), 1);
        scheduler.schedule(Duration::from_millis(200), 2);
        scheduler.cancel_pending();
        scheduler.schedule(Duration::from_millis(300), 3);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(rx.try_recv().ok(), Some(3));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_scheduler_cancels_work() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let scheduler = Scheduler::new(tx.downgrade());
        scheduler.schedule(Duration::from_millis(10), "late");
        drop(scheduler);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_schedule_after_queue_closed_is_refused() {
        let (tx, rx) = mpsc::unbounded_channel::<u8>();
        let scheduler = Scheduler::new(tx.downgrade());
        drop(tx);
        drop(rx);

        assert!(!scheduler.schedule(Duration::from_millis(10), 1));
    }
}
