//! Shutdown coordination.

use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::{JoinError, JoinHandle};

/// Time allowed for in-flight requests to drain after a termination signal.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Coordinator for graceful shutdown.
///
/// Provides a broadcast channel that long-running tasks subscribe to.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Future resolving once [`trigger`](Self::trigger) is called.
    pub fn notified(&self) -> impl std::future::Future<Output = ()> + Send + 'static {
        let mut rx = self.subscribe();
        async move {
            // A closed channel means the coordinator is gone; stop as well.
            let _ = rx.recv().await;
        }
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of waiting for a task under a deadline.
#[derive(Debug)]
pub enum Drain<T> {
    /// The task finished in time.
    Completed(T),
    /// The task panicked or was cancelled.
    Failed(JoinError),
    /// The deadline passed; the task has been aborted.
    TimedOut,
}

/// Wait up to `deadline` for `task`, aborting it if it does not finish.
pub async fn drain<T>(task: JoinHandle<T>, deadline: Duration) -> Drain<T> {
    let abort = task.abort_handle();
    match tokio::time::timeout(deadline, task).await {
        Ok(Ok(value)) => Drain::Completed(value),
        Ok(Err(e)) => Drain::Failed(e),
        Err(_) => {
            abort.abort();
            Drain::TimedOut
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn trigger_wakes_subscribers() {
        let shutdown = Shutdown::new();
        let notified = shutdown.notified();
        let waiter = tokio::spawn(notified);

        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("subscriber not woken")
            .unwrap();
    }

    #[tokio::test]
    async fn drain_returns_completed_value() {
        let task = tokio::spawn(async { 7 });
        match drain(task, Duration::from_secs(1)).await {
            Drain::Completed(v) => assert_eq!(v, 7),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn drain_times_out_and_aborts() {
        let task = tokio::spawn(async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        });
        assert!(matches!(
            drain(task, Duration::from_millis(50)).await,
            Drain::TimedOut
        ));
    }
}
