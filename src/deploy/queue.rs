//! Single-slot coalescing deploy queue
//!
//! Watch mode can complete builds faster than the node acknowledges
//! deploys. The queue keeps at most one deploy in flight: while one is
//! pending or in flight, a newer completed build replaces the pending hash
//! instead of issuing an overlapping call. An intermediate hash that was
//! superseded before its deploy started is never deployed.

use crate::compiler::ContentHash;
use std::sync::Mutex;
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct State {
    pending: Option<ContentHash>,
    closed: bool,
}

#[derive(Debug, Default)]
pub struct DeployQueue {
    state: Mutex<State>,
    notify: Notify,
}

impl DeployQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a hash for deployment, superseding any not-yet-started one
    pub fn submit(&self, hash: ContentHash) {
        let mut state = self.state.lock().unwrap();
        state.pending = Some(hash);
        self.notify.notify_one();
    }

    /// Marks the producing side finished; `next` drains the remaining slot
    /// and then yields `None`
    pub fn close(&self) {
        let mut state = self.state.lock().unwrap();
        state.closed = true;
        self.notify.notify_one();
    }

    /// Takes the most recent pending hash, suspending until one arrives.
    /// Returns `None` once the queue is closed and drained.
    pub async fn next(&self) -> Option<ContentHash> {
        loop {
            {
                let mut state = self.state.lock().unwrap();
                if let Some(hash) = state.pending.take() {
                    return Some(hash);
                }
                if state.closed {
                    return None;
                }
            }
            self.notify.notified().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_next_yields_submitted_hash() {
        let queue = DeployQueue::new();
        queue.submit(ContentHash::new("QmA"));

        assert_eq!(queue.next().await, Some(ContentHash::new("QmA")));
    }

    #[tokio::test]
    async fn test_newer_submission_supersedes_pending() {
        let queue = DeployQueue::new();
        queue.submit(ContentHash::new("QmA"));
        queue.submit(ContentHash::new("QmB"));
        queue.close();

        // QmA was never taken, so only the newest hash is deployed.
        assert_eq!(queue.next().await, Some(ContentHash::new("QmB")));
        assert_eq!(queue.next().await, None);
    }

    #[tokio::test]
    async fn test_sequential_submissions_all_observed() {
        let queue = DeployQueue::new();

        queue.submit(ContentHash::new("QmA"));
        assert_eq!(queue.next().await, Some(ContentHash::new("QmA")));

        queue.submit(ContentHash::new("QmB"));
        assert_eq!(queue.next().await, Some(ContentHash::new("QmB")));
    }

    #[tokio::test]
    async fn test_close_drains_then_ends() {
        let queue = DeployQueue::new();
        queue.submit(ContentHash::new("QmA"));
        queue.close();

        assert_eq!(queue.next().await, Some(ContentHash::new("QmA")));
        assert_eq!(queue.next().await, None);
    }

    #[tokio::test]
    async fn test_next_wakes_on_submit() {
        let queue = Arc::new(DeployQueue::new());

        let waiter = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.next().await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        queue.submit(ContentHash::new("QmA"));

        let taken = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(taken, Some(ContentHash::new("QmA")));
    }
}
