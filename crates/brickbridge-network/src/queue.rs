//! FIFO mailboxes between the harness and the session pump.
//!
//! Two queues decouple the harness's request/response timing from the
//! socket loop: outbound (harness to device) and inbound (device to
//! harness). They are the only channel between the two tasks.
//!
//! `push` never blocks and the queue is unbounded: the emulated rig
//! produces low-volume traffic over a bounded test-run lifetime, so
//! backpressure buys nothing here. `drain` removes and returns everything
//! currently queued as one snapshot without blocking producers; items
//! pushed while a drain is handed out land in the next snapshot.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use tokio::sync::Notify;

/// An unbounded, thread-safe FIFO with snapshot drain semantics.
///
/// # Examples
///
/// ```
/// use brickbridge_network::CommandQueue;
///
/// let queue = CommandQueue::new();
/// queue.push("x1");
/// queue.push("x2");
///
/// assert_eq!(queue.drain(), vec!["x1", "x2"]);
/// assert!(queue.drain().is_empty());
/// ```
#[derive(Debug)]
pub struct CommandQueue<T> {
    items: Mutex<VecDeque<T>>,
    wake: Notify,
}

impl<T> CommandQueue<T> {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            wake: Notify::new(),
        }
    }

    // Queue items are plain data; a poisoned lock from a panicking peer
    // leaves them intact.
    fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.items.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Append an item. Never blocks.
    pub fn push(&self, item: T) {
        self.lock().push_back(item);
        self.wake.notify_one();
    }

    /// Remove and return every currently queued item, in FIFO order.
    pub fn drain(&self) -> Vec<T> {
        self.lock().drain(..).collect()
    }

    /// Atomically discard all queued items.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of currently queued items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the queue is currently empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Wait until a push signals new work.
    ///
    /// A push that happened just before this call leaves a stored permit,
    /// so a single consumer never misses a wakeup between draining and
    /// going back to sleep.
    pub async fn notified(&self) {
        self.wake.notified().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_drain_is_exhaustive_and_ordered() {
        let queue = CommandQueue::new();
        queue.push(1);
        queue.push(2);
        queue.push(3);

        assert_eq!(queue.drain(), vec![1, 2, 3]);
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn test_clear_discards_everything() {
        let queue = CommandQueue::new();
        queue.push("a");
        queue.push("b");

        queue.clear();

        assert!(queue.is_empty());
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn test_len() {
        let queue = CommandQueue::new();
        assert_eq!(queue.len(), 0);
        queue.push(());
        queue.push(());
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_push_after_drain_starts_fresh() {
        let queue = CommandQueue::new();
        queue.push(1);
        assert_eq!(queue.drain(), vec![1]);

        queue.push(2);
        assert_eq!(queue.drain(), vec![2]);
    }

    #[test]
    fn test_concurrent_producers() {
        let queue = Arc::new(CommandQueue::new());
        let mut handles = Vec::new();

        for worker in 0..4 {
            let queue = Arc::clone(&queue);
            handles.push(std::thread::spawn(move || {
                for i in 0..100 {
                    queue.push(worker * 100 + i);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let mut drained = queue.drain();
        assert_eq!(drained.len(), 400);
        drained.sort_unstable();
        drained.dedup();
        assert_eq!(drained.len(), 400);
    }

    #[tokio::test]
    async fn test_notified_wakes_on_push() {
        let queue = Arc::new(CommandQueue::new());

        let waiter = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move {
                queue.notified().await;
                queue.drain()
            })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        queue.push(42);

        let drained = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter must wake")
            .unwrap();
        assert_eq!(drained, vec![42]);
    }

    #[tokio::test]
    async fn test_push_before_wait_leaves_permit() {
        let queue = CommandQueue::new();
        queue.push(1);

        // The stored permit makes this return immediately.
        tokio::time::timeout(Duration::from_millis(100), queue.notified())
            .await
            .expect("stored permit must satisfy the waiter");
    }
}
