//! Bounded hand-off queue between pipeline stages.
//!
//! With `DropOldest` a slow consumer never stalls its producer: when the
//! queue is full the stalest frame is discarded so the next stage always
//! works on recent input. Frame order is preserved either way.

use std::collections::VecDeque;
use tokio::sync::{Mutex, Notify};

/// What a full queue does with a new item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Discard the oldest queued item
    DropOldest,
    /// Wait for the consumer to make room
    Wait,
}

impl OverflowPolicy {
    /// Live sources drop stale frames; offline sources apply backpressure.
    pub fn for_source(live: bool) -> Self {
        if live {
            OverflowPolicy::DropOldest
        } else {
            OverflowPolicy::Wait
        }
    }
}

/// Result of a push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Queued,
    /// Queued after discarding the oldest item
    DroppedOldest,
    /// Queue closed; item discarded
    Closed,
}

struct QueueState<T> {
    items: VecDeque<T>,
    closed: bool,
    dropped: u64,
}

/// Single-producer, single-consumer bounded queue.
pub struct FrameQueue<T> {
    state: Mutex<QueueState<T>>,
    capacity: usize,
    policy: OverflowPolicy,
    item_ready: Notify,
    space_ready: Notify,
}

impl<T> FrameQueue<T> {
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        let capacity = capacity.max(1);
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::with_capacity(capacity),
                closed: false,
                dropped: 0,
            }),
            capacity,
            policy,
            item_ready: Notify::new(),
            space_ready: Notify::new(),
        }
    }

    pub async fn push(&self, item: T) -> PushOutcome {
        let mut item = Some(item);
        loop {
            {
                let mut state = self.state.lock().await;
                if state.closed {
                    return PushOutcome::Closed;
                }

                let outcome = if state.items.len() < self.capacity {
                    Some(PushOutcome::Queued)
                } else if self.policy == OverflowPolicy::DropOldest {
                    state.items.pop_front();
                    state.dropped += 1;
                    Some(PushOutcome::DroppedOldest)
                } else {
                    None
                };

                if let Some(outcome) = outcome {
                    state.items.extend(item.take());
                    drop(state);
                    self.item_ready.notify_one();
                    return outcome;
                }
            }
            self.space_ready.notified().await;
        }
    }

    /// Next item, or `None` once the queue is closed and drained.
    ///
    /// Cancel safe.
    pub async fn pop(&self) -> Option<T> {
        loop {
            {
                let mut state = self.state.lock().await;
                if let Some(item) = state.items.pop_front() {
                    drop(state);
                    self.space_ready.notify_one();
                    return Some(item);
                }
                if state.closed {
                    return None;
                }
            }
            self.item_ready.notified().await;
        }
    }

    /// Stop accepting items. Queued items can still be popped.
    pub async fn close(&self) {
        self.state.lock().await.closed = true;
        self.item_ready.notify_one();
        self.space_ready.notify_one();
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.items.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Items discarded by `DropOldest` so far.
    pub async fn dropped(&self) -> u64 {
        self.state.lock().await.dropped
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_policy_follows_source_kind() {
        assert_eq!(OverflowPolicy::for_source(true), OverflowPolicy::DropOldest);
        assert_eq!(OverflowPolicy::for_source(false), OverflowPolicy::Wait);
    }

    #[tokio::test]
    async fn test_drop_oldest_keeps_latest() {
        let queue = FrameQueue::new(2, OverflowPolicy::DropOldest);
        assert_eq!(queue.push(1).await, PushOutcome::Queued);
        assert_eq!(queue.push(2).await, PushOutcome::Queued);
        assert_eq!(queue.push(3).await, PushOutcome::DroppedOldest);

        assert_eq!(queue.dropped().await, 1);
        assert_eq!(queue.pop().await, Some(2));
        assert_eq!(queue.pop().await, Some(3));
        assert!(queue.is_empty().await);
    }

    #[tokio::test]
    async fn test_wait_policy_blocks_until_space() {
        let queue = Arc::new(FrameQueue::new(1, OverflowPolicy::Wait));
        queue.push(1).await;

        let producer = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.push(2).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!producer.is_finished());

        assert_eq!(queue.pop().await, Some(1));
        assert_eq!(producer.await.unwrap(), PushOutcome::Queued);
        assert_eq!(queue.pop().await, Some(2));
        assert_eq!(queue.dropped().await, 0);
    }

    #[test]
    fn test_waiting_push_is_woken_by_pop() {
        let queue = FrameQueue::new(1, OverflowPolicy::Wait);
        tokio_test::block_on(queue.push(1));

        let mut push = tokio_test::task::spawn(queue.push(2));
        tokio_test::assert_pending!(push.poll());

        assert_eq!(tokio_test::block_on(queue.pop()), Some(1));
        assert!(push.is_woken());
        assert_eq!(tokio_test::assert_ready!(push.poll()), PushOutcome::Queued);
    }

    #[tokio::test]
    async fn test_close_drains_then_ends() {
        let queue = FrameQueue::new(3, OverflowPolicy::Wait);
        queue.push("a").await;
        queue.close().await;

        assert_eq!(queue.push("b").await, PushOutcome::Closed);
        assert_eq!(queue.pop().await, Some("a"));
        assert_eq!(queue.pop().await, None);
    }

    #[tokio::test]
    async fn test_close_wakes_waiting_consumer() {
        let queue = Arc::new(FrameQueue::<u32>::new(2, OverflowPolicy::Wait));
        let consumer = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.pop().await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        queue.close().await;
        assert_eq!(consumer.await.unwrap(), None);
    }
}
