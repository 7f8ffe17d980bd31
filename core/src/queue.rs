//! Bounded FIFO hand-off queues with an evict-oldest overflow policy.
//!
//! Every stage boundary in the pipeline uses one of these. An enqueue
//! never blocks: when the queue is full the single oldest entry is
//! evicted and the new entry inserted, so consumers always see the most
//! recent data at the cost of bounded loss. Each queue has exactly one
//! producer and one consumer.

use crossbeam::channel::{bounded, Receiver, Sender, TrySendError};
use std::time::Duration;

/// Producer half; retains a receiver handle so it can evict the oldest
/// entry when the channel is full.
pub struct QueueSender<T> {
    tx: Sender<T>,
    evict: Receiver<T>,
}

/// Consumer half.
pub struct QueueReceiver<T> {
    rx: Receiver<T>,
}

/// Creates a bounded queue of the given capacity.
pub fn bounded_queue<T>(capacity: usize) -> (QueueSender<T>, QueueReceiver<T>) {
    let (tx, rx) = bounded(capacity.max(1));
    (
        QueueSender {
            tx,
            evict: rx.clone(),
        },
        QueueReceiver { rx },
    )
}

impl<T> QueueSender<T> {
    /// Inserts `item`, evicting the oldest entry if the queue is full.
    /// Never blocks; a disconnected consumer drops the item silently.
    pub fn push(&self, item: T) {
        let mut item = item;
        loop {
            match self.tx.try_send(item) {
                Ok(()) => return,
                Err(TrySendError::Full(rejected)) => {
                    let _ = self.evict.try_recv();
                    item = rejected;
                }
                Err(TrySendError::Disconnected(_)) => return,
            }
        }
    }
}

impl<T> QueueReceiver<T> {
    /// Waits up to `timeout` for an entry; `None` means no data this
    /// cycle, not an error.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<T> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// Non-blocking dequeue.
    pub fn try_recv(&self) -> Option<T> {
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overflow_keeps_the_newest_entries_in_order() {
        let (tx, rx) = bounded_queue(3);
        for value in 0..7 {
            tx.push(value);
        }
        assert_eq!(rx.try_recv(), Some(4));
        assert_eq!(rx.try_recv(), Some(5));
        assert_eq!(rx.try_recv(), Some(6));
        assert_eq!(rx.try_recv(), None);
    }

    #[test]
    fn timed_dequeue_on_empty_queue_returns_none() {
        let (_tx, rx) = bounded_queue::<u8>(2);
        assert_eq!(rx.recv_timeout(Duration::from_millis(10)), None);
    }

    #[test]
    fn push_after_consumer_drop_does_not_block() {
        let (tx, rx) = bounded_queue(1);
        drop(rx);
        tx.push(1);
        tx.push(2);
    }
}
