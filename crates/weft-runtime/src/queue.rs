#![forbid(unsafe_code)]

//! Bounded FIFO between the input producer and the dispatch loop.
//!
//! Built on `std::sync::mpsc::sync_channel`. A full queue blocks
//! [`QueueSender::send`] until the consumer catches up, so nothing is ever
//! dropped. The consumer uses [`QueueSender::try_send`] for its own requeues
//! since blocking on a queue only it drains would never return.

use std::sync::mpsc::{self, RecvTimeoutError, SyncSender, TrySendError};
use std::time::Duration;

use weft_backend::BackendError;
use weft_core::event::Message;

/// Default queue capacity.
pub const DEFAULT_CAPACITY: usize = 128;

/// Item carried by the queue.
#[derive(Debug)]
pub enum Inbound {
    Message(Message),
    /// The event source failed; the producer has exited.
    SourceFailed(BackendError),
}

/// Create a queue holding at most `capacity` items (minimum 1).
pub fn bounded(capacity: usize) -> (QueueSender, QueueReceiver) {
    let (tx, rx) = mpsc::sync_channel(capacity.max(1));
    (QueueSender { tx }, QueueReceiver { rx })
}

/// Producer side. Cheap to clone.
#[derive(Debug, Clone)]
pub struct QueueSender {
    tx: SyncSender<Inbound>,
}

/// The receiver is gone; the item is returned.
#[derive(Debug)]
pub struct Closed(pub Inbound);

/// Outcome of a failed [`QueueSender::try_send`].
#[derive(Debug)]
pub enum TryPushError {
    /// At capacity; the message is returned.
    Full(Message),
    Closed(Message),
}

impl QueueSender {
    /// Push a message, blocking while the queue is full.
    pub fn send(&self, msg: Message) -> Result<(), Closed> {
        self.tx
            .send(Inbound::Message(msg))
            .map_err(|mpsc::SendError(item)| Closed(item))
    }

    /// Report an event source failure to the consumer.
    pub fn send_failure(&self, err: BackendError) -> Result<(), Closed> {
        self.tx
            .send(Inbound::SourceFailed(err))
            .map_err(|mpsc::SendError(item)| Closed(item))
    }

    /// Push a message without blocking.
    pub fn try_send(&self, msg: Message) -> Result<(), TryPushError> {
        match self.tx.try_send(Inbound::Message(msg)) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(Inbound::Message(msg))) => Err(TryPushError::Full(msg)),
            Err(TrySendError::Disconnected(Inbound::Message(msg))) => {
                Err(TryPushError::Closed(msg))
            }
            // Only messages are pushed through this path.
            Err(TrySendError::Full(Inbound::SourceFailed(_)))
            | Err(TrySendError::Disconnected(Inbound::SourceFailed(_))) => Ok(()),
        }
    }
}

/// Consumer side. There is exactly one.
#[derive(Debug)]
pub struct QueueReceiver {
    rx: mpsc::Receiver<Inbound>,
}

/// Why [`QueueReceiver::recv_timeout`] returned without an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecvError {
    Timeout,
    /// Every sender is gone.
    Disconnected,
}

impl QueueReceiver {
    /// Wait up to `timeout` for the next item.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Inbound, RecvError> {
        self.rx.recv_timeout(timeout).map_err(|err| match err {
            RecvTimeoutError::Timeout => RecvError::Timeout,
            RecvTimeoutError::Disconnected => RecvError::Disconnected,
        })
    }

    /// Wait indefinitely for the next item.
    pub fn recv(&self) -> Result<Inbound, RecvError> {
        self.rx.recv().map_err(|_| RecvError::Disconnected)
    }

    /// Take an item if one is ready.
    pub fn try_recv(&self) -> Option<Inbound> {
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    fn custom(n: u32) -> Message {
        Message::custom(n)
    }

    fn unwrap_custom(item: Inbound) -> u32 {
        match item {
            Inbound::Message(Message::Custom(c)) => *c.downcast_ref::<u32>().unwrap(),
            other => panic!("unexpected item {other:?}"),
        }
    }

    #[test]
    fn try_send_reports_full_and_returns_message() {
        let (tx, rx) = bounded(1);
        tx.try_send(custom(1)).unwrap();
        match tx.try_send(custom(2)) {
            Err(TryPushError::Full(msg)) => {
                assert_eq!(unwrap_custom(Inbound::Message(msg)), 2);
            }
            other => panic!("expected Full, got {other:?}"),
        }
        assert_eq!(unwrap_custom(rx.try_recv().unwrap()), 1);
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let (tx, _rx) = bounded(0);
        assert!(tx.try_send(custom(1)).is_ok());
    }

    #[test]
    fn recv_timeout_times_out() {
        let (_tx, rx) = bounded(4);
        assert_eq!(
            rx.recv_timeout(Duration::from_millis(5)).unwrap_err(),
            RecvError::Timeout
        );
    }

    #[test]
    fn send_after_receiver_drop_is_closed() {
        let (tx, rx) = bounded(4);
        drop(rx);
        assert!(tx.send(custom(1)).is_err());
    }

    #[test]
    fn producer_stalls_at_capacity_and_loses_nothing() {
        const TOTAL: u32 = 200;
        const CAPACITY: usize = 128;

        let (tx, rx) = bounded(CAPACITY);
        let sent = Arc::new(AtomicUsize::new(0));
        let producer = {
            let sent = Arc::clone(&sent);
            thread::spawn(move || {
                for n in 0..TOTAL {
                    tx.send(custom(n)).unwrap();
                    sent.fetch_add(1, Ordering::SeqCst);
                }
            })
        };

        // Consumer is "slow": nothing is drained yet, so the producer parks.
        thread::sleep(Duration::from_millis(100));
        assert_eq!(sent.load(Ordering::SeqCst), CAPACITY);

        let mut received = Vec::new();
        while received.len() < TOTAL as usize {
            let item = rx.recv_timeout(Duration::from_secs(5)).unwrap();
            received.push(unwrap_custom(item));
            thread::sleep(Duration::from_micros(200));
        }
        producer.join().unwrap();
        assert_eq!(received, (0..TOTAL).collect::<Vec<_>>());
    }
}
