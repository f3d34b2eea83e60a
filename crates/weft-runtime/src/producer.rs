#![forbid(unsafe_code)]

//! Input producer thread.
//!
//! The producer owns the backend's [`EventSource`], polls it with a short
//! timeout and pushes every message into the bounded queue. A full queue
//! blocks it, which is the loop's backpressure. Source errors are forwarded
//! to the consumer and end the producer.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use tracing::{debug, debug_span, error, warn};
use weft_backend::EventSource;

use crate::queue::QueueSender;

/// Read side of a stop flag.
#[derive(Debug, Clone)]
pub(crate) struct StopSignal {
    stopped: Arc<AtomicBool>,
}

impl StopSignal {
    /// Create a (signal, trigger) pair.
    pub(crate) fn new() -> (Self, StopTrigger) {
        let stopped = Arc::new(AtomicBool::new(false));
        let signal = Self {
            stopped: Arc::clone(&stopped),
        };
        (signal, StopTrigger { stopped })
    }

    pub(crate) fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

/// Write side of a stop flag.
#[derive(Debug)]
pub(crate) struct StopTrigger {
    stopped: Arc<AtomicBool>,
}

impl StopTrigger {
    pub(crate) fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }
}

/// Handle to the running producer thread.
///
/// [`InputProducer::stop`] joins the thread. The queue's receiver must be
/// dropped first so a producer blocked on a full queue can exit. Dropping
/// the handle without `stop` only raises the stop flag.
#[derive(Debug)]
pub(crate) struct InputProducer {
    trigger: StopTrigger,
    thread: Option<thread::JoinHandle<()>>,
}

impl InputProducer {
    pub(crate) fn spawn(
        mut source: Box<dyn EventSource>,
        tx: QueueSender,
        poll_timeout: Duration,
    ) -> io::Result<Self> {
        let (signal, trigger) = StopSignal::new();
        let span = debug_span!("weft.input");
        let thread = thread::Builder::new()
            .name("weft-input".into())
            .spawn(move || {
                let _guard = span.enter();
                pump(source.as_mut(), &tx, &signal, poll_timeout);
            })?;
        Ok(Self {
            trigger,
            thread: Some(thread),
        })
    }

    /// Stop the thread and wait for it.
    ///
    /// Waits at most one poll timeout once the receiver is gone.
    pub(crate) fn stop(mut self) {
        self.trigger.stop();
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            warn!("input producer panicked");
        }
    }
}

impl Drop for InputProducer {
    fn drop(&mut self) {
        self.trigger.stop();
    }
}

fn pump(
    source: &mut dyn EventSource,
    tx: &QueueSender,
    stop: &StopSignal,
    poll_timeout: Duration,
) {
    debug!("input producer started");
    let mut forwarded: u64 = 0;
    while !stop.is_stopped() {
        match source.poll_event(poll_timeout) {
            Ok(Some(msg)) => {
                if tx.send(msg).is_err() {
                    break;
                }
                forwarded += 1;
            }
            Ok(None) => {}
            Err(err) => {
                error!(%err, "event source failed");
                let _ = tx.send_failure(err);
                break;
            }
        }
    }
    debug!(forwarded, "input producer stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::{self, Inbound, RecvError};
    use weft_backend::{Backend, BackendError, HeadlessBackend};
    use weft_core::event::Message;

    const POLL: Duration = Duration::from_millis(5);
    const WAIT: Duration = Duration::from_secs(5);

    #[test]
    fn forwards_events_in_order() {
        let mut backend =
            HeadlessBackend::new(1, 1).with_events([Message::char('a'), Message::char('b')]);
        let (tx, rx) = queue::bounded(8);
        let producer = InputProducer::spawn(backend.event_source().unwrap(), tx, POLL).unwrap();

        for expected in ['a', 'b'] {
            match rx.recv_timeout(WAIT).unwrap() {
                Inbound::Message(msg) => assert_eq!(msg, Message::char(expected)),
                other => panic!("unexpected {other:?}"),
            }
        }
        drop(rx);
        producer.stop();
    }

    #[test]
    fn source_error_is_forwarded_and_ends_producer() {
        let mut backend = HeadlessBackend::new(1, 1);
        backend.disconnect();
        let (tx, rx) = queue::bounded(8);
        let producer = InputProducer::spawn(backend.event_source().unwrap(), tx, POLL).unwrap();

        assert!(matches!(
            rx.recv_timeout(WAIT),
            Ok(Inbound::SourceFailed(BackendError::Disconnected))
        ));
        // The producer's sender is gone once it exits.
        assert_eq!(rx.recv_timeout(WAIT).unwrap_err(), RecvError::Disconnected);
        producer.stop();
    }

    #[test]
    fn stop_unblocks_a_producer_stuck_on_a_full_queue() {
        let mut backend = HeadlessBackend::new(1, 1)
            .with_events((0..10).map(|_| Message::char('x')));
        let (tx, rx) = queue::bounded(1);
        let producer = InputProducer::spawn(backend.event_source().unwrap(), tx, POLL).unwrap();

        thread::sleep(Duration::from_millis(30));
        assert!(backend.pending_events() >= 8);
        drop(rx);
        producer.stop();
    }

    #[test]
    fn stop_signal_pairs() {
        let (signal, trigger) = StopSignal::new();
        assert!(!signal.is_stopped());
        trigger.stop();
        assert!(signal.clone().is_stopped());
    }
}
