//! Non-blocking handoff between the real-time and tracking contexts.
//!
//! A bounded channel whose producer never waits: when the buffer is full the
//! oldest pending item is discarded to make room for the new one.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, TrySendError};
use tracing::trace;

/// Create a mailbox holding at most `capacity` pending items.
///
/// # Panics
/// Panics if `capacity` is zero.
pub fn mailbox<T>(capacity: usize) -> (MailboxSender<T>, MailboxReceiver<T>) {
    assert!(capacity > 0, "mailbox capacity must be at least 1");
    let (tx, rx) = crossbeam_channel::bounded(capacity);
    let dropped = Arc::new(AtomicU64::new(0));
    let closed = Arc::new(AtomicBool::new(false));
    (
        MailboxSender {
            tx,
            evict: rx.clone(),
            dropped: Arc::clone(&dropped),
            closed: Arc::clone(&closed),
        },
        MailboxReceiver {
            rx,
            dropped,
            closed,
        },
    )
}

/// Item could not be posted because the receiver is gone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disconnected<T>(pub T);

/// Producer side. Cloning is cheap; all clones share one buffer.
#[derive(Debug)]
pub struct MailboxSender<T> {
    tx: Sender<T>,
    evict: Receiver<T>,
    dropped: Arc<AtomicU64>,
    closed: Arc<AtomicBool>,
}

impl<T> Clone for MailboxSender<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            evict: self.evict.clone(),
            dropped: Arc::clone(&self.dropped),
            closed: Arc::clone(&self.closed),
        }
    }
}

impl<T> MailboxSender<T> {
    /// Enqueue `item`, evicting the oldest pending items if the buffer is full.
    ///
    /// Never blocks.
    pub fn post(&self, mut item: T) -> Result<(), Disconnected<T>> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Disconnected(item));
        }
        loop {
            match self.tx.try_send(item) {
                Ok(()) => return Ok(()),
                Err(TrySendError::Disconnected(item)) => return Err(Disconnected(item)),
                Err(TrySendError::Full(rejected)) => {
                    item = rejected;
                    match self.evict.try_recv() {
                        Ok(_) => {
                            let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                            trace!(dropped, "mailbox full, dropped oldest item");
                        }
                        // The consumer emptied the slot in the meantime.
                        Err(TryRecvError::Empty) => {}
                        Err(TryRecvError::Disconnected) => return Err(Disconnected(item)),
                    }
                }
            }
        }
    }

    /// Items evicted so far.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Consumer side, yielding items in the order they were posted.
#[derive(Debug)]
pub struct MailboxReceiver<T> {
    rx: Receiver<T>,
    dropped: Arc<AtomicU64>,
    closed: Arc<AtomicBool>,
}

impl<T> MailboxReceiver<T> {
    /// Block until an item arrives; `None` once every sender is gone and the
    /// buffer is drained.
    pub fn recv(&self) -> Option<T> {
        self.rx.recv().ok()
    }

    pub fn try_recv(&self) -> Option<T> {
        self.rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<T, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl<T> Drop for MailboxReceiver<T> {
    fn drop(&mut self) {
        self.closed.store(true, Ordering::Release);
    }
}

impl<T> Iterator for MailboxReceiver<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.recv()
    }
}
