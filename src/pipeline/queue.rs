//! Ordered hand-off queues between adjacent pipeline stages.
//!
//! Every queue carries either a payload or an explicit end-of-stream marker,
//! so termination can never be confused with a valid item. Each queue has
//! exactly one producer and one consumer; neither end is cloneable.

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded};
use std::time::Duration;

/// One slot on a stage queue: a payload or the terminal marker.
#[derive(Debug, Clone, PartialEq)]
pub enum StageItem<T> {
    Item(T),
    /// No further items will arrive on this queue.
    EndOfStream,
}

/// The consumer side of the queue is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueClosed;

/// Error from a non-blocking send attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrySendError {
    /// The queue is at capacity; the item was not enqueued.
    Full,
    /// The consumer side of the queue is gone.
    Closed,
}

/// Creates a bounded stage queue.
///
/// A full queue blocks the producer on `send`, which is the pipeline's
/// backpressure mechanism.
pub fn stage_queue<T>(capacity: usize) -> (StageSender<T>, StageReceiver<T>) {
    let (tx, rx) = bounded(capacity);
    (
        StageSender {
            tx,
            finished: false,
        },
        StageReceiver { rx },
    )
}

/// Producer end of a stage queue.
pub struct StageSender<T> {
    tx: Sender<StageItem<T>>,
    finished: bool,
}

impl<T> StageSender<T> {
    /// Enqueues one item, blocking while the queue is full.
    pub fn send(&self, item: T) -> Result<(), QueueClosed> {
        self.tx.send(StageItem::Item(item)).map_err(|_| QueueClosed)
    }

    /// Enqueues one item without blocking. Real-time producers use this and
    /// drop the item when the consumer has fallen behind.
    pub fn try_send(&self, item: T) -> Result<(), TrySendError> {
        self.tx
            .try_send(StageItem::Item(item))
            .map_err(|e| match e {
                crossbeam_channel::TrySendError::Full(_) => TrySendError::Full,
                crossbeam_channel::TrySendError::Disconnected(_) => TrySendError::Closed,
            })
    }

    /// Marks the stream as ended. Idempotent: the end-of-stream marker is
    /// delivered at most once per queue.
    pub fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        // The consumer may already be gone during shutdown; there is
        // nothing left to signal then.
        let _ = self.tx.send(StageItem::EndOfStream);
    }

    /// True once `finish` has run.
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

/// Consumer end of a stage queue.
pub struct StageReceiver<T> {
    rx: Receiver<StageItem<T>>,
}

impl<T> StageReceiver<T> {
    /// Waits up to `timeout` for the next slot. Returns `None` on timeout
    /// so the caller can re-check the shutdown signal between units.
    ///
    /// A disconnected queue reads as end-of-stream: a producer that died
    /// without finishing must not wedge its consumer.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<StageItem<T>> {
        match self.rx.recv_timeout(timeout) {
            Ok(item) => Some(item),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(StageItem::EndOfStream),
        }
    }

    /// Blocks for the next slot. A disconnected queue reads as
    /// end-of-stream.
    pub fn recv(&self) -> StageItem<T> {
        self.rx.recv().unwrap_or(StageItem::EndOfStream)
    }
}
