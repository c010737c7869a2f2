//! Frame fan-out from the capture callback to independently-paced consumers.
//!
//! Each subscriber owns a bounded queue; delivery is non-blocking with a
//! drop-oldest policy so a slow consumer can never stall the capture thread
//! or another subscriber. Frame loss under sustained slowness is the
//! documented trade-off, surfaced through a dropped-frame counter.

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

/// One fixed-length block of mono i16 PCM captured in one hardware callback.
pub type Frame = Vec<i16>;

struct SubscriberSlot {
    id: u64,
    sender: Sender<Frame>,
    /// Draining handle onto the same channel; popping here discards the
    /// oldest queued frame when the subscriber has fallen behind.
    drain: Receiver<Frame>,
}

struct BusShared {
    subscribers: Mutex<Vec<SubscriberSlot>>,
    next_id: AtomicU64,
    dropped: AtomicUsize,
}

impl BusShared {
    fn lock_subscribers(&self) -> MutexGuard<'_, Vec<SubscriberSlot>> {
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn unregister(&self, id: u64) {
        self.lock_subscribers().retain(|slot| slot.id != id);
    }
}

/// Single-producer, many-consumer frame distributor.
pub struct FrameBus {
    shared: Arc<BusShared>,
    sample_rate: u32,
    frame_samples: usize,
}

impl FrameBus {
    pub fn new(sample_rate: u32, frame_samples: usize) -> Self {
        Self {
            shared: Arc::new(BusShared {
                subscribers: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(0),
                dropped: AtomicUsize::new(0),
            }),
            sample_rate,
            frame_samples: frame_samples.max(1),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn frame_samples(&self) -> usize {
        self.frame_samples
    }

    /// Duration of one nominal frame in milliseconds, never zero.
    pub fn frame_ms(&self) -> u64 {
        ((self.frame_samples as u64 * 1_000) / u64::from(self.sample_rate.max(1))).max(1)
    }

    /// Register a new bounded queue. Safe to call while frames are being
    /// delivered.
    pub fn subscribe(&self, capacity: usize) -> Subscription {
        let capacity = capacity.max(1);
        let (sender, receiver) = bounded(capacity);
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        self.shared.lock_subscribers().push(SubscriberSlot {
            id,
            sender,
            drain: receiver.clone(),
        });
        Subscription {
            id,
            receiver,
            capacity,
            shared: Arc::downgrade(&self.shared),
        }
    }

    /// Deliver one frame to every registered subscriber, copying it per
    /// queue. Never blocks: a full queue loses its oldest frame to make
    /// room, and if the retry still fails the new frame is counted dropped.
    pub fn publish(&self, frame: &[i16]) {
        let subscribers = self.shared.lock_subscribers();
        for slot in subscribers.iter() {
            if slot.sender.try_send(frame.to_vec()).is_ok() {
                continue;
            }
            // Full queue: discard the oldest frame. The consumer may race us
            // and empty the queue first, in which case the retry just wins.
            if slot.drain.try_recv().is_ok() {
                self.shared.dropped.fetch_add(1, Ordering::Relaxed);
            }
            if slot.sender.try_send(frame.to_vec()).is_err() {
                self.shared.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Total frames discarded across all subscribers since construction.
    pub fn dropped_frames(&self) -> usize {
        self.shared.dropped.load(Ordering::Relaxed)
    }

    pub fn subscriber_count(&self) -> usize {
        self.shared.lock_subscribers().len()
    }
}

/// One consumer's bounded, ordered view onto the frame stream. Dropping the
/// subscription unregisters it from the bus so abandoned queues never leak.
pub struct Subscription {
    id: u64,
    receiver: Receiver<Frame>,
    capacity: usize,
    shared: Weak<BusShared>,
}

impl Subscription {
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Blocking receive with a timeout; the cancellation point every
    /// consumer loop is built on.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Frame, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Non-blocking receive, used by tests and drain paths.
    pub fn try_recv(&self) -> Option<Frame> {
        self.receiver.try_recv().ok()
    }

    /// Lazy frame iteration. Yields until the stop flag is raised or the bus
    /// goes away; there is no termination condition of its own.
    pub fn frames<'a>(&'a self, stop_flag: &'a AtomicBool) -> Frames<'a> {
        Frames {
            subscription: self,
            stop_flag,
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.upgrade() {
            shared.unregister(self.id);
        }
    }
}

const FRAME_POLL: Duration = Duration::from_millis(25);

/// Iterator over a subscription's frames with cooperative cancellation.
pub struct Frames<'a> {
    subscription: &'a Subscription,
    stop_flag: &'a AtomicBool,
}

impl Iterator for Frames<'_> {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        loop {
            if self.stop_flag.load(Ordering::Relaxed) {
                return None;
            }
            match self.subscription.recv_timeout(FRAME_POLL) {
                Ok(frame) => return Some(frame),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return None,
            }
        }
    }
}
