//! Shared event buffer.
//!
//! The scheduler's worker threads append events continuously; the trace
//! engine reads bounded snapshots. Storage is a fixed-capacity ring
//! that overwrites the oldest events, so a slow reader can never block
//! a writer.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use weft_core::{TraceEvent, WallTime};

/// Default number of events retained, sized for a few seconds of a busy
/// graph.
pub const DEFAULT_CAPACITY: usize = 32 * 1024;

/// A bounded, append-only event buffer.
///
/// When full, the oldest event is overwritten. Iteration yields events
/// in append order.
#[derive(Debug, Clone)]
pub struct EventBuffer {
    events: VecDeque<TraceEvent>,
    capacity: usize,
}

impl EventBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Appends an event, dropping the oldest one if the buffer is full.
    pub fn push(&mut self, event: TraceEvent) {
        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    /// Events in append order, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &TraceEvent> {
        self.events.iter()
    }

    /// Owned copies of the events whose time falls in `[begin, end)`,
    /// in append order.
    pub fn snapshot(&self, begin: WallTime, end: WallTime) -> Vec<TraceEvent> {
        self.iter()
            .filter(|event| event.event_time >= begin && event.event_time < end)
            .cloned()
            .collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl Default for EventBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// Clonable handle sharing one [`EventBuffer`] across writer threads.
///
/// Writers and readers coordinate only through this handle's lock; the
/// trace engine itself takes a plain `&EventBuffer`.
#[derive(Debug, Clone)]
pub struct SharedEventBuffer {
    inner: Arc<Mutex<EventBuffer>>,
}

impl SharedEventBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(EventBuffer::new(capacity))),
        }
    }

    pub fn push(&self, event: TraceEvent) {
        self.lock().push(event);
    }

    pub fn snapshot(&self, begin: WallTime, end: WallTime) -> Vec<TraceEvent> {
        self.lock().snapshot(begin, end)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Locks the underlying buffer. A writer that panicked mid-push
    /// cannot leave the ring torn, so lock poisoning is recovered from
    /// rather than propagated.
    pub fn lock(&self) -> MutexGuard<'_, EventBuffer> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SharedEventBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
