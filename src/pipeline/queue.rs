//! Mutex/condvar guarded FIFO shared between producers and one consumer

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// Result of offering an item to a pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueued {
    /// Item was appended to the queue
    Accepted,
    /// Queue is bounded and at capacity; the new item was dropped
    Full,
    /// Pipeline is stopping or stopped; the item was dropped
    Closed,
}

impl Enqueued {
    pub fn is_accepted(self) -> bool {
        matches!(self, Enqueued::Accepted)
    }
}

struct QueueState<T> {
    items: VecDeque<T>,
    stopping: bool,
}

pub(crate) struct SharedQueue<T> {
    state: Mutex<QueueState<T>>,
    ready: Condvar,
    capacity: Option<usize>,
}

impl<T> SharedQueue<T> {
    pub(crate) fn new(capacity: Option<usize>) -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                stopping: false,
            }),
            ready: Condvar::new(),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append to the tail and wake one waiting consumer. Never waits on the consumer.
    pub(crate) fn push(&self, item: T) -> Enqueued {
        let mut state = self.lock();
        if state.stopping {
            return Enqueued::Closed;
        }
        if let Some(capacity) = self.capacity {
            if state.items.len() >= capacity {
                return Enqueued::Full;
            }
        }
        state.items.push_back(item);
        self.ready.notify_one();
        Enqueued::Accepted
    }

    /// Block until an item is available or a stop is requested.
    ///
    /// Returns `None` as soon as the stop flag is observed, even if items are
    /// still queued. Those items are abandoned.
    pub(crate) fn next(&self) -> Option<T> {
        let mut state = self.lock();
        while state.items.is_empty() && !state.stopping {
            state = self
                .ready
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        if state.stopping {
            return None;
        }
        state.items.pop_front()
    }

    /// Set the stop flag and wake every waiter. Returns how many items were
    /// still queued at that moment.
    pub(crate) fn close(&self) -> usize {
        let abandoned = {
            let mut state = self.lock();
            state.stopping = true;
            state.items.len()
        };
        self.ready.notify_all();
        abandoned
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().items.len()
    }
}
