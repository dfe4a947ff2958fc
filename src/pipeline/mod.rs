//! Generic producer/consumer pipeline
//!
//! Any number of producer threads enqueue items; a single dedicated thread
//! drains them in order and hands each one to a [`Consumer`]. The queue is
//! unbounded unless a capacity is configured in [`PipelineOptions`].
//!
//! Stopping is cooperative: the consumer checks the stop flag each time it
//! wakes and exits immediately when it is set. Items still queued at that
//! point are never delivered.

mod queue;

pub use queue::Enqueued;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use queue::SharedQueue;

/// Side effect performed by the consumer thread for every dequeued item
pub trait Consumer<T>: Send + 'static {
    fn consume(&mut self, item: T);
}

impl<T, F> Consumer<T> for F
where
    F: FnMut(T) + Send + 'static,
{
    fn consume(&mut self, item: T) {
        self(item)
    }
}

/// Pipeline lifecycle: `Running -> Stopping -> Stopped`, never backwards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Running,
    Stopping,
    Stopped,
}

/// Construction options for a [`Pipeline`]
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Name given to the consumer thread
    pub thread_name: String,
    /// Maximum queued items; `None` means unbounded
    pub capacity: Option<usize>,
}

impl PipelineOptions {
    pub fn new(thread_name: impl Into<String>) -> Self {
        Self {
            thread_name: thread_name.into(),
            capacity: None,
        }
    }

    /// Bound the queue. When full, new items are dropped (drop-newest).
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }
}

struct Control {
    lifecycle: Lifecycle,
    worker: Option<JoinHandle<()>>,
}

/// A queue plus the thread that drains it
pub struct Pipeline<T: Send + 'static> {
    name: String,
    queue: Arc<SharedQueue<T>>,
    control: Mutex<Control>,
    dropped: AtomicU64,
}

impl<T: Send + 'static> Pipeline<T> {
    /// Start the consumer thread and return the producer side
    pub fn spawn<C>(options: PipelineOptions, consumer: C) -> Result<Self>
    where
        C: Consumer<T>,
    {
        let queue = Arc::new(SharedQueue::new(options.capacity));
        let worker_queue = Arc::clone(&queue);

        let worker = thread::Builder::new()
            .name(options.thread_name.clone())
            .spawn(move || run_consumer(worker_queue, consumer))
            .with_context(|| format!("Failed to spawn {} thread", options.thread_name))?;

        debug!(pipeline = %options.thread_name, capacity = ?options.capacity, "Pipeline started");

        Ok(Self {
            name: options.thread_name,
            queue,
            control: Mutex::new(Control {
                lifecycle: Lifecycle::Running,
                worker: Some(worker),
            }),
            dropped: AtomicU64::new(0),
        })
    }

    /// Offer an item to the consumer
    pub fn enqueue(&self, item: T) -> Enqueued {
        let outcome = self.queue.push(item);
        if outcome != Enqueued::Accepted {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
        outcome
    }

    /// Stop the consumer thread and wait for it to finish.
    ///
    /// Only the first call does any work; later calls, including concurrent
    /// ones, return immediately. An item being consumed when the stop arrives
    /// is completed; queued items behind it are dropped.
    pub fn stop(&self) {
        let (worker, abandoned) = {
            let mut control = self.lock_control();
            if control.lifecycle != Lifecycle::Running {
                return;
            }
            control.lifecycle = Lifecycle::Stopping;
            let abandoned = self.queue.close();
            (control.worker.take(), abandoned)
        };

        if abandoned > 0 {
            debug!(pipeline = %self.name, abandoned, "Stopping with undelivered items");
        }

        if let Some(worker) = worker {
            // Called from inside the consumer: it exits on its next wake, so just detach.
            if worker.thread().id() != thread::current().id() && worker.join().is_err() {
                warn!(pipeline = %self.name, "Consumer thread panicked");
            }
        }

        self.lock_control().lifecycle = Lifecycle::Stopped;
        debug!(pipeline = %self.name, "Pipeline stopped");
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lock_control().lifecycle
    }

    /// Items waiting in the queue (not counting one being consumed)
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Items rejected because the queue was full or closed
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn lock_control(&self) -> MutexGuard<'_, Control> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Send + 'static> Drop for Pipeline<T> {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_consumer<T, C: Consumer<T>>(queue: Arc<SharedQueue<T>>, mut consumer: C) {
    while let Some(item) = queue.next() {
        consumer.consume(item);
    }
}
