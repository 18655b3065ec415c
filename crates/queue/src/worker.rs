//! Worker pool.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::job::EmailJob;
use crate::queue::Queue;

/// Processes one leased job. Must absorb all per-job failures; the pool
/// never inspects an outcome.
#[async_trait]
pub trait JobProcessor: Send + Sync {
    /// Handle one job synchronously from the worker's point of view.
    async fn process(&self, job: EmailJob);
}

/// Fixed set of concurrent workers draining a queue.
///
/// Each worker is busy for the full duration of a `process` call, so at
/// most `count` jobs are in flight at once. Workers exit only when the
/// queue reports closed-and-drained, never merely because the stop signal
/// is set; that is what lets a shutdown drain buffered jobs.
pub struct WorkerPool {
    count: usize,
    queue: Arc<dyn Queue>,
    stopping: Arc<AtomicBool>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Create a pool of `count` workers over the given queue.
    #[must_use]
    pub fn new(count: usize, queue: Arc<dyn Queue>) -> Self {
        Self {
            count,
            queue,
            stopping: Arc::new(AtomicBool::new(false)),
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Spawn all workers. Call once at boot.
    pub async fn start(&self, processor: Arc<dyn JobProcessor>) {
        let mut handles = self.handles.lock().await;
        for id in 1..=self.count {
            let queue = self.queue.clone();
            let processor = processor.clone();
            let stopping = self.stopping.clone();
            handles.push(tokio::spawn(worker_loop(id, queue, processor, stopping)));
        }
        info!(count = self.count, "Worker pool started");
    }

    /// Raise the stop signal and wait for every worker to exit.
    ///
    /// The orchestrator must close the queue first; workers keep pulling
    /// until their dequeue runs dry.
    pub async fn stop(&self) {
        self.stopping.store(true, Ordering::SeqCst);
        info!("Signaled workers to stop");

        let mut handles = self.handles.lock().await;
        for handle in handles.drain(..) {
            if let Err(e) = handle.await {
                warn!(error = %e, "Worker task ended abnormally");
            }
        }
        info!("All workers have finished");
    }
}

async fn worker_loop(
    id: usize,
    queue: Arc<dyn Queue>,
    processor: Arc<dyn JobProcessor>,
    stopping: Arc<AtomicBool>,
) {
    debug!(worker = id, "Worker started");
    let mut draining = false;

    loop {
        if !draining && stopping.load(Ordering::SeqCst) {
            // One more drain pass: the queue was closed by the
            // orchestrator, so dequeue will run dry rather than block.
            debug!(worker = id, "Stop signal observed, draining remaining jobs");
            draining = true;
        }

        match queue.dequeue().await {
            Some(job) => processor.process(job).await,
            None => {
                debug!(worker = id, "Queue closed and drained, exiting");
                return;
            }
        }
    }
}
