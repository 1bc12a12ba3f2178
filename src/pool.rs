//! Fixed-size background worker pool.
//!
//! Jobs go through a bounded queue: [`WorkerPool::submit`] blocks while the queue is full.
//! A job that panics is caught so its worker keeps serving the queue.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::mpsc::{Receiver, SyncSender, sync_channel};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use tracing::{debug, error};

use crate::error::{MappingError, Result};

type Job = Box<dyn FnOnce() + Send + 'static>;

pub struct WorkerPool {
    tx: Mutex<Option<SyncSender<Job>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

/// Result slot of one submitted job. Dropping it does not cancel the job.
#[derive(Debug)]
pub struct JobHandle<T> {
    rx: Receiver<T>,
}

impl<T> JobHandle<T> {
    /// Blocks until the job finishes. Fails with [`MappingError::PoolClosed`] if the job
    /// panicked or was discarded without running.
    pub fn wait(self) -> Result<T> {
        self.rx.recv().map_err(|_| MappingError::PoolClosed)
    }
}

impl WorkerPool {
    pub fn new(workers: usize, queue_capacity: usize) -> Self {
        let (tx, rx) = sync_channel::<Job>(queue_capacity.max(1));
        let rx = Arc::new(Mutex::new(rx));
        let handles = (0..workers.max(1))
            .map(|id| {
                let rx = Arc::clone(&rx);
                std::thread::spawn(move || worker_loop(id, rx))
            })
            .collect();

        Self {
            tx: Mutex::new(Some(tx)),
            workers: Mutex::new(handles),
        }
    }

    pub fn submit<T, F>(&self, job: F) -> Result<JobHandle<T>>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let tx = self
            .tx
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
            .ok_or(MappingError::PoolClosed)?;

        let (result_tx, result_rx) = sync_channel(1);
        let boxed: Job = Box::new(move || {
            let _ = result_tx.send(job());
        });
        tx.send(boxed).map_err(|_| MappingError::PoolClosed)?;
        Ok(JobHandle { rx: result_rx })
    }

    /// Stops accepting jobs, runs everything already queued, then joins the workers.
    pub fn shutdown_and_drain(&self) {
        self.tx
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        let handles = std::mem::take(
            &mut *self
                .workers
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        );
        for handle in handles {
            let _ = handle.join();
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown_and_drain();
    }
}

fn worker_loop(id: usize, rx: Arc<Mutex<Receiver<Job>>>) {
    loop {
        let job = {
            let rx = rx.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            rx.recv()
        };
        let Ok(job) = job else {
            debug!(worker = id, "queue closed, worker exiting");
            return;
        };
        if catch_unwind(AssertUnwindSafe(job)).is_err() {
            error!(worker = id, "background job panicked");
        }
    }
}
