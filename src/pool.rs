//! Background worker pool.
//!
//! Jobs go into an unbounded channel drained by a fixed set of named worker
//! threads. Submission never blocks. Dropping the pool lets workers finish
//! everything already queued, then joins them.

use crate::config::PoolConfig;
use crate::core::{DbError, Result};
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, trace};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// A fixed-size pool of worker threads fed by an unbounded queue.
#[derive(Debug)]
pub struct WorkerPool {
    sender: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns `config.worker_threads` workers named `<thread_name>-<n>`.
    ///
    /// # Errors
    ///
    /// `DbError::Config` for a zero-sized pool, `DbError::Io` if a thread
    /// cannot be spawned.
    pub fn new(config: &PoolConfig) -> Result<Self> {
        if config.worker_threads == 0 {
            return Err(DbError::Config(
                "worker pool needs at least one thread".to_string(),
            ));
        }

        let (sender, receiver) = mpsc::channel::<Job>();
        let receiver = Arc::new(Mutex::new(receiver));

        let mut workers = Vec::with_capacity(config.worker_threads);
        for id in 0..config.worker_threads {
            let receiver = Arc::clone(&receiver);
            let handle = thread::Builder::new()
                .name(format!("{}-{}", config.thread_name, id))
                .spawn(move || worker_loop(receiver))?;
            workers.push(handle);
        }
        debug!("Started worker pool with {} threads", workers.len());

        Ok(WorkerPool {
            sender: Some(sender),
            workers,
        })
    }

    /// Queues a job. Returns immediately.
    pub fn execute<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let Some(sender) = &self.sender else {
            return;
        };
        if sender.send(Box::new(job)).is_err() {
            error!("Worker pool has no running workers; job dropped");
        }
    }

    /// Number of worker threads.
    pub fn size(&self) -> usize {
        self.workers.len()
    }
}

fn worker_loop(receiver: Arc<Mutex<Receiver<Job>>>) {
    loop {
        let job = {
            let Ok(guard) = receiver.lock() else {
                break;
            };
            guard.recv()
        };

        match job {
            Ok(job) => {
                trace!("Running job");
                if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
                    error!("Job panicked; worker continues");
                }
            }
            // Sender dropped and queue drained
            Err(_) => break,
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        drop(self.sender.take());

        let current = thread::current().id();
        for handle in self.workers.drain(..) {
            if handle.thread().id() == current {
                continue;
            }
            if handle.join().is_err() {
                error!("Worker thread exited with a panic");
            }
        }
        debug!("Worker pool shut down");
    }
}
