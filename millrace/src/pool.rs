//! Cached worker pool for co-scheduled processes.
//!
//! Co-scheduled (`_name_`) processes share the launcher's address space and
//! run on pooled threads instead of dedicated ones. A process blocked on an
//! input holds its worker for as long as it blocks, so the pool must never
//! let a job sit queued while no worker is free: that would let one blocked
//! process starve another of a thread and deadlock an otherwise live graph.
//!
//! The pool therefore tracks spare capacity and grows by one worker whenever
//! a job is submitted with no idle worker left. Idle workers are reused
//! across submissions.

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

pub(crate) type Job = Box<dyn FnOnce() + Send + 'static>;

pub(crate) struct WorkerPool {
    job_tx: flume::Sender<Job>,
    job_rx: flume::Receiver<Job>,
    /// Spare capacity: workers that have finished a job (or initial seeds)
    /// and are not yet reserved by a submission.
    idle: Arc<AtomicUsize>,
    spawned: AtomicUsize,
}

impl WorkerPool {
    /// Create a pool seeded with one worker per CPU.
    pub(crate) fn new() -> io::Result<Self> {
        let (job_tx, job_rx) = flume::unbounded();
        let pool = Self {
            job_tx,
            job_rx,
            idle: Arc::new(AtomicUsize::new(0)),
            spawned: AtomicUsize::new(0),
        };
        for _ in 0..num_cpus::get() {
            pool.spawn_worker()?;
            pool.idle.fetch_add(1, Ordering::Release);
        }
        Ok(pool)
    }

    /// Hand a job to the pool, growing it when no idle worker is left.
    pub(crate) fn execute(&self, job: Job) -> io::Result<()> {
        if !self.reserve_idle() {
            // The new worker is not counted idle; this job is its first.
            self.spawn_worker()?;
        }
        self.job_tx
            .send(job)
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "worker pool shut down"))
    }

    /// Claim one unit of spare capacity, if any.
    fn reserve_idle(&self) -> bool {
        let mut current = self.idle.load(Ordering::Acquire);
        while current > 0 {
            match self.idle.compare_exchange(
                current,
                current - 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
        false
    }

    fn spawn_worker(&self) -> io::Result<()> {
        let job_rx = self.job_rx.clone();
        let idle = Arc::clone(&self.idle);
        let id = self.spawned.fetch_add(1, Ordering::Relaxed);
        thread::Builder::new()
            .name(format!("millrace-worker-{id}"))
            .spawn(move || {
                // Workers exit when the pool (the only sender) is dropped.
                while let Ok(job) = job_rx.recv() {
                    job();
                    idle.fetch_add(1, Ordering::Release);
                }
            })?;
        Ok(())
    }
}
