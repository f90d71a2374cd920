//! Launcher-facing surface: spawn processes and join the graph.
//!
//! The external launcher builds connections with
//! [`connection`](millrace_core::connection::connection), groups the halves
//! into per-process port tables via
//! [`Process::builder`](millrace_core::process::Process::builder), then hands
//! each process to [`Scheduler::spawn`]. The scheduler decides the execution
//! vehicle from the process name: isolated processes get a dedicated named
//! thread; co-scheduled (`_name_`) processes run on the shared worker pool in
//! the launcher's address space. Either way the process communicates only
//! through its connections.

use std::thread;

use tracing::debug;

use millrace_core::error::{Error, Result};
use millrace_core::naming::SpawnMode;
use millrace_core::process::Process;

use crate::pool::WorkerPool;

/// Spawns processes and collects their results.
pub struct Scheduler {
    pool: WorkerPool,
    handles: Vec<ProcessHandle>,
}

impl Scheduler {
    /// Create a scheduler with a worker pool for co-scheduled processes.
    pub fn new() -> Result<Self> {
        Ok(Self {
            pool: WorkerPool::new()?,
            handles: Vec::new(),
        })
    }

    /// Start a process under the harness, choosing the execution vehicle
    /// from its name.
    pub fn spawn<F>(&mut self, process: Process, logic: F) -> Result<()>
    where
        F: FnOnce(&mut Process) -> Result<()> + Send + 'static,
    {
        let name = process.name().to_string();
        let mode = SpawnMode::of(&name);
        let (done_tx, done_rx) = flume::bounded(1);
        let job = move || {
            let result = process.run(logic);
            let _ = done_tx.send(result);
        };
        match mode {
            SpawnMode::Isolated => {
                // Detach: completion is reported over the done channel.
                let _ = thread::Builder::new()
                    .name(format!("millrace-{name}"))
                    .spawn(job)?;
            }
            SpawnMode::CoScheduled => self.pool.execute(Box::new(job))?,
        }
        debug!(process = %name, ?mode, "spawned");
        self.handles.push(ProcessHandle {
            name,
            mode,
            done: done_rx,
        });
        Ok(())
    }

    /// Handles of every process spawned so far, in spawn order.
    #[must_use]
    pub fn handles(&self) -> &[ProcessHandle] {
        &self.handles
    }

    /// Wait for every spawned process to exit and return `(name, result)`
    /// pairs in spawn order. A process's result is `Err(UserLogic)` when its
    /// logic failed or panicked; the graph still shut down cleanly.
    pub fn join(&mut self) -> Vec<(String, Result<()>)> {
        self.handles
            .drain(..)
            .map(|handle| {
                let name = handle.name.clone();
                (name, handle.join())
            })
            .collect()
    }
}

/// Handle to one spawned process.
pub struct ProcessHandle {
    name: String,
    mode: SpawnMode,
    done: flume::Receiver<Result<()>>,
}

impl ProcessHandle {
    /// The process name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// How the process was scheduled.
    #[must_use]
    pub fn mode(&self) -> SpawnMode {
        self.mode
    }

    /// Wait for the process to exit and return its result.
    pub fn join(self) -> Result<()> {
        self.done
            .recv()
            .unwrap_or_else(|_| Err(Error::UserLogic(String::from("process exited without reporting"))))
    }
}
