//! # Millrace
//!
//! A flow-based programming runtime: applications are directed graphs of
//! named **processes** connected by typed **ports**, exchanging opaque
//! **information packets** over point-to-point FIFO connections.
//!
//! ## Architecture
//!
//! Millrace is structured as a small **dataflow kernel** with clean layering:
//!
//! - **`millrace-core`**: packets, connections, port tables, latches,
//!   framework events, and the per-process execution harness
//! - **`millrace`**: public API surface (this crate): the scheduler a
//!   launcher uses to spawn processes and join the graph
//!
//! ## Execution model
//!
//! Every process runs concurrently and owns its connection halves outright;
//! the only shared state in a graph is the FIFO inside each connection (and
//! the latch inside a blocking event). A process terminates when every one
//! of its input connections reaches end-of-stream, so shutting a graph down
//! is nothing more than its sources closing their outputs: the closes ripple
//! downstream by input-exhaustion.
//!
//! Output fan-out load-balances round-robin across a port's connections, and
//! never duplicates a packet. Input fan-in keeps endpoints separate,
//! addressed by index; nothing is merged for you.
//!
//! ## Quick start
//!
//! ```
//! use millrace::prelude::*;
//!
//! # fn main() -> millrace::Result<()> {
//! let (pump_out, sink_in) = connection();
//!
//! let mut scheduler = Scheduler::new()?;
//! scheduler.spawn(
//!     Process::builder("pump").output("out", pump_out).build(),
//!     |p| {
//!         for i in 0..3 {
//!             p.set_data("out", Packet::new(i));
//!         }
//!         Ok(())
//!     },
//! )?;
//! scheduler.spawn(
//!     Process::builder("sink").input("in", sink_in).build(),
//!     |p| loop {
//!         match p.get_data("in") {
//!             Ok(packet) => println!("got {}", packet.downcast::<i32>().unwrap()),
//!             Err(err) if err.is_end_of_stream() => return Ok(()),
//!             Err(err) => return Err(err),
//!         }
//!     },
//! )?;
//! for (_name, result) in scheduler.join() {
//!     result?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Events
//!
//! Every process carries an implicit `events` output port. The harness emits
//! `ReceivedAllInputs` there once data has arrived on all input ports, and
//! user logic can emit its own kinds with
//! [`Process::emit`](millrace_core::process::Process::emit). A kind marked
//! blocking in the process config suspends the emitter until a receiver
//! releases the attached [`Latch`].

#![warn(missing_docs)]

pub use millrace_core::connection::{connection, Receiver, Sender};
pub use millrace_core::error::{Error, Result};
pub use millrace_core::event::{Event, RECEIVED_ALL_INPUTS};
pub use millrace_core::latch::Latch;
pub use millrace_core::naming::{is_co_scheduled, is_framework, SpawnMode};
pub use millrace_core::packet::Packet;
pub use millrace_core::port::{PortTable, EVENTS_PORT};
pub use millrace_core::process::{Process, ProcessBuilder};

pub mod dev_tracing;
mod pool;
pub mod scheduler;

pub use scheduler::{ProcessHandle, Scheduler};

/// One-stop imports for building and launching graphs.
pub mod prelude {
    pub use crate::scheduler::{ProcessHandle, Scheduler};
    pub use millrace_core::prelude::*;
}
