//! Millrace Core
//!
//! This crate contains the runtime-agnostic core building blocks of the
//! millrace flow-based programming engine:
//! - Opaque information packets (`packet`)
//! - Single-producer/single-consumer connections with explicit close (`connection`)
//! - Named, ordered port tables (`port`)
//! - One-shot latch for blocking events (`latch`)
//! - Framework events and the `events` port conventions (`event`)
//! - Process naming rules (`naming`)
//! - The per-process execution harness (`process`)
//! - Error types (`error`)

#![deny(unsafe_code)]
// Allow some pedantic lints that are intentional in this crate
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
pub mod connection;
pub mod error;
pub mod event;
pub mod latch;
pub mod naming;
pub mod packet;
pub mod port;
pub mod process;

// Optional: a small prelude to make downstream crates ergonomic.
// Keep it minimal to avoid API lock-in.
pub mod prelude {
    pub use crate::connection::{connection, Receiver, Sender};
    pub use crate::error::{Error, Result};
    pub use crate::event::{Event, RECEIVED_ALL_INPUTS};
    pub use crate::latch::Latch;
    pub use crate::naming::{is_co_scheduled, is_framework, SpawnMode};
    pub use crate::packet::Packet;
    pub use crate::port::{PortTable, EVENTS_PORT};
    pub use crate::process::{Process, ProcessBuilder};
}
