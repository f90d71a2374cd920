//! Point-to-point connections between process ports.
//!
//! A connection is a single-producer/single-consumer FIFO carrying
//! [`Packet`]s plus an explicit end-of-stream signal. Each half is owned by
//! exactly one process; the halves are constructed unidirectionally so there
//! is never an unused half to release at process start.
//!
//! Close semantics:
//! - `close()` is idempotent on either half.
//! - After the sender closes, every buffered packet is still deliverable;
//!   only then does the receiver observe end-of-stream, forever.
//! - Sends after either half closed fail with [`Error::ClosedConnection`].
//!
//! # Example
//!
//! ```
//! use millrace_core::connection::connection;
//! use millrace_core::packet::Packet;
//!
//! let (mut tx, rx) = connection();
//! tx.send(Packet::new("hi")).unwrap();
//! tx.close();
//!
//! // Buffered packet survives the close, then end-of-stream.
//! assert!(rx.recv().is_ok());
//! assert!(rx.recv().unwrap_err().is_end_of_stream());
//! ```

use crate::error::{Error, Result};
use crate::packet::Packet;

/// Create a new connection, returning its two halves.
///
/// The [`Sender`] goes into exactly one process's output port list and the
/// [`Receiver`] into exactly one process's input port list.
#[must_use]
pub fn connection() -> (Sender, Receiver) {
    let (tx, rx) = flume::unbounded();
    (Sender { tx: Some(tx) }, Receiver { rx: Some(rx) })
}

/// Sending half of a connection.
#[derive(Debug)]
pub struct Sender {
    tx: Option<flume::Sender<Packet>>,
}

impl Sender {
    /// Enqueue a packet. Never blocks; the FIFO is unbounded.
    ///
    /// Fails with [`Error::ClosedConnection`] once this half has been closed
    /// or the receiving process has dropped its half. The packet is lost in
    /// that case; callers decide whether that is worth more than a log line.
    pub fn send(&self, packet: Packet) -> Result<()> {
        match &self.tx {
            Some(tx) => tx.send(packet).map_err(|_| Error::ClosedConnection),
            None => Err(Error::ClosedConnection),
        }
    }

    /// Close this half. Idempotent.
    ///
    /// Buffered packets remain deliverable to the receiver; once they are
    /// drained the receiver observes end-of-stream.
    pub fn close(&mut self) {
        self.tx = None;
    }

    /// True once `close` has been called on this half.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_none()
    }
}

/// Receiving half of a connection.
#[derive(Debug)]
pub struct Receiver {
    rx: Option<flume::Receiver<Packet>>,
}

impl Receiver {
    /// Dequeue the next packet, suspending until one is available or the
    /// sender closes.
    ///
    /// Returns [`Error::EndOfStream`] once the sender has closed and the
    /// buffer is drained; reading past end-of-stream keeps returning it.
    pub fn recv(&self) -> Result<Packet> {
        match &self.rx {
            Some(rx) => rx.recv().map_err(|_| Error::EndOfStream),
            None => Err(Error::EndOfStream),
        }
    }

    /// Dequeue the next packet without suspending.
    ///
    /// Returns [`Error::NotReady`] when the FIFO is empty but the sender is
    /// still open, [`Error::EndOfStream`] once closed and drained.
    pub fn try_recv(&self) -> Result<Packet> {
        match &self.rx {
            Some(rx) => match rx.try_recv() {
                Ok(packet) => Ok(packet),
                Err(flume::TryRecvError::Empty) => Err(Error::NotReady),
                Err(flume::TryRecvError::Disconnected) => Err(Error::EndOfStream),
            },
            None => Err(Error::EndOfStream),
        }
    }

    /// Non-destructive readiness check: true iff [`try_recv`](Self::try_recv)
    /// would return a packet right now.
    #[must_use]
    pub fn poll(&self) -> bool {
        self.rx.as_ref().is_some_and(|rx| !rx.is_empty())
    }

    /// Close this half. Idempotent. Subsequent sends from the peer fail.
    pub fn close(&mut self) {
        self.rx = None;
    }

    /// True once `close` has been called on this half.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.rx.is_none()
    }
}
