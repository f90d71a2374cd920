//! Framework events.
//!
//! Every process carries an implicit output port named `events` on which the
//! harness publishes framework notifications. An event travels the graph as
//! an ordinary packet; receivers downcast it back to [`Event`].
//!
//! When a process's config marks an event kind as blocking, the emitted event
//! carries a [`Latch`] and the emitter suspends until some receiver releases
//! it.

use crate::latch::Latch;
use std::fmt;

/// Kind string of the built-in event emitted once per process run, after
/// data has arrived on every input port.
pub const RECEIVED_ALL_INPUTS: &str = "ReceivedAllInputs";

/// A framework notification emitted on a process's `events` port.
#[derive(Debug, Clone)]
pub struct Event {
    /// Name of the emitting process.
    pub sender: String,
    /// Event kind, e.g. [`RECEIVED_ALL_INPUTS`].
    pub kind: String,
    /// Present iff the kind is configured as blocking for the sender;
    /// the receiver must `set` it exactly once to resume the emitter.
    pub blocker: Option<Latch>,
}

impl Event {
    /// Construct a non-blocking event.
    pub fn new(sender: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            kind: kind.into(),
            blocker: None,
        }
    }

    /// Attach a latch, making this a blocking event.
    #[must_use]
    pub fn with_blocker(mut self, latch: Latch) -> Self {
        self.blocker = Some(latch);
        self
    }

    /// True when a latch is attached.
    #[must_use]
    pub fn is_blocking(&self) -> bool {
        self.blocker.is_some()
    }

    /// Release the attached latch, resuming the emitter.
    ///
    /// Returns false when the event carried no latch.
    pub fn release(&self) -> bool {
        match &self.blocker {
            Some(latch) => {
                latch.set();
                true
            }
            None => false,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_blocking() {
            write!(f, "{} from {} (blocking)", self.kind, self.sender)
        } else {
            write!(f, "{} from {}", self.kind, self.sender)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_kind_and_sender() {
        let event = Event::new("pump", RECEIVED_ALL_INPUTS);
        assert_eq!(event.to_string(), "ReceivedAllInputs from pump");
    }

    #[test]
    fn release_without_latch_is_a_noop() {
        let event = Event::new("pump", "Halt");
        assert!(!event.is_blocking());
        assert!(!event.release());
    }

    #[test]
    fn release_sets_the_shared_latch() {
        let latch = Latch::new();
        let event = Event::new("pump", "Halt").with_blocker(latch.clone());
        assert!(event.is_blocking());
        assert!(event.release());
        assert!(latch.is_set());
    }
}
