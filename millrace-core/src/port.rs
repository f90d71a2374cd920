//! Named port tables.
//!
//! A port is a named, directional attachment point holding an ordered list of
//! connection endpoints (indexed `0..k`). The same table type serves both
//! directions: `PortTable<Receiver>` for inputs, `PortTable<Sender>` for
//! outputs. A port with zero endpoints is legal; it is a no-op sink on the
//! output side and a never-ready source on the input side.

use hashbrown::HashMap;
use smallvec::SmallVec;

/// Name of the implicit output port every process carries for framework
/// events. The launcher guarantees an entry exists before the process starts.
pub const EVENTS_PORT: &str = "events";

// Most ports have exactly one connection; fan-in/fan-out stays small.
type Endpoints<T> = SmallVec<[T; 2]>;

/// Ordered connection endpoints keyed by port name.
#[derive(Debug)]
pub struct PortTable<T> {
    ports: HashMap<String, Endpoints<T>>,
}

impl<T> PortTable<T> {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ports: HashMap::new(),
        }
    }

    /// Append an endpoint to the named port's list, creating the port on
    /// first use. Endpoint indices follow attachment order.
    pub fn attach(&mut self, port: impl Into<String>, endpoint: T) {
        self.ports.entry(port.into()).or_default().push(endpoint);
    }

    /// Ensure the named port exists, with an empty endpoint list if it was
    /// absent.
    pub fn ensure(&mut self, port: impl Into<String>) {
        self.ports.entry(port.into()).or_default();
    }

    /// The endpoints of the named port, or `None` when the name is absent.
    #[must_use]
    pub fn get(&self, port: &str) -> Option<&[T]> {
        self.ports.get(port).map(SmallVec::as_slice)
    }

    /// Number of endpoints on the named port, or `None` when absent.
    #[must_use]
    pub fn len_at(&self, port: &str) -> Option<usize> {
        self.ports.get(port).map(SmallVec::len)
    }

    /// True when the named port exists, even with zero endpoints.
    #[must_use]
    pub fn contains(&self, port: &str) -> bool {
        self.ports.contains_key(port)
    }

    /// Iterate over the port names in the table.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.ports.keys().map(String::as_str)
    }

    /// Iterate mutably over every port and its endpoints, e.g. to close them
    /// on process exit.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut [T])> {
        self.ports
            .iter_mut()
            .map(|(name, endpoints)| (name.as_str(), endpoints.as_mut_slice()))
    }

    /// Number of ports (not endpoints) in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ports.len()
    }

    /// True when the table holds no ports at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }
}

impl<T> Default for PortTable<T> {
    fn default() -> Self {
        Self::new()
    }
}
