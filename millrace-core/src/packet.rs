//! Opaque information packets.
//!
//! A [`Packet`] is the unit of data moved between processes. The engine never
//! interprets a packet's payload; producers box any `Send` value and consumers
//! downcast it back to the concrete type they expect.

use std::any::Any;
use std::fmt;

/// An opaque information packet.
///
/// # Examples
///
/// ```
/// use millrace_core::packet::Packet;
///
/// let packet = Packet::new(42u32);
/// assert!(packet.is::<u32>());
/// assert_eq!(packet.downcast::<u32>().unwrap(), 42);
/// ```
pub struct Packet(Box<dyn Any + Send>);

impl Packet {
    /// Wrap a value as a packet.
    pub fn new<T: Any + Send>(value: T) -> Self {
        Self(Box::new(value))
    }

    /// Consume the packet, recovering the payload as `T`.
    ///
    /// Returns the packet unchanged when the payload is not a `T`, so a
    /// consumer expecting several types can retry with the next one.
    pub fn downcast<T: Any>(self) -> Result<T, Self> {
        self.0.downcast::<T>().map(|boxed| *boxed).map_err(Self)
    }

    /// Borrow the payload as `T`, or `None` when the type does not match.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }

    /// True when the payload is a `T`.
    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        self.0.is::<T>()
    }
}

impl fmt::Debug for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Packet(..)")
    }
}
