//! One-shot latch for blocking events.
//!
//! A [`Latch`] starts unset; the first `set` releases every current and
//! future `wait`, and further `set` calls are no-ops. Clones share the same
//! underlying flag, so the emitter of a blocking event can wait on the latch
//! it attached while the receiver sets the clone it was handed.

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;

/// One-shot synchronization object: one `set` releases all `wait`s.
#[derive(Debug, Clone, Default)]
pub struct Latch {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    set: Mutex<bool>,
    cond: Condvar,
}

impl Latch {
    /// Create a new, unset latch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Release the latch. Idempotent.
    pub fn set(&self) {
        let mut set = self.inner.set.lock();
        if !*set {
            *set = true;
            self.inner.cond.notify_all();
        }
    }

    /// Suspend the calling thread until the latch is set.
    ///
    /// Returns immediately when the latch was already set.
    pub fn wait(&self) {
        let mut set = self.inner.set.lock();
        while !*set {
            self.inner.cond.wait(&mut set);
        }
    }

    /// True once the latch has been set.
    #[must_use]
    pub fn is_set(&self) -> bool {
        *self.inner.set.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn set_before_wait_does_not_block() {
        let latch = Latch::new();
        latch.set();
        latch.wait();
        assert!(latch.is_set());
    }

    #[test]
    fn set_is_idempotent() {
        let latch = Latch::new();
        latch.set();
        latch.set();
        assert!(latch.is_set());
    }

    #[test]
    fn wait_releases_when_peer_sets() {
        let latch = Latch::new();
        let peer = latch.clone();
        let releaser = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            peer.set();
        });
        latch.wait();
        assert!(latch.is_set());
        releaser.join().unwrap();
    }

    #[test]
    fn one_set_releases_all_waiters() {
        let latch = Latch::new();
        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let latch = latch.clone();
                thread::spawn(move || latch.wait())
            })
            .collect();
        thread::sleep(Duration::from_millis(10));
        latch.set();
        for waiter in waiters {
            waiter.join().unwrap();
        }
    }
}
