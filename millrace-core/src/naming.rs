//! Process naming rules.
//!
//! A process name encodes two orthogonal facts:
//! - `_name_` (leading and trailing underscore) requests co-scheduling on
//!   the launcher's shared worker pool instead of a dedicated thread.
//! - `*name*` (leading and trailing asterisk) marks a process synthesized by
//!   the launcher, e.g. an adapter. The runtime treats these identically;
//!   the marker exists for introspection and logging.

/// True when the given name requests co-scheduling in the launcher's
/// address space (`_name_`).
#[must_use]
pub fn is_co_scheduled(name: &str) -> bool {
    name.starts_with('_') && name.ends_with('_') && !name.is_empty()
}

/// True when the given process was synthesized by the launcher rather than
/// declared in the user's graph (`*name*`).
#[must_use]
pub fn is_framework(name: &str) -> bool {
    name.starts_with('*') && name.ends_with('*') && !name.is_empty()
}

/// How the scheduler should run a process, derived from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnMode {
    /// Dedicated thread, no shared mutable state with the launcher.
    Isolated,
    /// Shared worker pool in the launcher's address space.
    CoScheduled,
}

impl SpawnMode {
    /// Derive the spawn mode from a process name.
    #[must_use]
    pub fn of(name: &str) -> Self {
        if is_co_scheduled(name) {
            Self::CoScheduled
        } else {
            Self::Isolated
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn underscore_wrapped_names_are_co_scheduled() {
        assert!(is_co_scheduled("_tap_"));
        assert!(!is_co_scheduled("tap"));
        assert!(!is_co_scheduled("_tap"));
        assert!(!is_co_scheduled("tap_"));
        assert!(!is_co_scheduled(""));
    }

    #[test]
    fn asterisk_wrapped_names_are_framework() {
        assert!(is_framework("*adapter*"));
        assert!(!is_framework("adapter"));
        assert!(!is_framework("*adapter"));
        assert!(!is_framework(""));
    }

    #[test]
    fn spawn_mode_follows_the_name() {
        assert_eq!(SpawnMode::of("_tap_"), SpawnMode::CoScheduled);
        assert_eq!(SpawnMode::of("pump"), SpawnMode::Isolated);
        // Framework markers do not change the spawn mode.
        assert_eq!(SpawnMode::of("*adapter*"), SpawnMode::Isolated);
    }
}
