//! Development helper for watching a graph run.

use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Initialize a tracing subscriber for graph debugging when `RUST_LOG`
/// holds a usable filter.
///
/// Isolated processes run on threads named `millrace-<process>` and pool
/// workers on `millrace-worker-<n>`, so thread names are printed to tie
/// each `BGIN`/`SEND`/`RECV`/`CONN`/`WAIT`/`END` line to the process that
/// produced it; the target column is dropped because the thread name
/// carries more signal here. Loses the install race quietly when the host
/// application already set a subscriber up.
pub fn init_tracing() {
    let Ok(filter) = EnvFilter::try_from_default_env() else {
        return;
    };
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .with_target(false)
        .try_init()
        .is_ok();
    if installed {
        debug!("lifecycle tracing enabled (BGIN/SEND/RECV/CONN/WAIT/END)");
    }
}
