//! Process-wide interrupt bridge.
//!
//! The uniqueness search can run for hours, so the host needs a way to abort
//! it. The bridge is a single monotonic flag: an external interrupt source
//! (typically a SIGINT handler installed by the host, which is deliberately
//! not wired here) calls [`request_stop`], every worker polls the flag
//! between dispatch cycles, and the scheduler drains its workers, resets the
//! flag and reports [`UniquenessError::Interrupted`] to the caller.
//!
//! [`UniquenessError::Interrupted`]: super::UniquenessError::Interrupted

use std::sync::atomic::{AtomicBool, Ordering};

static QUITTING: AtomicBool = AtomicBool::new(false);

/// Ask any in-flight uniqueness search to stop. Safe to call from a signal
/// handler or another thread; the flag is only ever set here, never cleared.
pub fn request_stop() {
    QUITTING.store(true, Ordering::Relaxed);
}

/// Whether an interrupt has been requested and not yet consumed.
pub(crate) fn is_stopping() -> bool {
    QUITTING.load(Ordering::Relaxed)
}

/// Consume the interrupt so the hosting process can run another search.
pub(crate) fn clear() {
    QUITTING.store(false, Ordering::Relaxed);
}
