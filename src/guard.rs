//! In-flight tokens for single-outstanding operations.
//!
//! Each logical resource (PDF rendering, asking the model) owns its own
//! [`InFlight`] so one being busy never blocks the other. Acquiring hands out
//! an RAII [`InFlightToken`]; the busy flag clears when the token is dropped,
//! which also covers early returns through `?` and panics inside the guarded
//! section.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A busy flag that can be held by at most one operation at a time.
#[derive(Debug, Default, Clone)]
pub struct InFlight {
    busy: Arc<AtomicBool>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the resource, or `None` if another operation holds it.
    ///
    /// Callers drop the new request on `None`; nothing is queued.
    pub fn try_acquire(&self) -> Option<InFlightToken> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightToken {
                busy: Arc::clone(&self.busy),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Proof that the holder owns the resource. Releases it on drop.
#[derive(Debug)]
pub struct InFlightToken {
    busy: Arc<AtomicBool>,
}

impl Drop for InFlightToken {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}
