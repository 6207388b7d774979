use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic render generation shared between the coordinator and row tasks.
///
/// Every new pass advances the version by exactly one. Tasks capture the
/// version they were submitted under and compare it against the live value:
/// a mismatch means their pass was superseded. Advancing never interrupts a
/// task that is already computing; it only makes its result stale.
#[derive(Debug, Default)]
pub struct RenderVersion {
    current: AtomicU64,
}

impl RenderVersion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new generation and return it.
    pub fn advance(&self) -> u64 {
        self.current.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn current(&self) -> u64 {
        self.current.load(Ordering::SeqCst)
    }

    #[inline]
    pub fn is_current(&self, version: u64) -> bool {
        self.current() == version
    }
}
