//! Cooperative shutdown signal shared by the controller and every stage.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// One-way shutdown latch.
///
/// The controller owns the only code paths that trigger it (an external
/// stop request, or a fatal stage error escalating). Stages read it at unit
/// boundaries and never mid-unit, so no chunk is ever torn in half.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    triggered: Arc<AtomicBool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latches the signal. Idempotent.
    pub fn trigger(&self) {
        self.triggered.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_untriggered() {
        assert!(!ShutdownSignal::new().is_triggered());
    }

    #[test]
    fn trigger_latches() {
        let signal = ShutdownSignal::new();
        signal.trigger();
        assert!(signal.is_triggered());
        signal.trigger();
        assert!(signal.is_triggered());
    }

    #[test]
    fn clones_observe_the_same_latch() {
        let signal = ShutdownSignal::new();
        let observer = signal.clone();
        assert!(!observer.is_triggered());
        signal.trigger();
        assert!(observer.is_triggered());
    }
}
