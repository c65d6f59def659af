//! Lock-free pulse counter fed by the encoder edge callback.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// Weight of a single rising edge in pulse units.
///
/// The source signal is a single encoder channel; counting each transition
/// as half a pulse approximates twice the resolution of full-cycle counting.
pub const PULSES_PER_EDGE: f64 = 0.5;

/// Shared edge counter for the producer/consumer pair.
///
/// The transport's edge callback is the only producer and the speed
/// estimator is the only consumer. The handle is cheap to clone; all clones
/// observe the same counter. `on_edge` is bounded-work and non-blocking, so
/// it is safe to call from the transport's delivery context.
#[derive(Debug, Clone, Default)]
pub struct PulseCounter {
    edges: Arc<AtomicU32>,
}

impl PulseCounter {
    /// Create a counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one rising edge. Callable from any thread.
    pub fn on_edge(&self) {
        self.edges.fetch_add(1, Ordering::Relaxed);
    }

    /// Atomically take the accumulated pulse count and reset it to zero.
    ///
    /// The swap guarantees an edge arriving concurrently with the reset is
    /// counted exactly once, either in this window's result or the next.
    pub fn read_and_reset(&self) -> f64 {
        f64::from(self.edges.swap(0, Ordering::AcqRel)) * PULSES_PER_EDGE
    }

    /// Discard anything accumulated so far. Used to open a measurement window.
    pub fn reset(&self) {
        self.edges.swap(0, Ordering::AcqRel);
    }
}
