//! Windowed speed estimation with moving-average smoothing.

use std::collections::VecDeque;
use std::time::Duration;

use spin_sleep::SpinSleeper;
use tracing::warn;

use crate::counter::PulseCounter;
use crate::error::ControlError;

/// Default capacity of the smoothing window.
pub const DEFAULT_SMOOTHING_WINDOW: usize = 10;

/// Convert a pulse count collected over `window_secs` seconds into RPM.
///
/// # Errors
///
/// Returns `Err(ControlError::InvalidWindow)` if the window duration or the
/// tick configuration is not positive.
pub fn raw_rpm(
    pulses: f64,
    ticks_per_revolution: u32,
    window_secs: f64,
) -> Result<f64, ControlError> {
    if window_secs <= 0.0 {
        return Err(ControlError::InvalidWindow("window duration must be positive"));
    }
    if ticks_per_revolution == 0 {
        return Err(ControlError::InvalidWindow("ticks per revolution must be positive"));
    }

    let revolutions = pulses / f64::from(ticks_per_revolution);
    Ok(revolutions / window_secs * 60.0)
}

/// Converts drained pulse counts into a smoothed RPM reading.
///
/// Raw single-window RPM is noisy at low pulse counts, so each reading is
/// averaged over the last `capacity` samples (FIFO eviction). The capacity
/// trades responsiveness for stability; it is not a correctness parameter.
#[derive(Debug)]
pub struct SpeedEstimator {
    counter: PulseCounter,
    ticks_per_revolution: u32,
    window: VecDeque<f64>,
    capacity: usize,
    sleeper: SpinSleeper,
}

impl SpeedEstimator {
    /// Create an estimator draining `counter`, smoothing over `capacity`
    /// samples. A zero capacity is bumped to one sample.
    pub fn new(counter: PulseCounter, ticks_per_revolution: u32, capacity: usize) -> Self {
        Self {
            counter,
            ticks_per_revolution,
            window: VecDeque::with_capacity(capacity.max(1)),
            capacity: capacity.max(1),
            sleeper: SpinSleeper::default(),
        }
    }

    /// Measure the smoothed motor speed over `window`.
    ///
    /// Opens a fresh measurement window on the counter, blocks the calling
    /// context for exactly `window` (the edge-delivery context keeps
    /// running), then converts whatever accumulated. A degenerate window
    /// degrades to a 0.0 reading rather than failing, so a timer-driven
    /// caller keeps its loop alive.
    pub fn measure_speed(&mut self, window: Duration) -> f64 {
        self.counter.reset();
        self.sleeper.sleep(window);
        let pulses = self.counter.read_and_reset();
        self.ingest(pulses, window.as_secs_f64())
    }

    /// Convert an already-collected pulse count and fold it into the
    /// smoothing window, returning the window mean.
    pub fn ingest(&mut self, pulses: f64, window_secs: f64) -> f64 {
        let raw = match raw_rpm(pulses, self.ticks_per_revolution, window_secs) {
            Ok(rpm) => rpm,
            Err(err) => {
                warn!(%err, "speed measurement degraded to zero");
                return 0.0;
            }
        };

        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(raw);

        self.window.iter().sum::<f64>() / self.window.len() as f64
    }

    /// Number of samples currently in the smoothing window.
    pub fn samples(&self) -> usize {
        self.window.len()
    }
}
