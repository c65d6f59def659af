//! Running maximum of observed motor speed, persisted across runs.

use std::path::Path;

use tracing::{info, warn};

/// Fallback ceiling used when no persisted record is available.
pub const DEFAULT_MAX_RPM: f64 = 1600.0;

/// Label written in front of the persisted value.
const RECORD_LABEL: &str = "max";

/// Tracks the highest non-zero smoothed speed observed since process start.
///
/// Zero readings never update the maximum: at startup, or with the motor
/// stopped, a spurious zero-pulse window must not reset a previously learned
/// ceiling. Callers use the tracked value to rescale setpoint ranges to the
/// empirically achievable RPM.
#[derive(Debug, Clone, PartialEq)]
pub struct MaxSpeedTracker {
    max_rpm: f64,
}

impl Default for MaxSpeedTracker {
    fn default() -> Self {
        Self { max_rpm: DEFAULT_MAX_RPM }
    }
}

impl MaxSpeedTracker {
    /// Create a tracker seeded with `seed_rpm`.
    pub fn new(seed_rpm: f64) -> Self {
        Self { max_rpm: seed_rpm }
    }

    /// Seed a tracker from a persisted `<label>: <value>` record.
    ///
    /// A missing file or malformed content falls back to
    /// [`DEFAULT_MAX_RPM`]; persistence problems are logged, never surfaced.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(contents) => match parse_record(&contents) {
                Some(rpm) => {
                    info!(rpm, path = %path.display(), "seeded max speed from persisted record");
                    Self::new(rpm)
                }
                None => {
                    warn!(path = %path.display(), "malformed max-speed record, using fallback");
                    Self::default()
                }
            },
            Err(err) => {
                warn!(%err, path = %path.display(), "no max-speed record, using fallback");
                Self::default()
            }
        }
    }

    /// Fold a smoothed reading into the running maximum. Zero is ignored.
    pub fn observe(&mut self, rpm: f64) {
        if rpm != 0.0 {
            self.max_rpm = self.max_rpm.max(rpm);
        }
    }

    /// The highest non-zero speed observed, or the seed if none was.
    pub fn max_speed(&self) -> f64 {
        self.max_rpm
    }

    /// Persist the current maximum as a single `max: <value>` line.
    ///
    /// Failures are logged and absorbed, matching the load path.
    pub fn save(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let record = format!("{}: {}\n", RECORD_LABEL, self.max_rpm);
        if let Err(err) = std::fs::write(path, record) {
            warn!(%err, path = %path.display(), "failed to persist max-speed record");
        }
    }
}

/// Parse a `<label>: <value>` line, taking the float after the first colon.
fn parse_record(contents: &str) -> Option<f64> {
    let (_, value) = contents.split_once(':')?;
    value.trim().parse().ok()
}
