//! This module defines the error types used by the `tacho-control` crate.

#![warn(missing_docs)]

use tacho_hal::TransportError;

/// Error type for motor control operations.
///
/// Estimator and persistence failures are absorbed inside the engine
/// (degrading to a zero reading or a fallback constant); the variants here
/// are the ones surfaced to the immediate caller.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ControlError {
    /// A non-positive measurement window or tick configuration was supplied.
    #[error("invalid measurement window: {0}")]
    InvalidWindow(&'static str),
    /// A non-positive timestep was passed to the PID step.
    #[error("invalid timestep: {0}")]
    InvalidTimestep(&'static str),
    /// An actuator duty cycle outside `[0, 255]` was supplied.
    #[error("duty cycle {0} is outside the 0..=255 range")]
    OutOfRange(f64),
    /// The hardware transport rejected an operation.
    #[error(transparent)]
    Transport(#[from] TransportError),
}
