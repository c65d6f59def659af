//! Proportional-integral-derivative controller with a bounded output.

use crate::error::ControlError;

/// Lower bound of the actuator command range.
pub const OUTPUT_MIN: f64 = 0.0;
/// Upper bound of the actuator command range.
pub const OUTPUT_MAX: f64 = 255.0;

/// Stateful PID controller mapping a (setpoint, measurement) pair to a duty
/// cycle in `[OUTPUT_MIN, OUTPUT_MAX]`.
///
/// Gains default to zero, so the controller is inert until configured. The
/// integral accumulator and previous error persist across calls within one
/// continuous session; retuning via [`configure`](Self::configure) does not
/// touch them, and a caller wanting a clean restart calls
/// [`reset`](Self::reset) explicitly.
///
/// The accumulator keeps integrating while the output saturates (no
/// anti-windup clamp on the accumulator itself, only on the final output).
/// Under sustained saturation this produces integral windup; `reset` is the
/// opt-in escape hatch.
#[derive(Debug, Clone, Default)]
pub struct PidController {
    kp: f64,
    ki: f64,
    kd: f64,
    integral: f64,
    prev_error: f64,
}

impl PidController {
    /// Create an inert controller (all gains zero).
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the gains without resetting the accumulated state, so the
    /// loop can be retuned mid-flight.
    pub fn configure(&mut self, kp: f64, ki: f64, kd: f64) {
        self.kp = kp;
        self.ki = ki;
        self.kd = kd;
    }

    /// Current `(kp, ki, kd)` gains.
    pub fn gains(&self) -> (f64, f64, f64) {
        (self.kp, self.ki, self.kd)
    }

    /// Clear the integral accumulator and previous error.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = 0.0;
    }

    /// Advance the controller by one timestep.
    ///
    /// The accumulator and previous error update unconditionally with the
    /// unclamped error, even when the returned output saturates.
    ///
    /// # Errors
    ///
    /// Returns `Err(ControlError::InvalidTimestep)` if `dt` is not positive.
    pub fn step(&mut self, setpoint: f64, measured: f64, dt: f64) -> Result<f64, ControlError> {
        if dt <= 0.0 {
            return Err(ControlError::InvalidTimestep("dt must be positive"));
        }

        let error = setpoint - measured;

        let proportional = self.kp * error;
        self.integral += error * dt;
        let integral = self.ki * self.integral;
        let derivative = self.kd * (error - self.prev_error) / dt;
        self.prev_error = error;

        Ok((proportional + integral + derivative).clamp(OUTPUT_MIN, OUTPUT_MAX))
    }
}
