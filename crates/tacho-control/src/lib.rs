#![warn(missing_docs)]

//! Speed-control engine for a brushed DC motor behind a microcontroller
//! bridge.
//!
//! The engine closes a speed loop from a single-channel encoder: an
//! asynchronous [`PulseCounter`] accumulates rising edges delivered by the
//! transport, a [`SpeedEstimator`] drains it into a smoothed RPM reading,
//! a [`MaxSpeedTracker`] learns the achievable ceiling across runs, and a
//! [`PidController`] maps the setpoint/measurement pair to a bounded duty
//! cycle applied through the [`MotorActuator`]. The [`MotorController`]
//! facade ties the parts together over a [`tacho_hal::Transport`].

pub mod actuator;
pub mod controller;
pub mod counter;
pub mod error;
pub mod estimator;
pub mod pid;
pub mod tracker;

pub use actuator::{ActuatorState, MotorActuator};
pub use controller::{MotorConfig, MotorController};
pub use counter::PulseCounter;
pub use error::ControlError;
pub use estimator::{DEFAULT_SMOOTHING_WINDOW, SpeedEstimator};
pub use pid::PidController;
pub use tracker::{DEFAULT_MAX_RPM, MaxSpeedTracker};
