#![warn(missing_docs)]

//! Hardware transport capability traits for the tacho motor controller.
//!
//! The control engine never talks to a board directly. Everything it needs
//! from the hardware side is captured by the [`Transport`] trait: pin mode
//! configuration, digital and PWM writes, and registration of an edge
//! callback for the encoder channel. A transport implementation may be a
//! serial bridge to a microcontroller, an in-process simulation, or a test
//! double.

use std::sync::Arc;

pub mod error;
pub use error::TransportError;

/// Board pin number.
pub type Pin = u8;

/// Logic level for a digital write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Logic low.
    Low,
    /// Logic high.
    High,
}

/// Handler invoked by the transport on each detected rising edge.
///
/// The transport calls this from its own delivery context (interrupt
/// handler, serial reader thread, ...), so implementations must be
/// non-blocking and bounded-work.
pub type EdgeCallback = Arc<dyn Fn() + Send + Sync>;

/// Capability set the control engine requires from the hardware side.
///
/// Methods are pin-indexed rather than pin-object based because the engine
/// addresses a remote board through a bridge protocol, not memory-mapped
/// peripherals. A transport is expected to reject writes to pins that were
/// never configured for the matching mode.
pub trait Transport {
    /// Configure `pin` as a digital output.
    fn configure_digital_output(&mut self, pin: Pin) -> Result<(), TransportError>;

    /// Configure `pin` as a PWM output.
    fn configure_pwm_output(&mut self, pin: Pin) -> Result<(), TransportError>;

    /// Configure `pin` as a digital input and register `callback` to be
    /// invoked on every rising edge.
    fn configure_edge_input(&mut self, pin: Pin, callback: EdgeCallback)
    -> Result<(), TransportError>;

    /// Drive a configured digital output to `level`.
    fn write_digital(&mut self, pin: Pin, level: Level) -> Result<(), TransportError>;

    /// Write an 8-bit duty cycle to a configured PWM output.
    fn write_pwm(&mut self, pin: Pin, duty: u8) -> Result<(), TransportError>;
}
