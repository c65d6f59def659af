//! Error types for hardware transports.

#![warn(missing_docs)]

use crate::Pin;

/// Errors a hardware transport can report to the control engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// A write addressed a pin that was never configured.
    #[error("pin {0} has not been configured")]
    UnconfiguredPin(Pin),
    /// A write addressed a pin configured for a different mode.
    #[error("pin {0} is configured for a different mode")]
    WrongMode(Pin),
    /// The link to the board failed.
    #[error("transport link error: {0}")]
    Link(String),
}
