//! Motor actuator: applies direction and duty to the hardware transport.

use tacho_hal::{Level, Pin, Transport};
use tracing::debug;

use crate::error::ControlError;

/// Current actuator state. The motor runs in a single fixed forward
/// direction; reversal is out of scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorState {
    /// Direction line low, duty 0.
    Stopped,
    /// Direction line high (forward), PWM at `duty`.
    Running {
        /// Applied 8-bit duty cycle.
        duty: u8,
    },
}

/// Two-state actuator over a [`Transport`].
///
/// Duty validation is strict: `start` rejects a duty outside `[0, 255]`
/// before touching the hardware. The PID output stage already clamps into
/// that range, so the closed-loop path never trips the check.
#[derive(Debug)]
pub struct MotorActuator<T: Transport> {
    transport: T,
    pwm_pin: Pin,
    dir_pin: Pin,
    state: ActuatorState,
}

impl<T: Transport> MotorActuator<T> {
    /// Wrap a transport whose pins are already configured.
    pub fn new(transport: T, pwm_pin: Pin, dir_pin: Pin) -> Self {
        Self {
            transport,
            pwm_pin,
            dir_pin,
            state: ActuatorState::Stopped,
        }
    }

    /// Run forward at `duty`.
    ///
    /// # Errors
    ///
    /// Returns `Err(ControlError::OutOfRange)` for a duty outside `[0, 255]`
    /// (no hardware write is performed), or a transport error if a write
    /// fails.
    pub fn start(&mut self, duty: f64) -> Result<(), ControlError> {
        if !(OUTPUT_RANGE).contains(&duty) {
            return Err(ControlError::OutOfRange(duty));
        }
        let duty = duty.round() as u8;

        self.transport.write_digital(self.dir_pin, Level::High)?;
        self.transport.write_pwm(self.pwm_pin, duty)?;
        self.state = ActuatorState::Running { duty };
        debug!(duty, "motor running");
        Ok(())
    }

    /// Stop the motor: duty 0, direction line released. Idempotent.
    pub fn stop(&mut self) -> Result<(), ControlError> {
        self.transport.write_pwm(self.pwm_pin, 0)?;
        self.transport.write_digital(self.dir_pin, Level::Low)?;
        self.state = ActuatorState::Stopped;
        debug!("motor stopped");
        Ok(())
    }

    /// Current state.
    pub fn state(&self) -> ActuatorState {
        self.state
    }

    /// Access the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }
}

const OUTPUT_RANGE: std::ops::RangeInclusive<f64> = 0.0..=255.0;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tacho_hal::{EdgeCallback, TransportError};

    /// Records every write so tests can assert on the hardware traffic.
    #[derive(Debug, Clone, Default)]
    struct RecordingTransport {
        writes: Arc<Mutex<Vec<(Pin, String)>>>,
    }

    impl RecordingTransport {
        fn writes(&self) -> Vec<(Pin, String)> {
            self.writes.lock().unwrap().clone()
        }
    }

    impl Transport for RecordingTransport {
        fn configure_digital_output(&mut self, _pin: Pin) -> Result<(), TransportError> {
            Ok(())
        }

        fn configure_pwm_output(&mut self, _pin: Pin) -> Result<(), TransportError> {
            Ok(())
        }

        fn configure_edge_input(
            &mut self,
            _pin: Pin,
            _callback: EdgeCallback,
        ) -> Result<(), TransportError> {
            Ok(())
        }

        fn write_digital(&mut self, pin: Pin, level: Level) -> Result<(), TransportError> {
            self.writes.lock().unwrap().push((pin, format!("{level:?}")));
            Ok(())
        }

        fn write_pwm(&mut self, pin: Pin, duty: u8) -> Result<(), TransportError> {
            self.writes.lock().unwrap().push((pin, format!("pwm {duty}")));
            Ok(())
        }
    }

    const PWM: Pin = 3;
    const DIR: Pin = 12;

    #[test]
    fn test_start_drives_direction_and_duty() {
        let transport = RecordingTransport::default();
        let mut actuator = MotorActuator::new(transport.clone(), PWM, DIR);

        actuator.start(128.0).unwrap();
        assert_eq!(actuator.state(), ActuatorState::Running { duty: 128 });
        assert_eq!(
            transport.writes(),
            vec![(DIR, "High".to_string()), (PWM, "pwm 128".to_string())]
        );
    }

    #[test]
    fn test_out_of_range_duty_is_rejected_without_hardware_write() {
        let transport = RecordingTransport::default();
        let mut actuator = MotorActuator::new(transport.clone(), PWM, DIR);

        assert!(matches!(actuator.start(300.0), Err(ControlError::OutOfRange(_))));
        assert!(matches!(actuator.start(-1.0), Err(ControlError::OutOfRange(_))));
        assert!(matches!(actuator.start(f64::NAN), Err(ControlError::OutOfRange(_))));
        assert_eq!(actuator.state(), ActuatorState::Stopped);
        assert!(transport.writes().is_empty());
    }

    #[test]
    fn test_boundary_duties_are_accepted() {
        let transport = RecordingTransport::default();
        let mut actuator = MotorActuator::new(transport, PWM, DIR);
        actuator.start(0.0).unwrap();
        assert_eq!(actuator.state(), ActuatorState::Running { duty: 0 });
        actuator.start(255.0).unwrap();
        assert_eq!(actuator.state(), ActuatorState::Running { duty: 255 });
    }

    #[test]
    fn test_stop_always_lands_in_stopped() {
        let transport = RecordingTransport::default();
        let mut actuator = MotorActuator::new(transport.clone(), PWM, DIR);

        actuator.start(200.0).unwrap();
        actuator.stop().unwrap();
        assert_eq!(actuator.state(), ActuatorState::Stopped);

        // Idempotent: stopping again writes duty 0 unconditionally.
        actuator.stop().unwrap();
        assert_eq!(actuator.state(), ActuatorState::Stopped);
        let writes = transport.writes();
        assert_eq!(writes.last(), Some(&(DIR, "Low".to_string())));
    }
}
