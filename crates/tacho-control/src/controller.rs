//! The motor-control engine facade wired over a hardware transport.

use std::sync::Arc;
use std::time::Duration;

use tacho_hal::{Pin, Transport};
use tracing::info;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::actuator::{ActuatorState, MotorActuator};
use crate::counter::PulseCounter;
use crate::error::ControlError;
use crate::estimator::SpeedEstimator;
use crate::pid::PidController;
use crate::tracker::MaxSpeedTracker;

/// Pin assignment and encoder geometry for one motor.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotorConfig {
    /// PWM output pin carrying the duty cycle.
    pub pwm_pin: Pin,
    /// Digital output pin selecting the direction.
    pub dir_pin: Pin,
    /// Digital input pin carrying the encoder channel.
    pub encoder_pin: Pin,
    /// Rising-edge pulses per full encoder revolution. Must be positive.
    pub ticks_per_revolution: u32,
}

impl MotorConfig {
    /// Construct a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns `Err(ControlError::InvalidWindow)` if `ticks_per_revolution`
    /// is zero.
    pub const fn new(
        pwm_pin: Pin,
        dir_pin: Pin,
        encoder_pin: Pin,
        ticks_per_revolution: u32,
    ) -> Result<Self, ControlError> {
        if ticks_per_revolution == 0 {
            return Err(ControlError::InvalidWindow(
                "ticks per revolution must be positive",
            ));
        }
        Ok(MotorConfig {
            pwm_pin,
            dir_pin,
            encoder_pin,
            ticks_per_revolution,
        })
    }
}

/// Speed-control engine for a single brushed DC motor.
///
/// Construction configures the three pins on the transport and registers the
/// encoder edge callback; afterwards the presentation shell drives the
/// engine through the operations below, typically on a periodic timer tick:
/// `measure_speed` → `pid_control` → `start`.
///
/// Only the pulse counter is shared with the transport's edge-delivery
/// context; all other state belongs to the caller's control-loop context.
pub struct MotorController<T: Transport> {
    actuator: MotorActuator<T>,
    estimator: SpeedEstimator,
    tracker: MaxSpeedTracker,
    pid: PidController,
}

impl<T: Transport> MotorController<T> {
    /// Wire the engine over `transport`.
    ///
    /// `smoothing_window` is the moving-average capacity of the speed
    /// estimator; `tracker` carries the (possibly persisted) max-speed seed.
    ///
    /// # Errors
    ///
    /// Returns `Err(ControlError::InvalidWindow)` for a zero tick
    /// configuration, or a transport error if pin configuration fails.
    pub fn new(
        mut transport: T,
        config: MotorConfig,
        smoothing_window: usize,
        tracker: MaxSpeedTracker,
    ) -> Result<Self, ControlError> {
        if config.ticks_per_revolution == 0 {
            return Err(ControlError::InvalidWindow(
                "ticks per revolution must be positive",
            ));
        }

        transport.configure_digital_output(config.dir_pin)?;
        transport.configure_pwm_output(config.pwm_pin)?;

        let counter = PulseCounter::new();
        let producer = counter.clone();
        transport.configure_edge_input(config.encoder_pin, Arc::new(move || producer.on_edge()))?;

        info!(
            pwm = config.pwm_pin,
            dir = config.dir_pin,
            encoder = config.encoder_pin,
            ticks = config.ticks_per_revolution,
            "motor controller initialized"
        );

        Ok(Self {
            actuator: MotorActuator::new(transport, config.pwm_pin, config.dir_pin),
            estimator: SpeedEstimator::new(counter, config.ticks_per_revolution, smoothing_window),
            tracker,
            pid: PidController::new(),
        })
    }

    /// Run the motor forward at `duty` (strictly validated to `[0, 255]`).
    pub fn start(&mut self, duty: f64) -> Result<(), ControlError> {
        self.actuator.start(duty)
    }

    /// Stop the motor. Idempotent.
    pub fn stop(&mut self) -> Result<(), ControlError> {
        self.actuator.stop()
    }

    /// Measure the smoothed motor speed over `window`, blocking the calling
    /// context for the window duration. Every non-zero reading feeds the
    /// max-speed tracker.
    pub fn measure_speed(&mut self, window: Duration) -> f64 {
        let rpm = self.estimator.measure_speed(window);
        self.tracker.observe(rpm);
        rpm
    }

    /// Replace the PID gains. Accumulated controller state is preserved.
    pub fn set_pid_parameters(&mut self, kp: f64, ki: f64, kd: f64) {
        self.pid.configure(kp, ki, kd);
    }

    /// Clear the PID integral accumulator and previous error.
    pub fn reset_pid(&mut self) {
        self.pid.reset();
    }

    /// Advance the PID loop one step, returning a duty cycle in `[0, 255]`.
    ///
    /// # Errors
    ///
    /// Returns `Err(ControlError::InvalidTimestep)` if `dt` is not positive.
    pub fn pid_control(&mut self, setpoint: f64, measured: f64, dt: f64) -> Result<f64, ControlError> {
        self.pid.step(setpoint, measured, dt)
    }

    /// Highest non-zero smoothed speed observed (or the persisted seed).
    /// Callers use this to rescale setpoint ranges.
    pub fn max_speed(&self) -> f64 {
        self.tracker.max_speed()
    }

    /// Current actuator state, for display.
    pub fn actuator_state(&self) -> ActuatorState {
        self.actuator.state()
    }

    /// The max-speed tracker, for persisting on shutdown.
    pub fn tracker(&self) -> &MaxSpeedTracker {
        &self.tracker
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tacho_hal::{EdgeCallback, Level, TransportError};

    const EPSILON: f64 = 1e-9;

    /// Loopback transport: keeps the registered edge callback so the test
    /// can play the encoder, and records PWM writes.
    #[derive(Clone, Default)]
    struct LoopbackTransport {
        callback: Arc<Mutex<Option<EdgeCallback>>>,
        duties: Arc<Mutex<Vec<u8>>>,
    }

    impl LoopbackTransport {
        fn fire_edges(&self, n: usize) {
            let guard = self.callback.lock().unwrap();
            let callback = guard.as_ref().expect("edge callback registered");
            for _ in 0..n {
                callback();
            }
        }
    }

    impl Transport for LoopbackTransport {
        fn configure_digital_output(&mut self, _pin: Pin) -> Result<(), TransportError> {
            Ok(())
        }

        fn configure_pwm_output(&mut self, _pin: Pin) -> Result<(), TransportError> {
            Ok(())
        }

        fn configure_edge_input(
            &mut self,
            _pin: Pin,
            callback: EdgeCallback,
        ) -> Result<(), TransportError> {
            *self.callback.lock().unwrap() = Some(callback);
            Ok(())
        }

        fn write_digital(&mut self, _pin: Pin, _level: Level) -> Result<(), TransportError> {
            Ok(())
        }

        fn write_pwm(&mut self, _pin: Pin, duty: u8) -> Result<(), TransportError> {
            self.duties.lock().unwrap().push(duty);
            Ok(())
        }
    }

    fn engine(transport: LoopbackTransport) -> MotorController<LoopbackTransport> {
        let config = MotorConfig::new(3, 12, 2, 12).unwrap();
        MotorController::new(transport, config, 10, MaxSpeedTracker::new(0.0)).unwrap()
    }

    #[test]
    fn test_config_rejects_zero_ticks() {
        assert!(matches!(
            MotorConfig::new(3, 12, 2, 0),
            Err(ControlError::InvalidWindow(_))
        ));
    }

    #[test]
    fn test_measured_speed_feeds_the_max_tracker() {
        let transport = LoopbackTransport::default();
        let mut engine = engine(transport.clone());

        // 6 edges during a 100 ms window at 12 ticks/rev: 150 RPM raw, and
        // with a single sample in the smoothing window, 150 RPM smoothed.
        let producer = transport.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(10));
            producer.fire_edges(6);
        });
        let rpm = engine.measure_speed(Duration::from_millis(100));
        handle.join().unwrap();

        assert!((rpm - 150.0).abs() < EPSILON);
        assert!((engine.max_speed() - 150.0).abs() < EPSILON);
    }

    #[test]
    fn test_zero_window_keeps_the_loop_alive() {
        let transport = LoopbackTransport::default();
        let mut engine = engine(transport);
        let rpm = engine.measure_speed(Duration::ZERO);
        assert_eq!(rpm, 0.0);
        // The spurious zero must not disturb the tracker seed.
        assert_eq!(engine.max_speed(), 0.0);
    }

    #[test]
    fn test_full_cycle_measure_control_actuate() {
        let transport = LoopbackTransport::default();
        let mut engine = engine(transport.clone());
        engine.set_pid_parameters(1.0, 0.0, 0.0);

        let rpm = engine.measure_speed(Duration::from_millis(10));
        let duty = engine.pid_control(60.0, rpm, 0.01).unwrap();
        assert!((duty - 60.0).abs() < EPSILON); // no edges fired, error = 60
        engine.start(duty).unwrap();
        assert_eq!(engine.actuator_state(), ActuatorState::Running { duty: 60 });

        engine.stop().unwrap();
        assert_eq!(engine.actuator_state(), ActuatorState::Stopped);
        assert_eq!(*transport.duties.lock().unwrap(), vec![60, 0]);
    }
}
