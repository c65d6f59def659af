//! In-process motor simulation standing in for the serial bridge.
//!
//! A first-order motor model follows the applied duty cycle; a background
//! thread plays the encoder, firing the registered edge callback at a rate
//! proportional to the simulated speed (with a little measurement jitter).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use rand::Rng;
use spin_sleep::SpinSleeper;
use tacho_hal::{EdgeCallback, Level, Pin, Transport, TransportError};
use tracing::info;

const SIM_STEP: Duration = Duration::from_millis(5);
/// Steady-state speed at full duty.
const FREE_RUN_RPM: f64 = 3000.0;
/// First-order lag of the motor model.
const TIME_CONSTANT_S: f64 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PinMode {
    DigitalOutput,
    PwmOutput,
    EdgeInput,
}

#[derive(Default)]
struct Shared {
    duty: u8,
    forward: bool,
    callback: Option<EdgeCallback>,
}

pub struct SimTransport {
    shared: Arc<RwLock<Shared>>,
    modes: HashMap<Pin, PinMode>,
}

impl SimTransport {
    /// Start the simulation. `ticks_per_revolution` must match the engine's
    /// encoder geometry so the played-back edge rate lines up.
    pub fn spawn(ticks_per_revolution: u32) -> anyhow::Result<Self> {
        let shared: Arc<RwLock<Shared>> = Arc::default();
        // Two transitions per pulse: each rising edge is half a pulse.
        let edges_per_rev = f64::from(ticks_per_revolution) * 2.0;

        std::thread::Builder::new().name("motor-sim".into()).spawn({
            let shared = Arc::clone(&shared);
            move || {
                info!("motor simulation thread started");
                let sleeper = SpinSleeper::default();
                let mut rng = rand::rng();
                let dt = SIM_STEP.as_secs_f64();
                let mut rpm = 0.0_f64;
                let mut edge_debt = 0.0_f64;
                loop {
                    let (target, callback) = {
                        let guard = shared.read();
                        let target = if guard.forward {
                            f64::from(guard.duty) / 255.0 * FREE_RUN_RPM
                        } else {
                            0.0
                        };
                        (target, guard.callback.clone())
                    };

                    rpm += (target - rpm) * (dt / TIME_CONSTANT_S);
                    let observed = (rpm * rng.random_range(0.98..1.02)).max(0.0);

                    if let Some(callback) = callback {
                        edge_debt += observed / 60.0 * edges_per_rev * dt;
                        let fired = edge_debt.floor();
                        edge_debt -= fired;
                        for _ in 0..fired as u64 {
                            callback();
                        }
                    }

                    sleeper.sleep(SIM_STEP);
                }
            }
        })?;

        Ok(Self {
            shared,
            modes: HashMap::new(),
        })
    }

    fn check_mode(&self, pin: Pin, expected: PinMode) -> Result<(), TransportError> {
        match self.modes.get(&pin) {
            None => Err(TransportError::UnconfiguredPin(pin)),
            Some(mode) if *mode != expected => Err(TransportError::WrongMode(pin)),
            Some(_) => Ok(()),
        }
    }
}

impl Transport for SimTransport {
    fn configure_digital_output(&mut self, pin: Pin) -> Result<(), TransportError> {
        self.modes.insert(pin, PinMode::DigitalOutput);
        Ok(())
    }

    fn configure_pwm_output(&mut self, pin: Pin) -> Result<(), TransportError> {
        self.modes.insert(pin, PinMode::PwmOutput);
        Ok(())
    }

    fn configure_edge_input(
        &mut self,
        pin: Pin,
        callback: EdgeCallback,
    ) -> Result<(), TransportError> {
        self.modes.insert(pin, PinMode::EdgeInput);
        self.shared.write().callback = Some(callback);
        Ok(())
    }

    fn write_digital(&mut self, pin: Pin, level: Level) -> Result<(), TransportError> {
        self.check_mode(pin, PinMode::DigitalOutput)?;
        self.shared.write().forward = level == Level::High;
        Ok(())
    }

    fn write_pwm(&mut self, pin: Pin, duty: u8) -> Result<(), TransportError> {
        self.check_mode(pin, PinMode::PwmOutput)?;
        self.shared.write().duty = duty;
        Ok(())
    }
}
