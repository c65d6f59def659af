mod settings; // brings `settings.rs` in as `crate::settings`
mod sim; // brings `sim.rs` in as `crate::sim`

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Context, anyhow};
use tracing::{info, warn};
use tracing_subscriber::{self, EnvFilter};

use tacho_control::{MaxSpeedTracker, MotorController};

use settings::{ControlSettings, Settings};
use sim::SimTransport;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let settings: Settings = settings::load().context("loading configuration")?;

    let tracker = MaxSpeedTracker::load(&settings.persistence.max_speed_path);
    let transport = SimTransport::spawn(settings.motor.ticks_per_revolution)?;
    let mut controller = MotorController::new(
        transport,
        settings.motor,
        settings.control.smoothing_window,
        tracker,
    )?;
    controller.set_pid_parameters(
        settings.control.kp,
        settings.control.ki,
        settings.control.kd,
    );

    info!("Tacho speed controller started. Press ctrl-c to stop.");

    let shutdown = Arc::new(AtomicBool::new(false));
    let handle = std::thread::Builder::new().name("control".into()).spawn({
        let shutdown = Arc::clone(&shutdown);
        let control = settings.control.clone();
        move || control_loop(controller, control, shutdown)
    })?;

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested, stopping motor...");
    shutdown.store(true, Ordering::Release);

    let controller = handle
        .join()
        .map_err(|_| anyhow!("control thread panicked"))?;
    controller.tracker().save(&settings.persistence.max_speed_path);
    info!(max_rpm = controller.max_speed(), "Learned max speed persisted.");

    Ok(())
}

/// Timer-driven control loop: measure → pid → actuate, one cycle per period.
///
/// The measurement window doubles as the loop pacing, so `dt` equals the
/// period. A failed cycle is logged and skipped; the loop always retries on
/// the next tick.
fn control_loop(
    mut controller: MotorController<SimTransport>,
    control: ControlSettings,
    shutdown: Arc<AtomicBool>,
) -> MotorController<SimTransport> {
    info!("Control loop started.");
    let window = Duration::from_millis(control.period_ms);
    let dt = window.as_secs_f64();

    while !shutdown.load(Ordering::Acquire) {
        let rpm = controller.measure_speed(window);

        match controller.pid_control(control.setpoint_rpm, rpm, dt) {
            Ok(duty) => {
                if let Err(err) = controller.start(duty) {
                    warn!(%err, "actuation failed, skipping cycle");
                }
                info!(
                    rpm,
                    duty,
                    setpoint = control.setpoint_rpm,
                    max = controller.max_speed(),
                    "cycle"
                );
            }
            Err(err) => warn!(%err, "control step failed, skipping cycle"),
        }
    }

    if let Err(err) = controller.stop() {
        warn!(%err, "failed to stop motor on shutdown");
    }
    controller
}
