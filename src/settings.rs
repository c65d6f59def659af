use config::{Config, ConfigError, File, FileFormat};
use serde::Deserialize;
use tracing::{error, info};

use tacho_control::MotorConfig;

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub motor: MotorConfig,
    pub control: ControlSettings,
    pub persistence: PersistenceSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ControlSettings {
    /// Control-loop period; also the speed measurement window.
    pub period_ms: u64,
    /// Moving-average capacity of the speed estimator.
    pub smoothing_window: usize,
    /// Target speed in RPM.
    pub setpoint_rpm: f64,
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PersistenceSettings {
    /// Path of the one-line max-speed record.
    pub max_speed_path: String,
}

pub fn load() -> Result<Settings, ConfigError> {
    info!("Attempting to load configuration from {}", DEFAULT_CONFIG_PATH);

    let settings = Config::builder()
        .add_source(File::new(DEFAULT_CONFIG_PATH, FileFormat::Toml).required(true))
        .build()
        .and_then(Config::try_deserialize);

    match settings {
        Ok(settings) => {
            info!("Successfully loaded configuration: {:?}", settings);
            Ok(settings)
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            Err(e)
        }
    }
}
