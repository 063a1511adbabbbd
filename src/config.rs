//! Kinematic profile configuration.
//!
//! The profile describes the machine the estimate is for: how fast it
//! travels, draws, and swings the pen servo, plus the pen angles and the
//! home position the firmware starts from.
//!
//! ## Example: TOML configuration
//!
//! ```toml
//! [plotter]
//! travel_feed_rate = 90.0
//! draw_feed_rate = 60.0
//! z_feed_rate = 40.0
//! acceleration = 300.0
//! pen_up_angle = 90.0
//! pen_down_angle = 25.0
//! home_x = 0.0
//! home_y = 0.0
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub plotter: PlotterConfig,
}

/// Kinematic profile for one plotter. Read-only during estimation.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlotterConfig {
    /// Pen-up travel speed (mm/s).
    #[serde(default = "default_travel_feed_rate")]
    pub travel_feed_rate: f64,
    /// Pen-down drawing speed (mm/s).
    #[serde(default = "default_draw_feed_rate")]
    pub draw_feed_rate: f64,
    /// Pen servo speed (degrees/s, planned as a third axis).
    #[serde(default = "default_z_feed_rate")]
    pub z_feed_rate: f64,
    /// Acceleration for all moves (mm/s²).
    #[serde(default = "default_acceleration")]
    pub acceleration: f64,
    /// Servo angle with the pen lifted (degrees).
    #[serde(default = "default_pen_up_angle")]
    pub pen_up_angle: f64,
    /// Servo angle with the pen on the paper (degrees).
    #[serde(default = "default_pen_down_angle")]
    pub pen_down_angle: f64,
    #[serde(default)]
    pub home_x: f64,
    #[serde(default)]
    pub home_y: f64,
}

impl Default for PlotterConfig {
    fn default() -> Self {
        Self {
            travel_feed_rate: default_travel_feed_rate(),
            draw_feed_rate: default_draw_feed_rate(),
            z_feed_rate: default_z_feed_rate(),
            acceleration: default_acceleration(),
            pen_up_angle: default_pen_up_angle(),
            pen_down_angle: default_pen_down_angle(),
            home_x: 0.0,
            home_y: 0.0,
        }
    }
}

// Default value functions
fn default_travel_feed_rate() -> f64 { 90.0 }
fn default_draw_feed_rate() -> f64 { 60.0 }
fn default_z_feed_rate() -> f64 { 40.0 }
fn default_acceleration() -> f64 { 300.0 }
fn default_pen_up_angle() -> f64 { 90.0 }
fn default_pen_down_angle() -> f64 { 25.0 }

/// Load configuration from a TOML file at the given path.
pub fn load_config(path: &str) -> Result<Config, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::error!("Failed to parse config TOML: {}", e);
                Err(ConfigError::Toml(e))
            }
        },
        Err(e) => {
            tracing::error!("Failed to read config file '{}': {}", path, e);
            Err(ConfigError::Io(e))
        }
    }
}
