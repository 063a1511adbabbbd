//! plotsim - pen plotter firmware simulation for draw-time estimation.
//!
//! Replays an already-finalized sequence of plotter waypoints through the
//! same look-ahead trapezoidal planner a stepper firmware runs, producing a
//! physically plausible total duration without hardware in the loop.

pub mod config;
pub mod history;
pub mod motion;

pub use config::{Config, ConfigError, PlotterConfig, load_config};
pub use history::Waypoint;
pub use motion::estimator::estimate_plot_time;
