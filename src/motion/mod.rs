//! Firmware motion simulation: segment planning and time accumulation.

pub mod estimator;
pub mod queue;
pub mod segment;
pub mod trapezoid;

pub use queue::LookaheadQueue;
pub use segment::{Pose, Segment};
