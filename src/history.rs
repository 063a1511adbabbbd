//! Move history: the ordered, already-finalized waypoint sequence.
//!
//! Producing this sequence (file loading, path conversion) is the job of
//! upstream tooling; the estimator only replays it.

use serde::{Deserialize, Serialize};

/// One plotter destination with the pen state to reach it with.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Waypoint {
    /// Target X (mm).
    pub x: f64,
    /// Target Y (mm).
    pub y: f64,
    /// True if the pen touches the paper during this move.
    pub pen_down: bool,
}

impl Waypoint {
    pub fn new(x: f64, y: f64, pen_down: bool) -> Self {
        Self { x, y, pen_down }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_waypoint_json_round_trip() {
        let history = vec![
            Waypoint::new(0.0, 0.0, false),
            Waypoint::new(100.0, 50.0, true),
        ];
        let json = serde_json::to_string(&history).unwrap();
        let parsed: Vec<Waypoint> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, history);
    }
}
