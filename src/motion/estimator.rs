//! Time-estimator driver: replays a move history through the planner.

use crate::config::PlotterConfig;
use crate::history::Waypoint;
use crate::motion::queue::LookaheadQueue;

/// Estimate how many seconds the firmware will spend plotting `history`
/// on the machine described by `profile`.
///
/// Pure function of its inputs: each call runs its own planner queue, so
/// repeated or concurrent estimations cannot interfere. A profile with a
/// non-positive feed rate is a recoverable caller error; the estimate
/// degrades to 0.0 with a logged diagnostic rather than failing hard.
pub fn estimate_plot_time(history: &[Waypoint], profile: &PlotterConfig) -> f64 {
    let travel = profile.travel_feed_rate;
    let draw = profile.draw_feed_rate;
    let z = profile.z_feed_rate;
    if travel <= 0.0 {
        tracing::warn!("Travel feed rate {} is not positive, no estimate", travel);
        return 0.0;
    }
    if draw <= 0.0 {
        tracing::warn!("Draw feed rate {} is not positive, no estimate", draw);
        return 0.0;
    }
    if z <= 0.0 {
        tracing::warn!("Z feed rate {} is not positive, no estimate", z);
        return 0.0;
    }

    let acceleration = profile.acceleration;
    let pen_up_angle = profile.pen_up_angle;
    let pen_down_angle = profile.pen_down_angle;

    let mut queue = LookaheadQueue::new([profile.home_x, profile.home_y, pen_up_angle]);
    let mut is_up = true;
    let mut last_x = profile.home_x;
    let mut last_y = profile.home_y;
    let mut sum = 0.0;

    for waypoint in history {
        if waypoint.pen_down == is_up {
            // Pen state changed: swing the servo before moving on.
            is_up = !waypoint.pen_down;
            let angle = if is_up { pen_up_angle } else { pen_down_angle };
            queue.add_line([last_x, last_y, angle], z, acceleration);
        }
        let angle = if is_up { pen_up_angle } else { pen_down_angle };
        let feedrate = if is_up { travel } else { draw };
        queue.add_line([waypoint.x, waypoint.y, angle], feedrate, acceleration);
        last_x = waypoint.x;
        last_y = waypoint.y;

        sum += queue.retire_over_window();
    }

    // Flush whatever is still inside the planner window; dropping it would
    // round sub-window plots down to zero.
    sum += queue.drain_remaining();

    tracing::debug!("Estimated {:.2}s for {} waypoints", sum, history.len());
    sum
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_history_is_zero_seconds() {
        let profile = PlotterConfig::default();
        assert_eq!(estimate_plot_time(&[], &profile), 0.0);
    }

    #[test]
    fn test_non_positive_feed_rates_soft_fail() {
        let history = [Waypoint::new(10.0, 0.0, false)];
        for field in 0..3 {
            let mut profile = PlotterConfig::default();
            match field {
                0 => profile.travel_feed_rate = 0.0,
                1 => profile.draw_feed_rate = -5.0,
                _ => profile.z_feed_rate = 0.0,
            }
            assert_eq!(estimate_plot_time(&history, &profile), 0.0);
        }
    }

    #[test]
    fn test_pen_state_change_adds_servo_time() {
        let mut profile = PlotterConfig::default();
        profile.z_feed_rate = 5.0;
        let travel_only = [Waypoint::new(50.0, 0.0, false)];
        let with_drop = [Waypoint::new(50.0, 0.0, true)];
        let t_up = estimate_plot_time(&travel_only, &profile);
        let t_down = estimate_plot_time(&with_drop, &profile);
        // Same xy distance, but the pen-down plot pays for the servo swing
        // and draws at the slower feed rate.
        assert!(t_down > t_up);
    }
}
