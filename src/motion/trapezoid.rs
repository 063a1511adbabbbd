//! Trapezoid solver: accelerate/cruise/decelerate profiles for one segment.
//!
//! All of this is constant-acceleration algebra on `v² = v₀² + 2·a·d`.
//! Distances are rounded the way the firmware rounds them (ceil for the
//! acceleration phase, floor for the deceleration phase) so estimates stay
//! comparable with the machine's own planner.

use crate::motion::queue::MINIMUM_PLANNER_SPEED;
use crate::motion::segment::Segment;

/// Maximum speed at the start of a move that can still reach
/// `target_velocity` under `acceleration` within `distance`.
/// Called with negative acceleration to answer "how fast may I enter and
/// still brake down to the target in time".
pub fn max_speed_allowed(acceleration: f64, target_velocity: f64, distance: f64) -> f64 {
    (target_velocity * target_velocity - 2.0 * acceleration * distance).sqrt()
}

/// Speed after accelerating from `start_velocity` over `distance`.
pub fn final_speed(start_velocity: f64, acceleration: f64, distance: f64) -> f64 {
    (start_velocity * start_velocity + 2.0 * acceleration * distance).sqrt()
}

/// Distance needed to change speed from `initial_rate` to `target_rate`
/// at `acceleration`.
pub fn acceleration_distance(initial_rate: f64, target_rate: f64, acceleration: f64) -> f64 {
    if acceleration == 0.0 {
        return 0.0;
    }
    (target_rate * target_rate - initial_rate * initial_rate) / (acceleration * 2.0)
}

/// Where the accelerating and decelerating speed curves meet when the
/// segment is too short for a plateau.
pub fn intersection_distance(start_rate: f64, end_rate: f64, acceleration: f64, distance: f64) -> f64 {
    if acceleration == 0.0 {
        return 0.0;
    }
    (2.0 * acceleration * distance - start_rate * start_rate + end_rate * end_rate)
        / (4.0 * acceleration)
}

/// Resolve the segment's trapezoid for the given boundary speeds and store
/// the phase positions, phase times, and total duration on the segment.
///
/// Boundary speeds are floored to the minimum planner speed. When the
/// segment is too short to reach nominal speed the plateau collapses to
/// zero and the accelerate/decelerate split comes from the intersection of
/// the two speed curves.
pub fn recalculate_trapezoid(seg: &mut Segment, entry_speed: f64, exit_speed: f64) {
    let entry_speed = entry_speed.max(MINIMUM_PLANNER_SPEED);
    let exit_speed = exit_speed.max(MINIMUM_PLANNER_SPEED);

    let accel = seg.acceleration;
    let mut accelerate_d =
        acceleration_distance(entry_speed, seg.nominal_speed, accel).ceil().max(0.0);
    let decelerate_d =
        acceleration_distance(seg.nominal_speed, exit_speed, -accel).floor().max(0.0);
    let mut plateau_d = seg.distance - accelerate_d - decelerate_d;
    if plateau_d < 0.0 {
        let half = intersection_distance(entry_speed, exit_speed, accel, seg.distance).ceil();
        accelerate_d = half.clamp(0.0, seg.distance);
        plateau_d = 0.0;
    }
    seg.accelerate_until_d = accelerate_d;
    seg.plateau_d = plateau_d;
    seg.decelerate_after_d = accelerate_d + plateau_d;

    let nominal_t = plateau_d / seg.nominal_speed;

    let cruise_speed = final_speed(entry_speed, accel, accelerate_d);
    let accelerate_t = (cruise_speed - entry_speed) / accel;
    let decelerate_t = (cruise_speed - exit_speed) / accel;

    seg.accelerate_until_t = accelerate_t;
    seg.decelerate_after_t = accelerate_t + nominal_t;
    seg.end_s = accelerate_t + nominal_t + decelerate_t;
    seg.entry_speed = entry_speed;
    seg.exit_speed = exit_speed;

    if seg.end_s.is_nan() {
        tracing::warn!(
            "Trapezoid duration is NaN: accel_t={} nominal_t={} decel_t={}",
            accelerate_t,
            nominal_t,
            decelerate_t
        );
    }
}
