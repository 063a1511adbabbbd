//! Lookahead queue: the firmware's block-buffer planner.
//!
//! Mirrors the planning loop a stepper firmware runs: every submitted
//! segment gets a junction-limited entry speed against its predecessor,
//! then backward and forward passes ripple speed corrections through the
//! whole pending window before the trapezoids are resolved. The queue is
//! private mutable state of one estimation run; concurrent estimations
//! each use their own instance.

use std::collections::VecDeque;

use crate::motion::segment::{Pose, Segment, pose_length, pose_sub};
use crate::motion::trapezoid::{max_speed_allowed, recalculate_trapezoid};

/// Planner window depth: segments past this are retired in FIFO order.
pub const MAX_SEGMENTS: usize = 8;
/// Shortest segment duration the planner models without stretching (s).
pub const MIN_SEGMENT_TIME: f64 = 25_000.0 / 1_000_000.0;
/// Per-axis speed ceiling (mm/s).
pub const MAX_FEEDRATE: f64 = 200.0;
/// Acceleration ceiling (mm/s²).
pub const MAX_ACCELERATION: f64 = 1250.0;
/// Acceleration floor, keeps the trapezoid math away from divide-by-zero
/// (mm/s²).
pub const MIN_ACCELERATION: f64 = 0.01;
/// Speed floor for segment boundaries (mm/s).
pub const MINIMUM_PLANNER_SPEED: f64 = 0.05;
/// Long moves are subdivided to this time resolution.
pub const SEGMENTS_PER_SECOND: u32 = 40;
/// Max instantaneous per-axis velocity change at a junction (mm/s).
/// The z axis is the pen servo and tolerates far less.
pub const MAX_JERK: [f64; 3] = [8.0, 8.0, 0.3];

/// Bounded FIFO of pending motion segments plus the scratch state the
/// junction math carries between submissions.
#[derive(Debug, Clone)]
pub struct LookaheadQueue {
    queue: VecDeque<Segment>,
    /// Where the simulated machine currently is.
    position: Pose,
    /// Per-axis velocity of the last submitted segment.
    previous_speed: [f64; 3],
    previous_safe_speed: f64,
}

impl LookaheadQueue {
    pub fn new(home: Pose) -> Self {
        Self {
            queue: VecDeque::new(),
            position: home,
            previous_speed: [0.0; 3],
            previous_safe_speed: 0.0,
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn position(&self) -> Pose {
        self.position
    }

    /// Pending segments, oldest first. Boundary speeds of segments still
    /// in the window may yet be revised by later submissions.
    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.queue.iter()
    }

    /// Submit a straight move. Moves longer than the planner's time
    /// resolution are split into equal sub-segments so long fast moves are
    /// modeled as finely as short ones.
    pub fn add_line(&mut self, to: Pose, feedrate: f64, acceleration: f64) {
        if feedrate <= 0.0 {
            tracing::warn!("Ignoring move with non-positive feedrate {}", feedrate);
            return;
        }
        let delta = pose_sub(&to, &self.position);
        let len = pose_length(&delta);
        let seconds = len / feedrate;
        let mut segments = (seconds * SEGMENTS_PER_SECOND as f64).ceil() as i64;
        if segments < 1 {
            segments = 1;
        }
        let inv = 1.0 / segments as f64;
        let step = [delta[0] * inv, delta[1] * inv, delta[2] * inv];

        let mut temp = self.position;
        for _ in 1..segments {
            temp = [temp[0] + step[0], temp[1] + step[1], temp[2] + step[2]];
            self.add_segment(temp, feedrate, acceleration);
        }
        self.add_segment(to, feedrate, acceleration);
    }

    /// Retire the oldest segments until the window is back within bounds,
    /// returning their summed duration (s). Retired segments are final.
    pub fn retire_over_window(&mut self) -> f64 {
        let mut sum = 0.0;
        while self.queue.len() > MAX_SEGMENTS {
            if let Some(seg) = self.queue.pop_front() {
                sum += seg.end_s;
            }
        }
        sum
    }

    /// Retire everything still pending, returning the summed duration (s).
    /// Called once the move history is exhausted.
    pub fn drain_remaining(&mut self) -> f64 {
        let mut sum = 0.0;
        while let Some(seg) = self.queue.pop_front() {
            sum += seg.end_s;
        }
        sum
    }

    fn add_segment(&mut self, to: Pose, feedrate: f64, acceleration: f64) {
        let start = match self.queue.back() {
            Some(last) => last.end,
            None => self.position,
        };
        let prev_nominal_speed = self.queue.back().map(|s| s.nominal_speed);

        let mut next = Segment::new(start, to);
        self.position = to;

        // Zero distance? A no-op waypoint, not an error.
        if next.distance == 0.0 {
            return;
        }

        let mut time_to_end = next.distance / feedrate;

        // Slow down if the buffer is nearly empty: a pathologically short
        // segment would otherwise dominate with an unrealistic speed.
        if self.queue.len() >= 2 && self.queue.len() <= MAX_SEGMENTS / 2 - 1 {
            if time_to_end < MIN_SEGMENT_TIME {
                time_to_end += (MIN_SEGMENT_TIME - time_to_end) * 2.0 / self.queue.len() as f64;
            }
        }

        next.nominal_speed = next.distance / time_to_end;

        let mut current_speed = [
            next.delta[0] / time_to_end,
            next.delta[1] / time_to_end,
            next.delta[2] / time_to_end,
        ];

        // Clamp any axis exceeding the global feedrate ceiling, scaling the
        // whole move proportionally.
        let mut speed_factor: f64 = 1.0;
        for v in current_speed {
            let cs = v.abs();
            if cs > MAX_FEEDRATE {
                speed_factor = speed_factor.min(MAX_FEEDRATE / cs);
            }
        }
        if speed_factor < 1.0 {
            for v in current_speed.iter_mut() {
                *v *= speed_factor;
            }
            next.nominal_speed *= speed_factor;
        }

        next.acceleration = acceleration.clamp(MIN_ACCELERATION, MAX_ACCELERATION);

        // Safe speed: nominal reduced until no axis starts faster than its
        // jerk limit allows from standstill.
        let mut safe_speed = next.nominal_speed;
        let mut limited = false;
        for i in 0..current_speed.len() {
            let jerk = current_speed[i].abs();
            let max_jerk = MAX_JERK[i];
            if jerk > max_jerk {
                if limited {
                    let mjerk = max_jerk * next.nominal_speed;
                    if jerk * safe_speed > mjerk {
                        safe_speed = mjerk / jerk;
                    }
                } else {
                    safe_speed *= max_jerk / jerk;
                    limited = true;
                }
            }
        }

        // Junction velocity: the fastest transition from the previous
        // segment's direction to this one that stays within every axis's
        // jerk limit.
        let vmax_junction = match prev_nominal_speed {
            Some(prev_nominal) if prev_nominal > 1e-6 => {
                let mut limited = false;
                let mut v_factor = 0.0;
                let mut vmax_junction = next.nominal_speed.min(prev_nominal);
                let smaller_speed_factor = vmax_junction / prev_nominal;

                for i in 0..current_speed.len() {
                    let mut v_exit = self.previous_speed[i] * smaller_speed_factor;
                    let mut v_entry = current_speed[i];
                    if limited {
                        v_exit *= v_factor;
                        v_entry *= v_factor;
                    }
                    let jerk = if v_exit > v_entry {
                        if v_entry > 0.0 || v_exit < 0.0 {
                            v_exit - v_entry
                        } else {
                            v_exit.max(-v_entry)
                        }
                    } else if v_entry < 0.0 || v_exit > 0.0 {
                        v_entry - v_exit
                    } else {
                        (-v_exit).max(v_entry)
                    };
                    if jerk > MAX_JERK[i] {
                        v_factor = MAX_JERK[i] / jerk;
                        limited = true;
                    }
                }
                if limited {
                    vmax_junction *= v_factor;
                }

                // Jerk only needs bounding through the actual direction
                // change; when both sides already run at safe speed the
                // junction may relax to it.
                let vmax_junction_threshold = vmax_junction * 0.99;
                if self.previous_safe_speed > vmax_junction_threshold
                    && safe_speed > vmax_junction_threshold
                {
                    safe_speed
                } else {
                    vmax_junction
                }
            }
            _ => safe_speed,
        };

        self.previous_safe_speed = safe_speed;

        next.allowable_speed =
            max_speed_allowed(-next.acceleration, MINIMUM_PLANNER_SPEED, next.distance);
        next.entry_speed_max = vmax_junction;
        next.entry_speed = vmax_junction.min(next.allowable_speed);
        next.nominal_length = next.allowable_speed >= next.nominal_speed;
        next.recalculate = true;

        self.previous_speed = current_speed;

        let entry_speed = next.entry_speed;
        recalculate_trapezoid(&mut next, entry_speed, MINIMUM_PLANNER_SPEED);

        self.queue.push_back(next);

        self.recalculate_all();
    }

    fn recalculate_all(&mut self) {
        self.recalculate_backwards();
        self.recalculate_forwards();
        self.recalculate_trapezoids();
    }

    /// Newest to oldest: pull entry speeds up toward their junction maxima
    /// while honoring what the following segment can still absorb.
    fn recalculate_backwards(&mut self) {
        let n = self.queue.len();
        for i in (0..n).rev() {
            let next = if i + 1 < n {
                let s = &self.queue[i + 1];
                Some((s.entry_speed, s.recalculate))
            } else {
                None
            };
            let current = &mut self.queue[i];
            let top = current.entry_speed_max;
            if current.entry_speed != top || next.is_some_and(|(_, dirty)| dirty) {
                let new_entry_speed = if current.nominal_length {
                    top
                } else {
                    top.min(max_speed_allowed(
                        -current.acceleration,
                        next.map_or(0.0, |(v, _)| v),
                        current.distance,
                    ))
                };
                current.entry_speed = new_entry_speed;
                current.recalculate = true;
            }
        }
    }

    /// Oldest to newest: a segment that cannot reach nominal speed caps how
    /// fast its successor may enter.
    fn recalculate_forwards(&mut self) {
        let n = self.queue.len();
        for i in 1..n {
            let (prev_nominal_length, prev_entry, prev_accel, prev_distance) = {
                let p = &self.queue[i - 1];
                (p.nominal_length, p.entry_speed, p.acceleration, p.distance)
            };
            let current = &mut self.queue[i];
            if !prev_nominal_length && prev_entry < current.entry_speed {
                let new_entry_speed = max_speed_allowed(-prev_accel, prev_entry, prev_distance);
                if new_entry_speed < current.entry_speed {
                    current.recalculate = true;
                    current.entry_speed = new_entry_speed;
                }
            }
        }
    }

    /// Re-resolve the trapezoid of every dirty segment (or predecessor of
    /// one), clearing dirty flags. The tail exits at zero.
    fn recalculate_trapezoids(&mut self) {
        let n = self.queue.len();
        let mut current_entry_speed = 0.0;
        for i in 0..n {
            let (next_entry_speed, next_dirty) = if i + 1 < n {
                let s = &self.queue[i + 1];
                (s.entry_speed, s.recalculate)
            } else {
                (0.0, false)
            };
            let current = &mut self.queue[i];
            if current.recalculate || next_dirty {
                if !current.busy {
                    recalculate_trapezoid(current, current_entry_speed, next_entry_speed);
                }
            }
            current.recalculate = false;
            current_entry_speed = next_entry_speed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACCEL: f64 = 300.0;

    fn queue_at_origin() -> LookaheadQueue {
        LookaheadQueue::new([0.0, 0.0, 90.0])
    }

    #[test]
    fn test_zero_distance_segment_is_skipped() {
        let mut q = queue_at_origin();
        q.add_line([0.0, 0.0, 90.0], 60.0, ACCEL);
        assert!(q.is_empty());
    }

    #[test]
    fn test_long_move_is_subdivided() {
        let mut q = queue_at_origin();
        // 100mm at 50mm/s = 2s -> 80 sub-segments at 40 segments/s.
        q.add_line([100.0, 0.0, 90.0], 50.0, ACCEL);
        assert_eq!(q.len(), 80);
        // Sub-segments are equal length and chain start-to-end.
        let mut prev_end: Option<[f64; 3]> = None;
        for seg in q.segments() {
            assert!((seg.distance - 1.25).abs() < 1e-9);
            if let Some(end) = prev_end {
                assert_eq!(seg.start, end);
            }
            prev_end = Some(seg.end);
        }
    }

    #[test]
    fn test_short_move_is_a_single_segment() {
        let mut q = queue_at_origin();
        q.add_line([0.5, 0.0, 90.0], 60.0, ACCEL);
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn test_speed_invariants_hold_after_recalculation() {
        let mut q = queue_at_origin();
        q.add_line([10.0, 0.0, 90.0], 60.0, ACCEL);
        q.add_line([10.0, 10.0, 90.0], 60.0, ACCEL);
        q.add_line([0.0, 10.0, 90.0], 60.0, ACCEL);
        for seg in q.segments() {
            assert!(seg.entry_speed >= MINIMUM_PLANNER_SPEED);
            assert!(seg.exit_speed >= MINIMUM_PLANNER_SPEED);
            // Entry may sit at the planner floor even when the junction
            // ceiling is tighter.
            assert!(seg.entry_speed <= seg.entry_speed_max.max(MINIMUM_PLANNER_SPEED) + 1e-9);
        }
    }

    #[test]
    fn test_trapezoid_partition_invariant() {
        let mut q = queue_at_origin();
        q.add_line([25.0, 5.0, 90.0], 90.0, ACCEL);
        q.add_line([30.0, -10.0, 90.0], 60.0, ACCEL);
        for seg in q.segments() {
            assert!(seg.accelerate_until_d >= 0.0);
            assert!(seg.plateau_d >= 0.0);
            assert!(seg.decelerate_after_d <= seg.distance + 1e-9);
            assert!((seg.decelerate_after_d - seg.accelerate_until_d - seg.plateau_d).abs() < 1e-9);
        }
    }

    #[test]
    fn test_per_axis_feedrate_clamp_scales_nominal_speed() {
        let mut q = queue_at_origin();
        // Requested 500mm/s on x alone: clamped to the 200mm/s ceiling.
        q.add_line([5.0, 0.0, 90.0], 500.0, ACCEL);
        for seg in q.segments() {
            assert!(seg.nominal_speed <= MAX_FEEDRATE + 1e-9);
        }
    }

    #[test]
    fn test_acceleration_is_clamped() {
        let mut q = queue_at_origin();
        q.add_line([5.0, 0.0, 90.0], 60.0, -10.0);
        q.add_line([10.0, 0.0, 90.0], 60.0, 1e9);
        for seg in q.segments() {
            assert!(seg.acceleration >= MIN_ACCELERATION);
            assert!(seg.acceleration <= MAX_ACCELERATION);
        }
    }

    #[test]
    fn test_segment_durations_are_finite() {
        let mut q = queue_at_origin();
        q.add_line([3.0, 4.0, 90.0], 60.0, ACCEL);
        q.add_line([3.0, 4.0, 25.0], 40.0, ACCEL);
        q.add_line([-7.0, 2.0, 25.0], 60.0, ACCEL);
        let mut sum = 0.0;
        for seg in q.segments() {
            assert!(seg.end_s.is_finite());
            assert!(seg.end_s > 0.0);
            sum += seg.end_s;
        }
        assert_eq!(q.drain_remaining(), sum);
        assert!(q.is_empty());
    }

    #[test]
    fn test_retire_over_window_keeps_fifo_bound() {
        let mut q = queue_at_origin();
        q.add_line([100.0, 0.0, 90.0], 50.0, ACCEL);
        assert!(q.len() > MAX_SEGMENTS);
        let retired = q.retire_over_window();
        assert_eq!(q.len(), MAX_SEGMENTS);
        assert!(retired > 0.0);
    }

    #[test]
    fn test_submission_resolves_an_initial_trapezoid() {
        // A lone segment's first trapezoid uses its own junction entry
        // speed and exits at the planner floor.
        let mut q = queue_at_origin();
        q.add_line([0.5, 0.0, 90.0], 60.0, ACCEL);
        let seg = q.segments().next().unwrap();
        assert!(seg.end_s.is_finite());
        assert!(seg.end_s > 0.0);
        assert_eq!(seg.exit_speed, MINIMUM_PLANNER_SPEED);
    }

    #[test]
    fn test_non_positive_feedrate_move_is_ignored() {
        let mut q = queue_at_origin();
        q.add_line([10.0, 0.0, 90.0], 0.0, ACCEL);
        assert!(q.is_empty());
    }
}
