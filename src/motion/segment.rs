//! Motion segments: one planned straight-line block between two poses.

/// A pose is [x mm, y mm, z degrees]. The z component is the pen servo
/// angle, planned as a third kinematic axis so the jerk and acceleration
/// math treats it uniformly.
pub type Pose = [f64; 3];

pub fn pose_sub(a: &Pose, b: &Pose) -> Pose {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

pub fn pose_length(p: &Pose) -> f64 {
    (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt()
}

/// One motion block pending in the lookahead queue.
///
/// Entry and exit speeds stay revisable while the segment sits in the
/// queue; once retired the segment is final and only its `end_s` matters.
#[derive(Debug, Clone)]
pub struct Segment {
    pub start: Pose,
    pub end: Pose,
    pub delta: Pose,
    /// Straight-line length (mm).
    pub distance: f64,
    /// Target cruise speed (mm/s), after per-axis feedrate clamping.
    pub nominal_speed: f64,
    /// Acceleration (mm/s²), never below the planner minimum.
    pub acceleration: f64,
    /// Junction-limited ceiling on the entry speed.
    pub entry_speed_max: f64,
    /// Resolved speed entering the segment.
    pub entry_speed: f64,
    /// Resolved speed leaving the segment.
    pub exit_speed: f64,
    /// Fastest entry from which the segment can still brake to the
    /// minimum planner speed within its own length.
    pub allowable_speed: f64,
    /// True if nominal speed is reachable within this segment; backward
    /// propagation never needs to revisit it.
    pub nominal_length: bool,
    /// Dirty flag: the trapezoid must be recomputed.
    pub recalculate: bool,
    /// True once execution of the block has started. Frozen segments are
    /// skipped by recalculation. Always false in offline estimation.
    pub busy: bool,

    // Resolved trapezoid profile. The d fields are positions along the
    // segment (mm), the t fields times from segment start (s).
    pub accelerate_until_d: f64,
    pub plateau_d: f64,
    pub decelerate_after_d: f64,
    pub accelerate_until_t: f64,
    pub decelerate_after_t: f64,
    /// Total duration of the block (s).
    pub end_s: f64,
}

impl Segment {
    pub fn new(start: Pose, end: Pose) -> Self {
        let delta = pose_sub(&end, &start);
        let distance = pose_length(&delta);
        Self {
            start,
            end,
            delta,
            distance,
            nominal_speed: 0.0,
            acceleration: 0.0,
            entry_speed_max: 0.0,
            entry_speed: 0.0,
            exit_speed: 0.0,
            allowable_speed: 0.0,
            nominal_length: false,
            recalculate: false,
            busy: false,
            accelerate_until_d: 0.0,
            plateau_d: 0.0,
            decelerate_after_d: 0.0,
            accelerate_until_t: 0.0,
            decelerate_after_t: 0.0,
            end_s: 0.0,
        }
    }
}
