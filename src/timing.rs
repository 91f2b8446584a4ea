use crate::file::beatmap::{Timestamp, TimingPoint};
use crate::TimestampedSlice;

/// Tolerance for millisecond comparisons and the floor bias applied when
/// quantizing times. Counters binary representation error at exact
/// millisecond boundaries.
pub const DOUBLE_EPSILON: f64 = 1e-7;

/// Raw greenline value in effect when no inherited point governs a time:
/// a -100% inverse multiplier, i.e. exactly the base slider velocity.
pub const DEFAULT_SLIDER_VELOCITY: f64 = -100.0;

#[must_use]
pub fn is_close(a: f64, b: f64) -> bool {
    (a - b).abs() <= DOUBLE_EPSILON
}

/// The timing model of a map: its control points plus the base slider
/// multiplier from the difficulty settings.
///
/// Lookups resolve the governing point by time on demand; nothing here is
/// ever owned by a hit object.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Timing {
    /// All timing points, kept sorted by time.
    pub timing_points: Vec<TimingPoint>,
    /// Base slider velocity in hundreds of osu! pixels per beat.
    pub slider_multiplier: f64,
}

impl Timing {
    #[must_use]
    pub fn new(mut timing_points: Vec<TimingPoint>, slider_multiplier: f64) -> Self {
        timing_points.sort_by(|a, b| a.time.total_cmp(&b.time));

        Self {
            timing_points,
            slider_multiplier,
        }
    }

    /// The governing uninherited timing point at `time`: the last redline at
    /// or before it, or the first redline of the map when `time` precedes
    /// them all.
    #[must_use]
    pub fn redline_at(&self, time: Timestamp) -> Option<&TimingPoint> {
        let up_to = self.timing_points.between(..=time + DOUBLE_EPSILON);

        (up_to.iter().rev())
            .find(|tp| tp.uninherited)
            .or_else(|| self.timing_points.iter().find(|tp| tp.uninherited))
    }

    /// The governing timing point of any kind at `time`, the one whose
    /// sample set and volume apply to hitsounds played there.
    #[must_use]
    pub fn timing_point_at(&self, time: Timestamp) -> Option<&TimingPoint> {
        self.timing_points.between(..=time + DOUBLE_EPSILON).last()
    }

    /// The first redline strictly after `time`.
    #[must_use]
    pub fn next_redline_after(&self, time: Timestamp) -> Option<&TimingPoint> {
        self.timing_points
            .iter()
            .find(|tp| tp.uninherited && tp.time > time + DOUBLE_EPSILON)
    }

    /// Whether any redline lies within `[start, end]`.
    #[must_use]
    pub fn has_redline_between(&self, start: Timestamp, end: Timestamp) -> bool {
        self.timing_points.between(start..=end).iter().any(|tp| tp.uninherited)
    }

    /// Milliseconds per beat at `time`. Maps without a single redline fall
    /// back to the editor default of 500 ms (120 BPM).
    #[must_use]
    pub fn mpb_at(&self, time: Timestamp) -> f64 {
        self.redline_at(time).map_or(500.0, |tp| tp.beat_length)
    }

    /// The raw greenline value at `time`: the negative inverse velocity
    /// percentage of the governing inherited point, or `-100` when none
    /// applies past the governing redline.
    #[must_use]
    pub fn slider_velocity_at(&self, time: Timestamp) -> f64 {
        let redline_time = self.redline_at(time).map_or(f64::NEG_INFINITY, |tp| tp.time);

        (self.timing_points.between(..=time + DOUBLE_EPSILON).iter().rev())
            .find(|tp| !tp.uninherited && tp.time >= redline_time)
            .map_or(DEFAULT_SLIDER_VELOCITY, |tp| tp.beat_length)
    }

    /// Quantizes `time` against the governing redline's grid for both snap
    /// divisors and keeps the nearer candidate. A candidate crossing the
    /// next redline is pulled back to that redline's offset. `floor` applies
    /// the epsilon-biased floor used for final millisecond values.
    #[must_use]
    pub fn resnap(&self, time: Timestamp, snap1: u32, snap2: u32, floor: bool) -> Timestamp {
        let Some(redline) = self.redline_at(time) else {
            return time;
        };

        let candidate1 = Self::nearest_grid_time(time, redline, snap1);
        let candidate2 = Self::nearest_grid_time(time, redline, snap2);

        let mut new_time = if (candidate1 - time).abs() <= (candidate2 - time).abs() {
            candidate1
        } else {
            candidate2
        };

        if let Some(next) = self.next_redline_after(time) {
            if new_time > next.time {
                new_time = next.time;
            }
        }

        if floor {
            (new_time + DOUBLE_EPSILON).floor()
        } else {
            new_time
        }
    }

    /// The multiple of `divisor` nearest to `duration`.
    #[must_use]
    pub fn nearest_multiple(duration: f64, divisor: f64) -> f64 {
        (duration / divisor).round() * divisor
    }

    fn nearest_grid_time(time: Timestamp, redline: &TimingPoint, snap: u32) -> Timestamp {
        let interval = redline.beat_length / f64::from(snap);
        ((time - redline.time) / interval).round() * interval + redline.time
    }
}
