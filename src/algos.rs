use crate::file::beatmap::{BeatmapFile, HitObject};
use crate::point::Point;
use crate::timing::Timing;

/// Finds the boundary value of a monotonic predicate by bisection.
///
/// The predicate must hold near `lower` and fail near `upper`; the bound it
/// holds for is kept at every step and returned once `distance` between the
/// bounds is within `epsilon`. That monotonicity is the caller's obligation
/// and is not checked here. Each iteration halves the bound distance, so the
/// search terminates after O(log(range / epsilon)) steps.
#[must_use]
pub fn binary_search<T, D, M, P>(mut lower: T, mut upper: T, epsilon: f64, distance: D, midpoint: M, predicate: P) -> T
where
    T: Copy,
    D: Fn(T, T) -> f64,
    M: Fn(T, T) -> T,
    P: Fn(T) -> bool,
{
    while distance(lower, upper) > epsilon {
        let mid = midpoint(lower, upper);

        if predicate(mid) {
            lower = mid;
        } else {
            upper = mid;
        }
    }

    lower
}

/// Scalar instantiation: absolute distance, arithmetic-mean midpoint.
#[must_use]
pub fn binary_search_f64(lower: f64, upper: f64, epsilon: f64, predicate: impl Fn(f64) -> bool) -> f64 {
    binary_search(lower, upper, epsilon, |a, b| (b - a).abs(), |a, b| (a + b) / 2.0, predicate)
}

/// 2D instantiation: squared Euclidean distance compared against `epsilon²`,
/// lerp-at-0.5 midpoint.
#[must_use]
pub fn binary_search_point(lower: Point, upper: Point, epsilon: f64, predicate: impl Fn(Point) -> bool) -> Point {
    binary_search(
        lower,
        upper,
        epsilon * epsilon,
        Point::distance_squared,
        |a, b| a.lerp(b, 0.5),
        predicate,
    )
}

/// Offsets all timing points and hit objects' times.
pub fn offset_map(beatmap: &mut BeatmapFile, offset_millis: f64) {
    for timing_point in &mut beatmap.timing_points {
        timing_point.time += offset_millis;
    }

    for hit_object in &mut beatmap.hit_objects {
        hit_object.move_time(offset_millis);
    }
}

/// Stretches the map around t = 0: every time value is multiplied by
/// `factor`, redline beat lengths included so the rhythm keeps its shape.
pub fn scale_time(beatmap: &mut BeatmapFile, factor: f64) {
    for timing_point in &mut beatmap.timing_points {
        timing_point.time *= factor;
        if timing_point.uninherited {
            timing_point.beat_length *= factor;
        }
    }

    for hit_object in &mut beatmap.hit_objects {
        hit_object.time *= factor;
        hit_object.temporal_length *= factor;

        for timeline_object in &mut hit_object.timeline_objects {
            timeline_object.time *= factor;
        }
        for body_hitsound in &mut hit_object.body_hitsounds {
            body_hitsound.time *= factor;
        }
    }
}

/// Resnaps every object's start and end to the nearer of the two snap
/// divisors. Returns how many objects moved.
pub fn resnap_map(beatmap: &mut BeatmapFile, timing: &Timing, snap1: u32, snap2: u32) -> usize {
    let mut changed = 0;

    for hit_object in &mut beatmap.hit_objects {
        let moved_start = hit_object.resnap_self(timing, snap1, snap2);
        let moved_end = hit_object.resnap_end(timing, snap1, snap2);

        if moved_start || moved_end {
            changed += 1;
        }
    }

    changed
}

/// Rebuilds every object's timeline sub-events and body hitsounds from the
/// map's own timing points.
pub fn give_timing_context(beatmap: &mut BeatmapFile) {
    let timing = beatmap.timing();

    for hit_object in &mut beatmap.hit_objects {
        hit_object.update_timeline_objects();
        hit_object.collect_body_hitsounds(&timing);
    }
}

/// Derived combo-colour assignment: one palette index per object.
///
/// The first non-spinner object starts the first combo; a new combo advances
/// the index by one plus the object's combo skip. Spinners never start a
/// combo of their own and keep the current colour.
#[must_use]
pub fn combo_colour_indices(hit_objects: &[HitObject], colour_count: usize) -> Vec<usize> {
    let colour_count = colour_count.max(1);
    let mut indices = Vec::with_capacity(hit_objects.len());
    let mut current = 0;
    let mut first = true;

    for hit_object in hit_objects {
        if !hit_object.is_spinner && (first || hit_object.new_combo) {
            current = if first {
                hit_object.combo_skip as usize % colour_count
            } else {
                (current + 1 + hit_object.combo_skip as usize) % colour_count
            };
            first = false;
        }

        indices.push(current);
    }

    indices
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use approx::assert_relative_eq;

    use super::*;
    use crate::file::beatmap::TimingPoint;

    #[test]
    fn binary_search_converges_on_the_predicate_boundary() {
        let calls = Cell::new(0u32);
        let result = binary_search_f64(0.0, 100.0, 1e-6, |x| {
            calls.set(calls.get() + 1);
            x < 42.5
        });

        assert_relative_eq!(result, 42.5, epsilon = 1e-6);
        // ceil(log2(100 / 1e-6)) = 27 bisections at most.
        assert!(calls.get() <= 27, "took {} iterations", calls.get());
    }

    #[test]
    fn binary_search_point_converges_within_epsilon() {
        let lower = Point::new(0.0, 0.0);
        let upper = Point::new(100.0, 50.0);
        // The predicate cuts the segment at x = 40.
        let result = binary_search_point(lower, upper, 1e-6, |p| p.x < 40.0);

        assert!(result.distance_squared(Point::new(40.0, 20.0)) <= 1e-6 * 1e-6 * 4.0);
    }

    #[test]
    fn offset_map_shifts_points_and_objects() {
        let mut beatmap = BeatmapFile {
            timing_points: vec![TimingPoint::default()],
            hit_objects: vec![HitObject {
                time: 1000.0,
                ..HitObject::default()
            }],
            ..BeatmapFile::default()
        };

        offset_map(&mut beatmap, 25.0);

        assert_eq!(beatmap.timing_points[0].time, 25.0);
        assert_eq!(beatmap.hit_objects[0].time, 1025.0);
    }

    #[test]
    fn scale_time_stretches_redlines_and_spans() {
        let mut beatmap = BeatmapFile {
            timing_points: vec![TimingPoint::default()],
            hit_objects: vec![HitObject {
                time: 1000.0,
                is_circle: false,
                is_slider: true,
                repeat: 2,
                temporal_length: 300.0,
                ..HitObject::default()
            }],
            ..BeatmapFile::default()
        };

        scale_time(&mut beatmap, 2.0);

        assert_eq!(beatmap.timing_points[0].beat_length, 1000.0);
        assert_eq!(beatmap.hit_objects[0].time, 2000.0);
        assert_eq!(beatmap.hit_objects[0].temporal_length, 600.0);
        assert_eq!(beatmap.hit_objects[0].end_time(), 3200.0);
    }

    #[test]
    fn combo_colours_honor_new_combo_and_skip() {
        let mut objects = Vec::new();
        for (new_combo, combo_skip, is_spinner) in [
            (true, 0, false),
            (false, 0, false),
            (true, 0, false),
            (true, 1, false),
            (true, 0, true),
            (false, 0, false),
        ] {
            objects.push(HitObject {
                new_combo,
                combo_skip,
                is_spinner,
                is_circle: !is_spinner,
                ..HitObject::default()
            });
        }

        // 4 colours: object 3 skips one index; the spinner keeps colour 3
        // without starting a combo; the object after it keeps it too since
        // it is not a new combo either.
        assert_eq!(combo_colour_indices(&objects, 4), vec![0, 0, 1, 3, 3, 3]);
    }
}
