//! In-place layer transform operations.

use eggplot_core::{Layer, Point, HOME, STEPS_PER_REV};

/// Scales every point horizontally by `h_scale` and vertically by `v_scale`,
/// then shifts it vertically by `v_offset`.
///
/// With `around_center` set, horizontal scaling pivots about the center of
/// the working width instead of about zero, so a drawing stays centered on
/// the egg while it is stretched or squeezed.
pub fn scale_layers(
    layers: &mut [Layer],
    h_scale: f64,
    v_scale: f64,
    v_offset: f64,
    around_center: bool,
) {
    let center_x = if around_center {
        STEPS_PER_REV / 2.0
    } else {
        0.0
    };
    for layer in layers {
        for segment in &mut layer.segments {
            for point in &mut segment.points {
                point.x = (point.x - center_x) * h_scale + center_x;
                point.y = point.y * v_scale + v_offset;
            }
        }
    }
}

/// Reorders each layer's segments with a greedy nearest-neighbor tour.
///
/// Starting from the home position, repeatedly picks the unplaced segment
/// whose start point (or end point, when `reverse_segments` is enabled) is
/// closest to the current pen position, ties broken by first-encountered
/// index. A segment picked by its end point is reversed before placement.
/// This is a heuristic, not an exact shortest tour, but it removes the worst
/// of the document-order travel.
///
/// The set of segments is preserved up to reversal; only the order changes.
pub fn optimize_travel(layers: &mut [Layer], reverse_segments: bool) {
    for layer in layers {
        let mut remaining = std::mem::take(&mut layer.segments);
        let mut sorted = Vec::with_capacity(remaining.len());
        let mut position = HOME;

        while !remaining.is_empty() {
            let mut best_index = 0;
            let mut best_distance = f64::INFINITY;
            let mut best_reversed = false;

            for (index, segment) in remaining.iter().enumerate() {
                let Some(start) = segment.first() else {
                    continue;
                };
                let forward = position.distance_to(start);
                if forward < best_distance {
                    best_index = index;
                    best_distance = forward;
                    best_reversed = false;
                }
                if reverse_segments {
                    // last() is Some whenever first() is
                    if let Some(end) = segment.last() {
                        let backward = position.distance_to(end);
                        if backward < best_distance {
                            best_index = index;
                            best_distance = backward;
                            best_reversed = true;
                        }
                    }
                }
            }

            let mut segment = remaining.remove(best_index);
            if best_reversed {
                segment.points.reverse();
            }
            if let Some(end) = segment.last() {
                position = *end;
            }
            sorted.push(segment);
        }

        layer.segments = sorted;
    }
}

/// Removes interior points that deviate from the line through their
/// neighbors by less than `threshold`.
///
/// Single pass per segment: after a removal the index stays put, so runs of
/// collinear points cascade out in one sweep, but the pass is not iterated
/// to a fixpoint. Segments never shrink below two points.
pub fn simplify_segments(layers: &mut [Layer], threshold: f64) {
    for layer in layers {
        for segment in &mut layer.segments {
            let mut i = 0;
            while i + 2 < segment.points.len() {
                let deviation = point_line_distance(
                    &segment.points[i + 1],
                    &segment.points[i],
                    &segment.points[i + 2],
                );
                if deviation < threshold {
                    segment.points.remove(i + 1);
                } else {
                    i += 1;
                }
            }
        }
    }
}

/// Joins adjacent segments whose pen-up gap is shorter than
/// `min_travel_distance` into one continuous stroke.
///
/// The absorbed segment's first point is dropped since the pen is already
/// within the gap threshold of it.
pub fn merge_consecutive_segments(layers: &mut [Layer], min_travel_distance: f64) {
    for layer in layers {
        let mut i = 0;
        while i + 1 < layer.segments.len() {
            let gap = match (layer.segments[i].last(), layer.segments[i + 1].first()) {
                (Some(end), Some(start)) => end.distance_to(start),
                _ => f64::INFINITY,
            };
            if gap < min_travel_distance {
                let next = layer.segments.remove(i + 1);
                layer.segments[i].points.extend(next.points.into_iter().skip(1));
            } else {
                i += 1;
            }
        }
    }
}

/// Perpendicular distance from `p` to the line through `a` and `b`.
/// Falls back to plain distance when `a` and `b` coincide.
fn point_line_distance(p: &Point, a: &Point, b: &Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let length = (dx * dx + dy * dy).sqrt();
    if length == 0.0 {
        return p.distance_to(a);
    }
    ((b.x - a.x) * (a.y - p.y) - (a.x - p.x) * (b.y - a.y)).abs() / length
}
