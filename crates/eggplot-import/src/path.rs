//! SVG path data parsing and adaptive curve flattening.
//!
//! Parses the SVG path mini-language (`M L H V C S Q T A Z` and their
//! relative forms) into pen strokes. Curves are flattened to polylines by
//! recursive midpoint (De Casteljau) subdivision, arcs via the
//! endpoint-to-center parameterization from the SVG arc implementation
//! notes, both refined until the deviation tolerance is met.

use eggplot_core::{Point, Segment};
use tracing::warn;

/// Squared deviation tolerance driving curve subdivision.
const TOLERANCE2: f64 = 0.01;

/// Extra flatness factor matching the arc resolution.
const FLATNESS_FACTOR: f64 = 5.0;

/// Recursion cap for curve subdivision: at most 2^18 points per curve.
const MAX_DEPTH: u32 = 18;

/// Parses SVG path data strings into pen strokes.
#[derive(Debug)]
pub struct PathSegmenter;

impl PathSegmenter {
    /// Segment a path "d" string into strokes.
    ///
    /// `M`/`m` starts a new stroke; `Z`/`z` closes the current subpath back
    /// to its start point. Unrecognized command letters are logged and
    /// dropped; segmentation continues with the remaining commands. The
    /// final in-progress stroke is returned even without a terminator.
    pub fn segment(path_data: &str) -> Vec<Segment> {
        let mut segments: Vec<Segment> = Vec::new();
        let mut segment = Segment::new();
        let mut last = Point::new(0.0, 0.0);
        let mut start: Option<Point> = None;
        let mut prev_cp: Option<Point> = None;

        let mut flush = |segment: &mut Segment, segments: &mut Vec<Segment>| {
            if !segment.points.is_empty() {
                segments.push(std::mem::take(segment));
            }
        };

        for (op, args) in split_commands(path_data) {
            match op {
                'M' => {
                    flush(&mut segment, &mut segments);
                    let points = parse_points(&args);
                    start = points.first().copied();
                    segment.points.extend_from_slice(&points);
                    if let Some(p) = points.last() {
                        last = *p;
                    }
                }
                'm' => {
                    flush(&mut segment, &mut segments);
                    start = None;
                    for p in parse_points(&args) {
                        let point = Point::new(last.x + p.x, last.y + p.y);
                        if start.is_none() {
                            start = Some(point);
                        }
                        segment.points.push(point);
                        last = point;
                    }
                }
                'L' => {
                    for p in parse_points(&args) {
                        segment.points.push(p);
                        last = p;
                    }
                }
                'l' => {
                    for p in parse_points(&args) {
                        let point = Point::new(last.x + p.x, last.y + p.y);
                        segment.points.push(point);
                        last = point;
                    }
                }
                'H' => {
                    for d in parse_numbers(&args) {
                        let point = Point::new(d, last.y);
                        segment.points.push(point);
                        last = point;
                    }
                }
                'h' => {
                    for d in parse_numbers(&args) {
                        let point = Point::new(last.x + d, last.y);
                        segment.points.push(point);
                        last = point;
                    }
                }
                'V' => {
                    for d in parse_numbers(&args) {
                        let point = Point::new(last.x, d);
                        segment.points.push(point);
                        last = point;
                    }
                }
                'v' => {
                    for d in parse_numbers(&args) {
                        let point = Point::new(last.x, last.y + d);
                        segment.points.push(point);
                        last = point;
                    }
                }
                'Z' | 'z' => {
                    if let Some(s) = start {
                        segment.points.push(s);
                        last = s;
                    }
                }
                'C' => {
                    for chunk in parse_points(&args).chunks_exact(3) {
                        let (p2, p3, p4) = (chunk[0], chunk[1], chunk[2]);
                        add_cubic(&mut segment.points, last, p2, p3, p4, 0);
                        segment.points.push(p4);
                        last = p4;
                        prev_cp = Some(p3);
                    }
                }
                'c' => {
                    for chunk in parse_points(&args).chunks_exact(3) {
                        let p2 = Point::new(last.x + chunk[0].x, last.y + chunk[0].y);
                        let p3 = Point::new(last.x + chunk[1].x, last.y + chunk[1].y);
                        let p4 = Point::new(last.x + chunk[2].x, last.y + chunk[2].y);
                        add_cubic(&mut segment.points, last, p2, p3, p4, 0);
                        segment.points.push(p4);
                        last = p4;
                        prev_cp = Some(p3);
                    }
                }
                'S' => {
                    for chunk in parse_points(&args).chunks_exact(2) {
                        let p2 = reflect(last, prev_cp);
                        let (p3, p4) = (chunk[0], chunk[1]);
                        add_cubic(&mut segment.points, last, p2, p3, p4, 0);
                        segment.points.push(p4);
                        last = p4;
                        prev_cp = Some(p3);
                    }
                }
                's' => {
                    for chunk in parse_points(&args).chunks_exact(2) {
                        let p2 = reflect(last, prev_cp);
                        let p3 = Point::new(last.x + chunk[0].x, last.y + chunk[0].y);
                        let p4 = Point::new(last.x + chunk[1].x, last.y + chunk[1].y);
                        add_cubic(&mut segment.points, last, p2, p3, p4, 0);
                        segment.points.push(p4);
                        last = p4;
                        prev_cp = Some(p3);
                    }
                }
                'Q' => {
                    for chunk in parse_points(&args).chunks_exact(2) {
                        let (p2, p3) = (chunk[0], chunk[1]);
                        add_quadratic(&mut segment.points, last, p2, p3, 0);
                        segment.points.push(p3);
                        last = p3;
                        prev_cp = Some(p2);
                    }
                }
                'q' => {
                    for chunk in parse_points(&args).chunks_exact(2) {
                        let p2 = Point::new(last.x + chunk[0].x, last.y + chunk[0].y);
                        let p3 = Point::new(last.x + chunk[1].x, last.y + chunk[1].y);
                        add_quadratic(&mut segment.points, last, p2, p3, 0);
                        segment.points.push(p3);
                        last = p3;
                        prev_cp = Some(p2);
                    }
                }
                'T' => {
                    for p3 in parse_points(&args) {
                        let p2 = reflect(last, prev_cp);
                        add_quadratic(&mut segment.points, last, p2, p3, 0);
                        segment.points.push(p3);
                        last = p3;
                        prev_cp = Some(p2);
                    }
                }
                't' => {
                    for p in parse_points(&args) {
                        let p2 = reflect(last, prev_cp);
                        let p3 = Point::new(last.x + p.x, last.y + p.y);
                        add_quadratic(&mut segment.points, last, p2, p3, 0);
                        segment.points.push(p3);
                        last = p3;
                        prev_cp = Some(p2);
                    }
                }
                'A' | 'a' => {
                    for chunk in parse_numbers(&args).chunks_exact(7) {
                        let (rx, ry) = (chunk[0], chunk[1]);
                        let xrot = chunk[2];
                        let large_arc = chunk[3] != 0.0;
                        let sweep = chunk[4] != 0.0;
                        let p2 = if op == 'A' {
                            Point::new(chunk[5], chunk[6])
                        } else {
                            Point::new(last.x + chunk[5], last.y + chunk[6])
                        };
                        add_arc(&mut segment.points, last, rx, ry, xrot, large_arc, sweep, p2);
                        last = p2;
                    }
                }
                // split_commands never yields letters outside the command set
                _ => {}
            }
        }
        flush(&mut segment, &mut segments);
        segments
    }
}

/// Reflect the previous control point across the current point for the
/// shorthand curve commands. The reflection always uses the most recent
/// explicit control point, whatever the preceding command was; a shorthand
/// at the very start of a path falls back to the current point.
fn reflect(last: Point, prev_cp: Option<Point>) -> Point {
    match prev_cp {
        Some(cp) => Point::new(2.0 * last.x - cp.x, 2.0 * last.y - cp.y),
        None => last,
    }
}

/// Split path data into (command letter, argument text) pairs.
///
/// An alphabetic character outside the command set (and not an exponent
/// marker) is an unknown operation: it is logged, the command in progress
/// is flushed, and any text up to the next recognized command is discarded.
fn split_commands(path_data: &str) -> Vec<(char, String)> {
    let mut out = Vec::new();
    let mut op: Option<char> = None;
    let mut args = String::new();

    for c in path_data.chars() {
        if is_command(c) {
            if let Some(prev) = op.take() {
                out.push((prev, std::mem::take(&mut args)));
            }
            op = Some(c);
        } else if c.is_ascii_alphabetic() && c != 'e' && c != 'E' {
            warn!("unhandled path operation: {c}");
            if let Some(prev) = op.take() {
                out.push((prev, std::mem::take(&mut args)));
            }
        } else if op.is_some() {
            args.push(c);
        }
    }
    if let Some(prev) = op {
        out.push((prev, args));
    }
    out
}

fn is_command(c: char) -> bool {
    "MLHVCSQTAZ".contains(c.to_ascii_uppercase())
}

/// Tokenize an argument list into numbers.
///
/// Handles the SVG quirks where numbers run together without separators: a
/// second decimal point starts a new number (`1.5.5` is 1.5 and .5), and a
/// minus sign starts a new number unless it follows an exponent marker
/// (`1-2` is 1 and -2, `1e-2` is a single number).
fn parse_numbers(args: &str) -> Vec<f64> {
    let mut numbers = Vec::new();
    let mut current = String::new();
    let mut dots = 0u32;

    fn push_current(current: &mut String, dots: &mut u32, numbers: &mut Vec<f64>) {
        if let Ok(parsed) = current.trim().parse::<f64>() {
            numbers.push(parsed);
        }
        *dots = 0;
        current.clear();
    }

    let mut prev = '\0';
    for c in args.chars() {
        if c == '.' {
            dots += 1;
            if dots == 2 {
                push_current(&mut current, &mut dots, &mut numbers);
                dots = 1;
            }
        }

        if c == '-' && prev != 'e' && prev != 'E' {
            push_current(&mut current, &mut dots, &mut numbers);
        }

        if c == ' ' || c == ',' || c == '\t' || c == '\n' || c == '\r' {
            push_current(&mut current, &mut dots, &mut numbers);
            prev = c;
            continue;
        }
        current.push(c);
        prev = c;
    }
    push_current(&mut current, &mut dots, &mut numbers);

    numbers
}

/// Tokenize an argument list into coordinate pairs; a trailing unpaired
/// number is dropped.
fn parse_points(args: &str) -> Vec<Point> {
    parse_numbers(args)
        .chunks_exact(2)
        .map(|pair| Point::new(pair[0], pair[1]))
        .collect()
}

/// Flatten a cubic Bézier by recursive midpoint subdivision.
///
/// Subdivision stops once the perpendicular deviation of the control points
/// from the chord, scaled by the squared chord length, drops below the
/// tolerance. Interior points only; the caller appends the curve endpoint.
fn add_cubic(points: &mut Vec<Point>, p1: Point, p2: Point, p3: Point, p4: Point, level: u32) {
    if level > MAX_DEPTH {
        return;
    }

    let x12 = (p1.x + p2.x) / 2.0;
    let y12 = (p1.y + p2.y) / 2.0;
    let x23 = (p2.x + p3.x) / 2.0;
    let y23 = (p2.y + p3.y) / 2.0;
    let x34 = (p3.x + p4.x) / 2.0;
    let y34 = (p3.y + p4.y) / 2.0;
    let x123 = (x12 + x23) / 2.0;
    let y123 = (y12 + y23) / 2.0;
    let x234 = (x23 + x34) / 2.0;
    let y234 = (y23 + y34) / 2.0;
    let x1234 = (x123 + x234) / 2.0;
    let y1234 = (y123 + y234) / 2.0;

    let dx = p4.x - p1.x;
    let dy = p4.y - p1.y;

    let d2 = ((p2.x - p4.x) * dy - (p2.y - p4.y) * dx).abs();
    let d3 = ((p3.x - p4.x) * dy - (p3.y - p4.y) * dx).abs();

    if (d2 + d3) * (d2 + d3) < FLATNESS_FACTOR * TOLERANCE2 * (dx * dx + dy * dy) {
        points.push(Point::new(x1234, y1234));
        return;
    }

    add_cubic(
        points,
        p1,
        Point::new(x12, y12),
        Point::new(x123, y123),
        Point::new(x1234, y1234),
        level + 1,
    );
    add_cubic(
        points,
        Point::new(x1234, y1234),
        Point::new(x234, y234),
        Point::new(x34, y34),
        p4,
        level + 1,
    );
}

/// Flatten a quadratic Bézier by recursive midpoint subdivision.
fn add_quadratic(points: &mut Vec<Point>, p1: Point, p2: Point, p3: Point, level: u32) {
    if level > MAX_DEPTH {
        return;
    }

    let x12 = (p1.x + p2.x) / 2.0;
    let y12 = (p1.y + p2.y) / 2.0;
    let x23 = (p2.x + p3.x) / 2.0;
    let y23 = (p2.y + p3.y) / 2.0;
    let x123 = (x12 + x23) / 2.0;
    let y123 = (y12 + y23) / 2.0;

    let dx = p3.x - p1.x;
    let dy = p3.y - p1.y;
    let d = ((p2.x - p3.x) * dy - (p2.y - p3.y) * dx).abs();

    if d * d <= FLATNESS_FACTOR * TOLERANCE2 * (dx * dx + dy * dy) {
        points.push(Point::new(x123, y123));
        return;
    }

    add_quadratic(
        points,
        p1,
        Point::new(x12, y12),
        Point::new(x123, y123),
        level + 1,
    );
    add_quadratic(
        points,
        Point::new(x123, y123),
        Point::new(x23, y23),
        p3,
        level + 1,
    );
}

/// Flatten an elliptical arc.
///
/// Endpoint parameterization is converted to a center + sweep angle per the
/// SVG arc implementation notes, then the parametric angle range is
/// recursively refined with the same midpoint-deviation test used for the
/// Bézier curves.
#[allow(clippy::too_many_arguments)]
fn add_arc(
    points: &mut Vec<Point>,
    p1: Point,
    rx: f64,
    ry: f64,
    xrot: f64,
    large_arc: bool,
    sweep: bool,
    p2: Point,
) {
    // Zero radii degenerate to a straight line per the implementation notes.
    if rx == 0.0 || ry == 0.0 {
        points.push(p2);
        return;
    }

    let phi = xrot.to_radians();
    let cp = phi.cos();
    let sp = phi.sin();
    let dx = 0.5 * (p1.x - p2.x);
    let dy = 0.5 * (p1.y - p2.y);
    let xx = cp * dx + sp * dy;
    let yy = -sp * dx + cp * dy;

    let denom = (rx * yy).powi(2) + (ry * xx).powi(2);
    let mut r2 = ((rx * ry).powi(2) - (rx * yy).powi(2) - (ry * xx).powi(2)) / denom;
    if r2 < 0.0 {
        r2 = 0.0;
    }
    let mut rr = r2.sqrt();
    if large_arc == sweep {
        rr = -rr;
    }
    let ccx = rr * rx * yy / ry;
    let ccy = -rr * ry * xx / rx;
    let cx = cp * ccx - sp * ccy + 0.5 * (p1.x + p2.x);
    let cy = sp * ccx + cp * ccy + 0.5 * (p1.y + p2.y);

    let angle = |u: [f64; 2], v: [f64; 2]| -> f64 {
        let dot = u[0] * v[0] + u[1] * v[1];
        let len = ((u[0] * u[0] + u[1] * u[1]) * (v[0] * v[0] + v[1] * v[1])).sqrt();
        let a = (dot / len).clamp(-1.0, 1.0).acos();
        if u[0] * v[1] > u[1] * v[0] {
            a
        } else {
            -a
        }
    };

    let u = [(xx - ccx) / rx, (yy - ccy) / ry];
    let v = [(-xx - ccx) / rx, (-yy - ccy) / ry];
    let psi = angle([1.0, 0.0], u);
    let mut delta = angle(u, v);
    if sweep && delta < 0.0 {
        delta += std::f64::consts::TAU;
    }
    if !sweep && delta > 0.0 {
        delta -= std::f64::consts::TAU;
    }

    let vertex = |pct: f64| -> Point {
        let theta = psi + delta * pct;
        let (st, ct) = theta.sin_cos();
        Point::new(
            cp * rx * ct - sp * ry * st + cx,
            sp * rx * ct + cp * ry * st + cy,
        )
    };

    fn refine(
        points: &mut Vec<Point>,
        vertex: &dyn Fn(f64) -> Point,
        t1: f64,
        t2: f64,
        c1: Point,
        c5: Point,
        level: u32,
    ) {
        if level > MAX_DEPTH {
            return;
        }
        let t_range = t2 - t1;
        let t_half = t1 + 0.5 * t_range;
        let c2 = vertex(t1 + 0.25 * t_range);
        let c3 = vertex(t_half);
        let c4 = vertex(t1 + 0.75 * t_range);

        if distance_sq(c2, midpoint(c1, c3)) > TOLERANCE2 {
            refine(points, vertex, t1, t_half, c1, c3, level + 1);
        }
        points.push(c3);
        if distance_sq(c4, midpoint(c3, c5)) > TOLERANCE2 {
            refine(points, vertex, t_half, t2, c3, c5, level + 1);
        }
    }

    let c1 = vertex(0.0);
    let c5 = vertex(1.0);
    points.push(c1);
    refine(points, &vertex, 0.0, 1.0, c1, c5, 0);
    points.push(c5);
}

fn distance_sq(a: Point, b: Point) -> f64 {
    (b.x - a.x).powi(2) + (b.y - a.y).powi(2)
}

fn midpoint(a: Point, b: Point) -> Point {
    Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xy(segment: &Segment) -> Vec<(f64, f64)> {
        segment.points.iter().map(|p| (p.x, p.y)).collect()
    }

    #[test]
    fn test_triangle_path() {
        let segments = PathSegmenter::segment("M0,0 L10,0 L10,10 Z");
        assert_eq!(segments.len(), 1);
        assert_eq!(
            xy(&segments[0]),
            vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 0.0)]
        );
    }

    #[test]
    fn test_implicit_command_repetition() {
        let segments = PathSegmenter::segment("M0,0 L1,0 2,0 3,0");
        assert_eq!(
            xy(&segments[0]),
            vec![(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 0.0)]
        );
    }

    #[test]
    fn test_relative_moveto_sets_start() {
        let segments = PathSegmenter::segment("m 1,1 2,2 z");
        assert_eq!(xy(&segments[0]), vec![(1.0, 1.0), (3.0, 3.0), (1.0, 1.0)]);
    }

    #[test]
    fn test_moveto_splits_segments() {
        let segments = PathSegmenter::segment("M0,0 L1,0 M5,5 L6,5");
        assert_eq!(segments.len(), 2);
        assert_eq!(xy(&segments[0]), vec![(0.0, 0.0), (1.0, 0.0)]);
        assert_eq!(xy(&segments[1]), vec![(5.0, 5.0), (6.0, 5.0)]);
    }

    #[test]
    fn test_horizontal_vertical() {
        let segments = PathSegmenter::segment("M1,1 h 4 V 7 H 0 v -2");
        assert_eq!(
            xy(&segments[0]),
            vec![(1.0, 1.0), (5.0, 1.0), (5.0, 7.0), (0.0, 7.0), (0.0, 5.0)]
        );
    }

    #[test]
    fn test_run_together_numbers() {
        assert_eq!(parse_numbers("1.5.5"), vec![1.5, 0.5]);
        assert_eq!(parse_numbers("1-2"), vec![1.0, -2.0]);
        assert_eq!(parse_numbers("1e-2 5"), vec![0.01, 5.0]);
        assert_eq!(parse_numbers("3,4 -1,.5"), vec![3.0, 4.0, -1.0, 0.5]);
    }

    #[test]
    fn test_unknown_op_is_dropped() {
        let segments = PathSegmenter::segment("M0,0 B5,5 L10,0");
        assert_eq!(segments.len(), 1);
        assert_eq!(xy(&segments[0]), vec![(0.0, 0.0), (10.0, 0.0)]);
    }

    #[test]
    fn test_cubic_endpoint_and_continuity() {
        let segments = PathSegmenter::segment("M0,0 C 0,10 10,10 10,0");
        let points = &segments[0].points;
        assert!(points.len() > 3, "curve should be subdivided");
        let last = points.last().unwrap();
        assert_eq!((last.x, last.y), (10.0, 0.0));
    }

    #[test]
    fn test_shorthand_reflection_without_prior_curve() {
        // S after a line command still reflects (the literal rule): with no
        // control point recorded yet, the current point stands in.
        let segments = PathSegmenter::segment("M0,0 L5,0 S10,5 10,0");
        let last = *segments[0].points.last().unwrap();
        assert_eq!((last.x, last.y), (10.0, 0.0));
    }

    #[test]
    fn test_quadratic_shorthand_chain() {
        let segments = PathSegmenter::segment("M0,0 Q 5,5 10,0 T 20,0");
        let last = *segments[0].points.last().unwrap();
        assert_eq!((last.x, last.y), (20.0, 0.0));
    }

    // Deviation of a flattened cubic from the true curve stays below an
    // absolute bound derived from the tolerance, independent of scale.
    #[test]
    fn test_cubic_flattening_tolerance_scale_invariant() {
        const K: f64 = 0.551_915_024_494;
        for r in [10.0f64, 100.0, 1000.0] {
            let d = format!("M{r},0 C {r},{} {},{r} 0,{r}", r * K, r * K);
            let segments = PathSegmenter::segment(&d);
            let points = &segments[0].points;

            let curve = |t: f64| {
                let (p1, p2, p3, p4) = (
                    (r, 0.0),
                    (r, r * K),
                    (r * K, r),
                    (0.0, r),
                );
                let mt = 1.0 - t;
                let x = mt.powi(3) * p1.0
                    + 3.0 * mt * mt * t * p2.0
                    + 3.0 * mt * t * t * p3.0
                    + t.powi(3) * p4.0;
                let y = mt.powi(3) * p1.1
                    + 3.0 * mt * mt * t * p2.1
                    + 3.0 * mt * t * t * p3.1
                    + t.powi(3) * p4.1;
                (x, y)
            };

            let mut max_deviation = 0.0f64;
            for i in 0..=256 {
                let (cx, cy) = curve(i as f64 / 256.0);
                let mut best = f64::MAX;
                for pair in points.windows(2) {
                    best = best.min(point_segment_distance(
                        cx, cy, pair[0].x, pair[0].y, pair[1].x, pair[1].y,
                    ));
                }
                max_deviation = max_deviation.max(best);
            }
            assert!(
                max_deviation < 0.25,
                "radius {r}: deviation {max_deviation}"
            );
        }
    }

    #[test]
    fn test_subdivision_depth_bound() {
        // Coincident control points never satisfy the flatness test; the
        // depth cap must still halt the recursion.
        let segments = PathSegmenter::segment("M0,0 C0,0 0,0 0,0");
        assert!(segments[0].points.len() <= 1 << 18);
    }

    #[test]
    fn test_arc_stays_on_circle() {
        let segments = PathSegmenter::segment("M0,0 A 5,5 0 0 1 10,0");
        let points = &segments[0].points;
        assert!(points.len() > 4);
        for p in points {
            let dist = ((p.x - 5.0).powi(2) + p.y.powi(2)).sqrt();
            assert!((dist - 5.0).abs() < 0.3, "point {p} off the arc");
        }
        let last = points.last().unwrap();
        assert!((last.x - 10.0).abs() < 1e-9 && last.y.abs() < 1e-9);
    }

    #[test]
    fn test_zero_radius_arc_is_a_line() {
        let segments = PathSegmenter::segment("M0,0 A 0,5 0 0 1 10,0");
        assert_eq!(xy(&segments[0]), vec![(0.0, 0.0), (10.0, 0.0)]);
    }

    fn point_segment_distance(px: f64, py: f64, ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
        let (dx, dy) = (bx - ax, by - ay);
        let len2 = dx * dx + dy * dy;
        let t = if len2 == 0.0 {
            0.0
        } else {
            (((px - ax) * dx + (py - ay) * dy) / len2).clamp(0.0, 1.0)
        };
        let (cx, cy) = (ax + t * dx, ay + t * dy);
        ((px - cx).powi(2) + (py - cy).powi(2)).sqrt()
    }
}
