//! Instruction text codec.
//!
//! One instruction per line:
//!
//! | Instruction | Meaning |
//! |---|---|
//! | `M1` / `M0` | enable / disable motors |
//! | `H` | move to home position |
//! | `P0` / `P1` | pen up / pen down |
//! | `S <description>` | switch to a named layer |
//! | `T <x> <y>` | move to absolute coordinate |
//! | `Z <percent>` | cumulative travel-distance progress marker |
//!
//! Encoding is lossy forward (coordinates round to 2 decimals, progress
//! markers are interleaved); decoding recovers the drawable geometry up to
//! that rounding, plus layer boundaries and per-point source line numbers.

use eggplot_core::{Layer, Point, Segment, HOME};
use tracing::{debug, warn};

/// Firmware reads instructions into a fixed 30-byte line buffer.
const MAX_LINE_LEN: usize = 29;

/// Encodes layers as instruction text.
///
/// Walks every layer, segment and point in order. Each segment becomes an
/// approach move while the pen is up, `P1`, the pen-down moves, then `P0`.
/// An `S` line precedes each layer only when there is more than one layer.
/// A `Z` progress line is emitted whenever the rounded percentage of
/// cumulative travel (out of the total predicted travel from home) changes.
pub fn encode(layers: &[Layer]) -> String {
    let total_travel = predicted_travel(layers);
    let mut lines: Vec<String> = vec!["M1".to_string(), "H".to_string()];

    let mut position = HOME;
    let mut travelled = 0.0;
    let mut last_percent: i64 = 0;
    let multi_layer = layers.len() > 1;

    for layer in layers {
        if multi_layer {
            lines.push(format!("S {}", layer.description));
        }
        for segment in &layer.segments {
            let mut pen_down = false;
            for point in &segment.points {
                lines.push(format!("T {} {}", fmt_coord(point.x), fmt_coord(point.y)));
                if !pen_down {
                    lines.push("P1".to_string());
                    pen_down = true;
                }
                travelled += position.distance_to(point);
                position = *point;
                if total_travel > 0.0 {
                    let percent = (travelled / total_travel * 100.0).round() as i64;
                    if percent != last_percent {
                        lines.push(format!("Z {percent}"));
                        last_percent = percent;
                    }
                }
            }
            if pen_down {
                lines.push("P0".to_string());
            }
        }
    }

    lines.push("H".to_string());
    lines.push("M0".to_string());

    let mut text = String::new();
    for line in &mut lines {
        truncate_line(line);
        text.push_str(line);
        text.push('\n');
    }
    text
}

/// Decodes instruction text back into layers.
///
/// Replays the instructions, tracking the pen state and a pending approach
/// position. `P1` opens a segment at the pending position; `T` while the pen
/// is down appends a point tagged with its zero-based line index; `S` closes
/// the current layer and opens a named one. Geometry arriving before any `S`
/// goes into a lazily created unnamed layer. Unknown instructions are
/// ignored; malformed coordinates skip that line. Decoding never fails.
pub fn decode(text: &str) -> Vec<Layer> {
    let mut layers: Vec<Layer> = Vec::new();
    let mut current: Option<Layer> = None;
    let mut pen_down = false;
    let mut pending_start: Option<Point> = None;

    for (line_number, line) in text.lines().enumerate() {
        let line = line.trim();
        let (op, args) = line.split_once(' ').unwrap_or((line, ""));
        match op {
            "T" => {
                let mut parts = args.split_whitespace();
                let coords = (
                    parts.next().and_then(|v| v.parse::<f64>().ok()),
                    parts.next().and_then(|v| v.parse::<f64>().ok()),
                );
                let (Some(x), Some(y)) = coords else {
                    warn!(line_number, line, "skipping move with malformed coordinates");
                    continue;
                };
                let point = Point::with_src_line(x, y, line_number);
                if pen_down {
                    let layer = current.get_or_insert_with(|| Layer::new(None));
                    if let Some(segment) = layer.segments.last_mut() {
                        segment.points.push(point);
                    }
                } else {
                    pending_start = Some(point);
                }
            }
            "P1" => {
                pen_down = true;
                if let Some(start) = pending_start.take() {
                    let layer = current.get_or_insert_with(|| Layer::new(None));
                    layer.segments.push(Segment::from_points(vec![start]));
                }
            }
            "P0" => pen_down = false,
            "S" => {
                if let Some(layer) = current.take() {
                    layers.push(layer);
                }
                current = Some(Layer::new(Some(args.to_string())));
            }
            "M1" | "M0" | "H" | "Z" => {}
            _ => debug!(line_number, line, "ignoring unknown instruction"),
        }
    }

    if let Some(layer) = current.take() {
        layers.push(layer);
    }
    layers
}

/// Total travel over every point move, starting from home.
fn predicted_travel(layers: &[Layer]) -> f64 {
    let mut position = HOME;
    let mut total = 0.0;
    for layer in layers {
        for segment in &layer.segments {
            for point in &segment.points {
                total += position.distance_to(point);
                position = *point;
            }
        }
    }
    total
}

/// Formats a coordinate rounded half-up to 2 decimal places, trailing zeros
/// trimmed.
///
/// Rounding works on the decimal digit string rather than by multiplying and
/// rounding the binary float, so values like `1.005` (whose nearest double is
/// just below the decimal midpoint) still round up to `1.01`.
fn fmt_coord(value: f64) -> String {
    let repr = format!("{value}");
    if !value.is_finite() || repr.contains('e') || repr.contains('E') {
        return repr;
    }
    let magnitude = repr.strip_prefix('-').unwrap_or(&repr);
    let (int_digits, frac_digits) = magnitude.split_once('.').unwrap_or((magnitude, ""));
    if frac_digits.len() <= 2 {
        // shortest float repr carries no trailing zeros to trim
        return repr;
    }

    // value * 100, rounded half-up, as an integer digit string
    let mut hundredths: i64 = match format!("{int_digits}{}", &frac_digits[..2]).parse() {
        Ok(units) => units,
        Err(_) => return repr,
    };
    if frac_digits.as_bytes()[2] >= b'5' {
        hundredths += 1;
    }

    let sign = if value < 0.0 && hundredths != 0 { "-" } else { "" };
    let whole = hundredths / 100;
    let frac = hundredths % 100;
    if frac == 0 {
        format!("{sign}{whole}")
    } else if frac % 10 == 0 {
        format!("{sign}{whole}.{}", frac / 10)
    } else {
        format!("{sign}{whole}.{frac:02}")
    }
}

/// Clips a line to the firmware's buffer, respecting UTF-8 boundaries.
fn truncate_line(line: &mut String) {
    if line.len() <= MAX_LINE_LEN {
        return;
    }
    let mut end = MAX_LINE_LEN;
    while !line.is_char_boundary(end) {
        end -= 1;
    }
    line.truncate(end);
}

#[cfg(test)]
mod tests {
    use super::*;
    use eggplot_core::NO_NAME;

    fn layer(id: Option<&str>, segments: Vec<Vec<(f64, f64)>>) -> Layer {
        let mut layer = Layer::new(id.map(str::to_string));
        layer.segments = segments
            .into_iter()
            .map(|points| {
                Segment::from_points(points.into_iter().map(|(x, y)| Point::new(x, y)).collect())
            })
            .collect();
        layer
    }

    #[test]
    fn test_encode_single_point_segment() {
        let layers = vec![layer(None, vec![vec![(1.005, 2.0)]])];
        let text = encode(&layers);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec!["M1", "H", "T 1.01 2", "P1", "Z 100", "P0", "H", "M0"]
        );
    }

    #[test]
    fn test_encode_multi_layer_emits_switches() {
        let layers = vec![
            layer(Some("red"), vec![vec![(0.0, 0.0), (1.0, 0.0)]]),
            layer(Some("blue"), vec![vec![(2.0, 0.0)]]),
        ];
        let text = encode(&layers);
        assert!(text.contains("S red\n"));
        assert!(text.contains("S blue\n"));
    }

    #[test]
    fn test_encode_single_layer_has_no_switch() {
        let layers = vec![layer(Some("red"), vec![vec![(0.0, 0.0)]])];
        assert!(!encode(&layers).contains("S "));
    }

    #[test]
    fn test_encode_emits_progress_markers() {
        // two equal-length strokes from home: progress passes 50 then 100
        let layers = vec![layer(
            None,
            vec![vec![(0.0, 400.0), (100.0, 400.0)], vec![(100.0, 400.0), (0.0, 400.0)]],
        )];
        let text = encode(&layers);
        assert!(text.contains("Z 50\n"));
        assert!(text.contains("Z 100\n"));
    }

    #[test]
    fn test_line_length_cap() {
        let layers = vec![
            layer(
                Some("a very long layer description indeed"),
                vec![vec![(0.0, 0.0)]],
            ),
            layer(Some("b"), vec![vec![(1.0, 0.0)]]),
        ];
        for line in encode(&layers).lines() {
            assert!(line.len() <= 29, "line too long: {line:?}");
        }
    }

    #[test]
    fn test_coordinate_rounding() {
        assert_eq!(fmt_coord(1.005), "1.01");
        assert_eq!(fmt_coord(2.004), "2");
        assert_eq!(fmt_coord(2.0), "2");
        assert_eq!(fmt_coord(2.5), "2.5");
        assert_eq!(fmt_coord(2.104), "2.1");
        assert_eq!(fmt_coord(-1.005), "-1.01");
        assert_eq!(fmt_coord(-0.001), "0");
        assert_eq!(fmt_coord(1234.567), "1234.57");
    }

    #[test]
    fn test_decode_recovers_layers_and_lines() {
        let text = "M1\nH\nS red\nT 1 2\nP1\nT 3 4\nP0\nS blue\nT 5 6\nP1\nP0\nH\nM0\n";
        let layers = decode(text);
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[0].description, "red");
        assert_eq!(layers[1].description, "blue");

        let first = &layers[0].segments[0];
        assert_eq!(first.points.len(), 2);
        assert_eq!(first.points[0].src_line, Some(3));
        assert_eq!(first.points[1].src_line, Some(5));
        assert_eq!((first.points[1].x, first.points[1].y), (3.0, 4.0));

        assert_eq!(layers[1].segments[0].points.len(), 1);
    }

    #[test]
    fn test_decode_unnamed_layer_before_switch() {
        let layers = decode("T 1 1\nP1\nT 2 2\nP0\n");
        assert_eq!(layers.len(), 1);
        assert_eq!(layers[0].id, None);
        assert_eq!(layers[0].description, NO_NAME);
    }

    #[test]
    fn test_decode_tolerates_garbage() {
        let layers = decode("T 1 1\nP1\nT x y\nT 2 2\nXYZZY\nP0\n");
        assert_eq!(layers.len(), 1);
        let points = &layers[0].segments[0].points;
        assert_eq!(points.len(), 2);
        assert_eq!((points[1].x, points[1].y), (2.0, 2.0));
    }

    #[test]
    fn test_decode_empty_input() {
        assert!(decode("").is_empty());
        assert!(decode("M1\nH\nH\nM0\n").is_empty());
    }

    #[test]
    fn test_round_trip_preserves_structure() {
        let layers = vec![
            layer(
                Some("red"),
                vec![
                    vec![(0.0, 400.0), (10.123, 400.456), (20.0, 410.0)],
                    vec![(100.0, 100.0), (110.0, 110.0)],
                ],
            ),
            layer(Some("blue"), vec![vec![(5.5, 6.6)]]),
        ];
        let decoded = decode(&encode(&layers));
        assert_eq!(decoded.len(), layers.len());
        for (before, after) in layers.iter().zip(&decoded) {
            assert_eq!(before.segments.len(), after.segments.len());
            for (s_before, s_after) in before.segments.iter().zip(&after.segments) {
                assert_eq!(s_before.points.len(), s_after.points.len());
                for (p_before, p_after) in s_before.points.iter().zip(&s_after.points) {
                    assert!(((p_before.x * 100.0).round() / 100.0 - p_after.x).abs() < 1e-9);
                    assert!(((p_before.y * 100.0).round() / 100.0 - p_after.y).abs() < 1e-9);
                }
            }
        }
    }
}
