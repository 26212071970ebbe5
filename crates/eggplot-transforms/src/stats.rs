//! Before/after drawing statistics.

use eggplot_core::{Layer, HOME};

/// Aggregate metrics over a layer set.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DrawingStats {
    /// Total number of points across all layers
    pub point_count: usize,
    /// Total pen-up travel distance, starting from home
    pub travel_distance: f64,
    /// Total number of segments across all layers
    pub segment_count: usize,
}

impl DrawingStats {
    /// Computes stats for a layer set. Travel distance is the sum of the
    /// pen-up gaps: home to the first segment, then each segment's end to the
    /// next segment's start, in draw order across all layers.
    pub fn from_layers(layers: &[Layer]) -> Self {
        let mut stats = DrawingStats::default();
        let mut position = HOME;
        for layer in layers {
            for segment in &layer.segments {
                stats.point_count += segment.points.len();
                stats.segment_count += 1;
                if let (Some(start), Some(end)) = (segment.first(), segment.last()) {
                    stats.travel_distance += position.distance_to(start);
                    position = *end;
                }
            }
        }
        stats
    }
}

/// Relative deltas between two drawings, as `(new - old) / old` per metric.
///
/// An all-empty source drawing yields `NaN` or infinite ratios; callers
/// display them as-is rather than special-casing the degenerate input.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Improvements {
    /// Relative change in point count
    pub points: f64,
    /// Relative change in travel distance
    pub travel: f64,
    /// Relative change in segment count
    pub segments: f64,
}

/// Compares two layer sets and returns the relative change of each metric.
pub fn get_improvements(old_layers: &[Layer], new_layers: &[Layer]) -> Improvements {
    let old = DrawingStats::from_layers(old_layers);
    let new = DrawingStats::from_layers(new_layers);
    Improvements {
        points: (new.point_count as f64 - old.point_count as f64) / old.point_count as f64,
        travel: (new.travel_distance - old.travel_distance) / old.travel_distance,
        segments: (new.segment_count as f64 - old.segment_count as f64) / old.segment_count as f64,
    }
}
