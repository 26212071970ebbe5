//! Fixed-order application of the transform stages.

use eggplot_core::Layer;
use tracing::debug;

use crate::ops::{
    merge_consecutive_segments, optimize_travel, scale_layers, simplify_segments,
};
use crate::stats::{get_improvements, Improvements};

/// Knobs for one pipeline run.
///
/// Mirrors the persisted plot configuration; the session layer maps the
/// stored config onto this verbatim.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineOptions {
    /// Horizontal scale factor
    pub h_scale: f64,
    /// Vertical scale factor
    pub v_scale: f64,
    /// Vertical offset, added after scaling
    pub v_offset: f64,
    /// Scale horizontally about the center of the working width
    pub around_center: bool,
    /// Run the travel optimizer
    pub optimize_travel: bool,
    /// Allow the optimizer to reverse segments
    pub reverse_segments: bool,
    /// Merge segments separated by short pen-lifts
    pub merge_segments: bool,
    /// Pen-lift distance below which segments are merged
    pub min_travel_distance: f64,
    /// Drop near-collinear points
    pub simplify_segments: bool,
    /// Maximum deviation for a point to be dropped
    pub simplify_threshold: f64,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        PipelineOptions {
            h_scale: 1.0,
            v_scale: 1.0,
            v_offset: 0.0,
            around_center: true,
            optimize_travel: true,
            reverse_segments: true,
            merge_segments: true,
            min_travel_distance: 2.0,
            simplify_segments: true,
            simplify_threshold: 0.6,
        }
    }
}

/// Applies the transform stages in their fixed order.
///
/// Scale runs first, then travel optimization, then merge, then simplify.
/// Merging must see the optimized order so adjacent-in-time segments are the
/// candidates, and simplification runs last so it cannot perturb the
/// distance-based merge decisions.
#[derive(Debug)]
pub struct Pipeline;

impl Pipeline {
    /// Runs the configured stages over a clone of `layers` and returns the
    /// transformed set; the input is left untouched.
    pub fn apply(options: &PipelineOptions, layers: &[Layer]) -> Vec<Layer> {
        let mut transformed = layers.to_vec();

        scale_layers(
            &mut transformed,
            options.h_scale,
            options.v_scale,
            options.v_offset,
            options.around_center,
        );
        if options.optimize_travel {
            optimize_travel(&mut transformed, options.reverse_segments);
        }
        if options.merge_segments {
            merge_consecutive_segments(&mut transformed, options.min_travel_distance);
        }
        if options.simplify_segments {
            simplify_segments(&mut transformed, options.simplify_threshold);
        }

        debug!(
            layers = transformed.len(),
            points = transformed.iter().map(Layer::point_count).sum::<usize>(),
            "transform pipeline applied"
        );
        transformed
    }

    /// Convenience wrapper: applies the pipeline and reports the relative
    /// change per metric against the input.
    pub fn apply_with_improvements(
        options: &PipelineOptions,
        layers: &[Layer],
    ) -> (Vec<Layer>, Improvements) {
        let transformed = Self::apply(options, layers);
        let improvements = get_improvements(layers, &transformed);
        (transformed, improvements)
    }
}
