//! # Eggplot Transforms
//!
//! Geometry transforms applied between import and instruction generation.
//!
//! All operations take the full layer list and mutate it in place; callers
//! pre-clone when they need to keep the original (the [`Pipeline`] does this
//! for them). The individual stages are:
//! - [`scale_layers`]: horizontal/vertical scaling with a vertical offset
//! - [`optimize_travel`]: greedy nearest-neighbor reordering per layer
//! - [`merge_consecutive_segments`]: bridges pen-lifts shorter than a threshold
//! - [`simplify_segments`]: removes near-collinear interior points
//!
//! [`get_improvements`] reports the relative before/after deltas so the caller
//! can show what a pipeline run bought.

pub mod ops;
pub mod pipeline;
pub mod stats;

pub use ops::{merge_consecutive_segments, optimize_travel, scale_layers, simplify_segments};
pub use pipeline::{Pipeline, PipelineOptions};
pub use stats::{get_improvements, DrawingStats, Improvements};
