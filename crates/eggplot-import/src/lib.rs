//! # Eggplot Import
//!
//! Converts vector art into the plotter's layer/segment geometry model.
//!
//! Two stages:
//! - [`PathSegmenter`] parses an SVG path "d" string into polylines,
//!   flattening Bézier curves and elliptical arcs by adaptive recursive
//!   subdivision.
//! - [`SvgSegmenter`] walks a whole SVG document, resolves per-element
//!   transforms, synthesizes path data for basic shapes, and groups the
//!   resulting strokes into named layers.

pub mod path;
pub mod svg;

pub use path::PathSegmenter;
pub use svg::{Drawing, SvgSegmenter};
