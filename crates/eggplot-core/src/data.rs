//! Data model for plotter drawings
//!
//! This module provides:
//! - Points in plotter-native units (rotation steps / pen steps, not pixels)
//! - Segments: one continuous pen-down stroke each
//! - Layers: named, reorderable groups of segments sharing a pen
//! - Working-area constants for the physical device

use serde::{Deserialize, Serialize};
use std::fmt;

/// Horizontal working width in motor steps: one full egg revolution.
pub const STEPS_PER_REV: f64 = 3200.0;

/// Vertical working height in pen-axis steps.
pub const WORK_HEIGHT: f64 = 800.0;

/// Home position of the pen carriage: leftmost, vertically centered.
pub const HOME: Point = Point {
    x: 0.0,
    y: WORK_HEIGHT / 2.0,
    src_line: None,
};

/// Description used for geometry that belongs to no named layer.
pub const NO_NAME: &str = "< No Name >";

/// A point in plotter-native units.
///
/// `src_line` is only set on points reconstructed from instruction text and
/// identifies the zero-based instruction line that produced the point. It is
/// what lets live print progress (an instruction index) be mapped back onto
/// the geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Point {
    /// Horizontal position (rotation steps)
    pub x: f64,
    /// Vertical position (pen steps)
    pub y: f64,
    /// Instruction line this point was decoded from, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src_line: Option<usize>,
}

impl Point {
    /// Create a new point with no instruction-line tag.
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            src_line: None,
        }
    }

    /// Create a point tagged with the instruction line it was decoded from.
    pub fn with_src_line(x: f64, y: f64, src_line: usize) -> Self {
        Self {
            x,
            y,
            src_line: Some(src_line),
        }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.y)
    }
}

/// One continuous pen-down stroke: the pen touches down at the first point
/// and lifts after the last.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Ordered polyline points of the stroke
    pub points: Vec<Point>,
}

impl Segment {
    /// Create an empty stroke.
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Create a stroke from existing points.
    pub fn from_points(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// First point of the stroke, if any.
    pub fn first(&self) -> Option<&Point> {
        self.points.first()
    }

    /// Last point of the stroke, if any.
    pub fn last(&self) -> Option<&Point> {
        self.points.last()
    }

    /// True when the stroke holds no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Pen-down drawing length of the stroke.
    pub fn drawn_length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| w[0].distance_to(&w[1]))
            .sum()
    }
}

/// A named, independently orderable collection of strokes sharing a pen.
///
/// `id` is the stable key used to match layer contents across re-parses of
/// the same source (a stroke color or a group label); `description` is the
/// user-facing label and falls back to the id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    /// Stable identity (stroke color or group label); `None` for ungrouped geometry
    pub id: Option<String>,
    /// User-facing label
    pub description: String,
    /// Strokes in drawing order
    pub segments: Vec<Segment>,
}

impl Layer {
    /// Create an empty layer, deriving the description from the id.
    pub fn new(id: Option<String>) -> Self {
        let description = id.clone().unwrap_or_else(|| NO_NAME.to_string());
        Self {
            id,
            description,
            segments: Vec::new(),
        }
    }

    /// Total number of points across all strokes.
    pub fn point_count(&self) -> usize {
        self.segments.iter().map(|s| s.points.len()).sum()
    }
}

/// How the SVG tree walker assigns geometry to layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerResolveMode {
    /// All geometry in a single unnamed layer
    #[default]
    None,
    /// Layer id is the element's resolved stroke color
    Color,
    /// Layer id is the Inkscape layer-group label
    Inkscape,
}

impl fmt::Display for LayerResolveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Color => write!(f, "color"),
            Self::Inkscape => write!(f, "inkscape"),
        }
    }
}

impl std::str::FromStr for LayerResolveMode {
    type Err = crate::error::ImportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "color" => Ok(Self::Color),
            "inkscape" => Ok(Self::Inkscape),
            other => Err(crate::error::ImportError::UnsupportedLayerMode {
                mode: other.to_string(),
            }),
        }
    }
}
