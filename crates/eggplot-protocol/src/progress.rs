//! Mapping live print progress onto geometry.

use eggplot_core::{Layer, HOME};

/// Maps the device's raw progress value (an instruction-line index) onto a
/// travel-distance percentage within the loaded geometry.
///
/// The geometry must come from [`crate::codec::decode`] so its points carry
/// source line numbers. The percentage is re-derived only when the loaded
/// geometry or the raw progress value changes; repeated queries are cached.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    layers: Vec<Layer>,
    total_travel: f64,
    cached: Option<(usize, f64)>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the loaded geometry and drops the cached percentage.
    pub fn set_layers(&mut self, layers: Vec<Layer>) {
        self.total_travel = travel_through(&layers, usize::MAX);
        self.layers = layers;
        self.cached = None;
    }

    /// Percentage (0.0 to 100.0) of total travel covered once the device has
    /// executed all instruction lines before `progress`. Empty geometry maps
    /// to 0.
    pub fn percent_at(&mut self, progress: usize) -> f64 {
        if let Some((cached_progress, percent)) = self.cached {
            if cached_progress == progress {
                return percent;
            }
        }
        let percent = if self.total_travel > 0.0 {
            travel_through(&self.layers, progress) / self.total_travel * 100.0
        } else {
            0.0
        };
        self.cached = Some((progress, percent));
        percent
    }
}

/// Accumulated travel from home up to the first point whose source line
/// reaches `progress`.
fn travel_through(layers: &[Layer], progress: usize) -> f64 {
    let mut position = HOME;
    let mut travelled = 0.0;
    for layer in layers {
        for segment in &layer.segments {
            for point in &segment.points {
                if point.src_line.is_some_and(|line| line >= progress) {
                    return travelled;
                }
                travelled += position.distance_to(point);
                position = *point;
            }
        }
    }
    travelled
}
