//! # Eggplot
//!
//! A toolkit for drawing SVG artwork on eggs with a two-axis egg plotter:
//! the egg rotates under one stepper while a pen arm sweeps along it.
//!
//! ## Architecture
//!
//! Eggplot is organized as a workspace with multiple crates:
//!
//! 1. **eggplot-core** - Geometry data model, working-area constants, errors
//! 2. **eggplot-import** - SVG parsing, path segmentation, curve flattening
//! 3. **eggplot-transforms** - Scaling, travel optimization, simplification
//! 4. **eggplot-protocol** - Instruction codec, progress mapping, print status
//! 5. **eggplot-settings** - Plot configuration persistence
//! 6. **eggplot-session** - Async orchestration: file store, status feed,
//!    drawing session
//! 7. **eggplot** - Main binary integrating all crates
//!
//! ## The device
//!
//! The plotter executes instruction text line by line: `T` moves, `P0`/`P1`
//! pen lifts, `S` pen changes, `Z` progress markers. The working area is
//! 3200 steps around the egg by 800 steps along it, with home at the left
//! edge, vertically centered.

pub use eggplot_core::{
    ConnectionError, Error, ImportError, Layer, LayerResolveMode, Point, Result, Segment,
    TransportError, HOME, STEPS_PER_REV, WORK_HEIGHT,
};
pub use eggplot_import::{Drawing, PathSegmenter, SvgSegmenter};
pub use eggplot_protocol::{decode, encode, PrintState, PrintStatus, ProgressTracker};
pub use eggplot_session::{CreateSession, FileStore, LocalStore};
pub use eggplot_settings::PlotConfig;
pub use eggplot_transforms::{DrawingStats, Improvements, Pipeline, PipelineOptions};

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output with pretty formatting
/// - RUST_LOG environment variable support
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .pretty();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    Ok(())
}
