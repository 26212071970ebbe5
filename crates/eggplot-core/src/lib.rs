//! # Eggplot Core
//!
//! Core types and utilities for the Eggplot plotter toolkit.
//! Provides the layer/segment/point geometry model shared by the importer,
//! the transform pipeline, and the instruction codec, plus the unified
//! error taxonomy.

pub mod data;
pub mod error;

pub use data::{Layer, LayerResolveMode, Point, Segment, HOME, NO_NAME, STEPS_PER_REV, WORK_HEIGHT};
pub use error::{ConnectionError, Error, ImportError, Result, TransportError};
