//! # Eggplot Protocol
//!
//! The plotter's instruction text format and live print state.
//!
//! - [`codec`]: encodes layer geometry into instruction text and decodes it
//!   back, recovering layer boundaries and per-point source line numbers.
//! - [`progress`]: maps a live instruction-line index onto a travel-distance
//!   percentage within decoded geometry.
//! - [`status`]: the print status reconciler, a shallow-merge state machine
//!   over partial status messages.

pub mod codec;
pub mod progress;
pub mod status;

pub use codec::{decode, encode};
pub use progress::ProgressTracker;
pub use status::{PrintState, PrintStatus, PrintStatusUpdate};
