//! # Eggplot Settings
//!
//! Plot configuration handling: the knobs the transform pipeline and the
//! importer consume, persisted in platform-specific config directories.
//! Supports JSON (the wire format the device's web UI uses) and TOML.

pub mod config;

pub use config::PlotConfig;
