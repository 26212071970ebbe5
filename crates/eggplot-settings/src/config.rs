//! Plot configuration.

use eggplot_core::{Error, LayerResolveMode, Result};
use eggplot_transforms::PipelineOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The persisted plot configuration.
///
/// Field names serialize in camelCase because the same object is exchanged
/// with the device's configuration endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlotConfig {
    /// Horizontal scale factor
    pub h_scale: f64,
    /// Vertical scale factor
    pub v_scale: f64,
    /// Vertical offset in pen steps
    pub v_offset: f64,
    /// Drop near-collinear points
    pub simplify_segments: bool,
    /// Reorder segments to shorten pen-up travel
    pub optimize_travel: bool,
    /// Allow the optimizer to reverse segments
    pub reverse_segments: bool,
    /// Maximum deviation for a point to be dropped
    pub simplify_threshold: f64,
    /// How imported geometry is grouped into layers
    pub layer_resolve_type: LayerResolveMode,
    /// Merge segments separated by short pen-lifts
    pub merge_segments: bool,
    /// Pen-lift distance below which segments are merged
    pub min_travel_distance: f64,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            h_scale: 1.0,
            v_scale: 1.0,
            v_offset: 0.0,
            simplify_segments: true,
            optimize_travel: true,
            reverse_segments: true,
            simplify_threshold: 0.6,
            layer_resolve_type: LayerResolveMode::None,
            merge_segments: true,
            min_travel_distance: 2.0,
        }
    }
}

impl PlotConfig {
    /// Create a new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// The default on-disk location, under the platform config directory.
    pub fn default_path() -> Result<PathBuf> {
        let base = dirs::config_dir()
            .ok_or_else(|| Error::other("No config directory available on this platform"))?;
        Ok(base.join("eggplot").join("config.toml"))
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::other(format!("Failed to read config file: {}", e)))?;

        let config: Self = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content)
                .map_err(|e| Error::other(format!("Invalid JSON config: {}", e)))?
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            toml::from_str(&content)
                .map_err(|e| Error::other(format!("Invalid TOML config: {}", e)))?
        } else {
            return Err(Error::other(
                "Config file must be .json or .toml".to_string(),
            ));
        };

        config.validate()?;
        Ok(config)
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        self.validate()?;

        let content = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::to_string_pretty(self)
                .map_err(|e| Error::other(format!("Failed to serialize config: {}", e)))?
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            toml::to_string_pretty(self)
                .map_err(|e| Error::other(format!("Failed to serialize config: {}", e)))?
        } else {
            return Err(Error::other(
                "Config file must be .json or .toml".to_string(),
            ));
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::other(format!("Failed to create config directory: {}", e)))?;
        }
        std::fs::write(path, content)
            .map_err(|e| Error::other(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.h_scale == 0.0 || self.v_scale == 0.0 {
            return Err(Error::other("Scale factors must be non-zero".to_string()));
        }
        if self.simplify_threshold < 0.0 {
            return Err(Error::other(
                "Simplify threshold must be >= 0".to_string(),
            ));
        }
        if self.min_travel_distance < 0.0 {
            return Err(Error::other(
                "Minimum travel distance must be >= 0".to_string(),
            ));
        }
        Ok(())
    }

    /// The transform pipeline options this config selects.
    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            h_scale: self.h_scale,
            v_scale: self.v_scale,
            v_offset: self.v_offset,
            around_center: true,
            optimize_travel: self.optimize_travel,
            reverse_segments: self.reverse_segments,
            merge_segments: self.merge_segments,
            min_travel_distance: self.min_travel_distance,
            simplify_segments: self.simplify_segments,
            simplify_threshold: self.simplify_threshold,
        }
    }
}
