//! Engine configuration.
//!
//! Every tunable threshold used by the interaction engine lives here so hosts
//! can adjust them from a JSON file without recompiling.

use crate::error::{CanvasError, CanvasResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Minimum zoom scale.
pub const MIN_SCALE: f64 = 0.1;
/// Maximum zoom scale.
pub const MAX_SCALE: f64 = 5.0;

/// Tunables for snapping, pen editing, zoom and placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Whether drag snapping starts enabled.
    pub snapping_enabled: bool,
    /// Snap tolerance in screen pixels.
    pub snap_tolerance_px: f64,
    /// Distance to the first pen anchor (screen pixels) that closes a path.
    pub close_threshold_px: f64,
    pub min_scale: f64,
    pub max_scale: f64,
    /// Scale change per wheel delta unit when zooming with ctrl held.
    pub wheel_zoom_sensitivity: f64,
    /// Factor applied by the zoom-in command.
    pub zoom_in_factor: f64,
    /// Factor applied by the zoom-out command.
    pub zoom_out_factor: f64,
    /// Smallest width/height a resize may produce (world units).
    pub min_node_size: f64,
    /// Smallest font size produced by corner-scaling a text node.
    pub min_font_size: f64,
    /// Handle length for direction-aware smooth anchors (normalized units).
    pub smooth_handle_length: f64,
    /// Handle offset used when toggling an anchor to smooth.
    pub toggle_handle_offset: f64,
    /// Padding kept around existing nodes when placing new content.
    pub placement_padding: f64,
    /// Spacing between items of a placed batch.
    pub pending_spacing: f64,
    /// Number of radii probed by the placement search.
    pub placement_max_iterations: usize,
    pub placement_min_step: f64,
    pub placement_max_step: f64,
    /// Longest side of an uploaded image after fitting.
    pub max_upload_dimension: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            snapping_enabled: false,
            snap_tolerance_px: 8.0,
            close_threshold_px: 10.0,
            min_scale: MIN_SCALE,
            max_scale: MAX_SCALE,
            wheel_zoom_sensitivity: 0.001,
            zoom_in_factor: 1.2,
            zoom_out_factor: 0.8,
            min_node_size: 10.0,
            min_font_size: 8.0,
            smooth_handle_length: 0.2,
            toggle_handle_offset: 0.1,
            placement_padding: 16.0,
            pending_spacing: 16.0,
            placement_max_iterations: 30,
            placement_min_step: 32.0,
            placement_max_step: 120.0,
            max_upload_dimension: 320.0,
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> CanvasResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    pub fn load(path: impl AsRef<Path>) -> CanvasResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded engine config from {}", path.display());
        Ok(config)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> CanvasResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> CanvasResult<()> {
        let positive = [
            ("snap_tolerance_px", self.snap_tolerance_px),
            ("close_threshold_px", self.close_threshold_px),
            ("min_scale", self.min_scale),
            ("wheel_zoom_sensitivity", self.wheel_zoom_sensitivity),
            ("zoom_in_factor", self.zoom_in_factor),
            ("zoom_out_factor", self.zoom_out_factor),
            ("min_node_size", self.min_node_size),
            ("placement_min_step", self.placement_min_step),
            ("max_upload_dimension", self.max_upload_dimension),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(CanvasError::InvalidConfig(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        if !self.max_scale.is_finite() || self.max_scale < self.min_scale {
            return Err(CanvasError::InvalidConfig(format!(
                "max_scale ({}) must not be below min_scale ({})",
                self.max_scale, self.min_scale
            )));
        }
        if self.placement_max_step < self.placement_min_step {
            return Err(CanvasError::InvalidConfig(
                "placement_max_step must not be below placement_min_step".to_string(),
            ));
        }
        Ok(())
    }

    /// Snap tolerance converted to world units at the given scale.
    pub fn snap_tolerance(&self, scale: f64) -> f64 {
        self.snap_tolerance_px / scale
    }

    /// Path-closing distance converted to world units at the given scale.
    pub fn close_threshold(&self, scale: f64) -> f64 {
        self.close_threshold_px / scale
    }
}
