//! Builder configuration.
//!
//! Values here apply when a technique leaves the corresponding field unset.

use serde::{Deserialize, Serialize};

use crate::error::LabelResult;

/// Distance scale applied when a technique does not set `distanceScale`.
pub const DEFAULT_TEXT_DISTANCE_SCALE: f32 = 0.5;

/// Default number of canonical colors kept by a color cache.
pub const DEFAULT_COLOR_CACHE_CAPACITY: usize = 1024;

/// Fallback text style values used by the style cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextStyleDefaults {
    /// Font size in pixels.
    pub size: f32,
    /// Background (halo) size in pixels.
    pub background_size: f32,
    /// Text color as RGBA (0..1).
    pub color: [f32; 4],
    /// Background (halo) color as RGBA.
    pub background_color: [f32; 4],
    pub opacity: f32,
    pub background_opacity: f32,
    /// Letter spacing as a multiple of font size.
    pub tracking: f32,
    /// Extra line spacing as a multiple of font size.
    pub leading: f32,
    /// Maximum line width in pixels before wrapping.
    pub line_width: f32,
}

impl Default for TextStyleDefaults {
    fn default() -> Self {
        Self {
            size: 14.0,
            background_size: 1.5,
            color: [0.1, 0.1, 0.1, 1.0],
            background_color: [1.0, 1.0, 1.0, 1.0],
            opacity: 1.0,
            background_opacity: 0.8,
            tracking: 0.0,
            leading: 0.0,
            line_width: 240.0,
        }
    }
}

/// Label builder configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LabelConfig {
    /// Distance scale used when the technique has none.
    pub distance_scale: f32,
    /// Maximum entries in the process-wide color cache before it is
    /// cleared. Only the first configuration to create the cache counts.
    pub color_cache_capacity: usize,
    /// Text style fallbacks.
    pub text_defaults: TextStyleDefaults,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            distance_scale: DEFAULT_TEXT_DISTANCE_SCALE,
            color_cache_capacity: DEFAULT_COLOR_CACHE_CAPACITY,
            text_defaults: TextStyleDefaults::default(),
        }
    }
}

impl LabelConfig {
    /// Parse a configuration from JSON. Missing keys keep their defaults.
    pub fn from_json_str(json: &str) -> LabelResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_distance_scale(mut self, scale: f32) -> Self {
        self.distance_scale = scale;
        self
    }
}
