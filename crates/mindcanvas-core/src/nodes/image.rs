//! Image node payload.

use kurbo::{Size, Vec2};
use serde::{Deserialize, Serialize};

/// Crop viewport of an image: pixel offset of the bitmap inside the node frame
/// and a scale relative to the fitted size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Crop {
    pub x: f64,
    pub y: f64,
    /// 1.0 = original fit size.
    pub scale: f64,
}

impl Default for Crop {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale: 1.0,
        }
    }
}

impl Crop {
    /// Crop shifted by a screen-space delta.
    pub fn offset_by(self, delta: Vec2) -> Self {
        Self {
            x: self.x + delta.x,
            y: self.y + delta.y,
            ..self
        }
    }
}

/// Image source reference and optional crop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageData {
    /// Source reference (URL or data URL).
    pub src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop: Option<Crop>,
}

impl ImageData {
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            crop: None,
        }
    }
}

/// Fit decoded image dimensions so the longer side is at most `max_dim`,
/// preserving aspect ratio. Results are rounded to whole pixels.
pub fn fit_dimensions(width: f64, height: f64, max_dim: f64) -> Size {
    if width > height && width > max_dim {
        Size::new(max_dim, (height / width * max_dim).round())
    } else if height >= width && height > max_dim {
        Size::new((width / height * max_dim).round(), max_dim)
    } else {
        Size::new(width, height)
    }
}
