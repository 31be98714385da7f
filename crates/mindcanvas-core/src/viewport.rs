//! Viewport module for pan/zoom transforms.

use crate::config::{MAX_SCALE, MIN_SCALE};
use kurbo::{Affine, Point, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Viewport manages the view transform for the canvas.
///
/// `offset` is the screen position of the world origin, so
/// `screen = world * scale + offset`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Current zoom level.
    pub scale: f64,
    /// Screen position of the world origin.
    pub offset: Vec2,
    /// Screen size of the visible canvas area.
    pub size: Size,
    pub min_scale: f64,
    pub max_scale: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: Vec2::ZERO,
            size: Size::ZERO,
            min_scale: MIN_SCALE,
            max_scale: MAX_SCALE,
        }
    }
}

impl Viewport {
    /// Create a viewport of the given screen size with the world origin centered.
    pub fn new(size: Size) -> Self {
        Self {
            offset: Vec2::new(size.width / 2.0, size.height / 2.0),
            size,
            ..Self::default()
        }
    }

    /// Override the scale bounds. The current scale is clamped into them.
    pub fn with_scale_bounds(mut self, min_scale: f64, max_scale: f64) -> Self {
        self.min_scale = min_scale;
        self.max_scale = max_scale;
        self.scale = self.scale.clamp(min_scale, max_scale);
        self
    }

    /// Affine transform from world to screen coordinates, for renderers.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.scale)
    }

    /// Convert a screen point to world coordinates.
    pub fn screen_to_world(&self, screen: Point) -> Point {
        Point::new(
            (screen.x - self.offset.x) / self.scale,
            (screen.y - self.offset.y) / self.scale,
        )
    }

    /// Convert a world point to screen coordinates.
    pub fn world_to_screen(&self, world: Point) -> Point {
        Point::new(
            world.x * self.scale + self.offset.x,
            world.y * self.scale + self.offset.y,
        )
    }

    /// Pan by a delta in screen coordinates.
    pub fn pan(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    /// Set the scale, clamped to the allowed range. Out-of-range requests are
    /// clamped rather than rejected.
    pub fn set_scale(&mut self, scale: f64) {
        self.scale = scale.clamp(self.min_scale, self.max_scale);
    }

    /// Multiply the scale by `factor` without moving the offset.
    pub fn zoom_by(&mut self, factor: f64) {
        self.set_scale(self.scale * factor);
    }

    /// Zoom, keeping the given screen point fixed over the same world point.
    pub fn zoom_at(&mut self, screen_point: Point, factor: f64) {
        let new_scale = (self.scale * factor).clamp(self.min_scale, self.max_scale);
        if (new_scale - self.scale).abs() < f64::EPSILON {
            return;
        }

        let world = self.screen_to_world(screen_point);
        self.scale = new_scale;
        self.offset = Vec2::new(
            screen_point.x - world.x * new_scale,
            screen_point.y - world.y * new_scale,
        );
    }

    /// World-space point under the center of the visible area.
    pub fn visual_center(&self) -> Point {
        self.screen_to_world(Point::new(self.size.width / 2.0, self.size.height / 2.0))
    }

    /// Resize the visible area. The offset is left unchanged.
    pub fn resize(&mut self, size: Size) {
        self.size = size;
    }
}
