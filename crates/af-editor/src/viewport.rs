//! Pan/zoom transform between screen pixels and world coordinates.
//!
//! `screen = origin + translate + world * scale`. Panning adds the raw
//! screen delta to `translate`, so a drag moves the canvas 1:1 with the
//! pointer at any zoom. Zoom only changes in fixed steps.

use crate::config::EditorConfig;
use af_core::model::Point;

/// Zoom factors are rounded to this many steps per unit so repeated
/// ±0.1 steps land on exact decimal values.
const SCALE_QUANTUM: f64 = 1e6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Horizontal translation in screen pixels.
    pub x: f64,
    /// Vertical translation in screen pixels.
    pub y: f64,
    pub scale: f64,
    /// Top-left of the canvas element in screen space.
    pub origin: Point,
    min_scale: f64,
    max_scale: f64,
    step: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}

impl Viewport {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale: 1.0,
            origin: Point::default(),
            min_scale: config.min_scale,
            max_scale: config.max_scale,
            step: config.zoom_step,
        }
    }

    /// Move the canvas element (e.g. after a page scroll or resize).
    pub fn set_origin(&mut self, origin: Point) {
        self.origin = origin;
    }

    pub fn to_world(&self, screen_x: f64, screen_y: f64) -> Point {
        Point::new(
            (screen_x - self.origin.x - self.x) / self.scale,
            (screen_y - self.origin.y - self.y) / self.scale,
        )
    }

    pub fn to_screen(&self, world: Point) -> (f64, f64) {
        (
            world.x * self.scale + self.x + self.origin.x,
            world.y * self.scale + self.y + self.origin.y,
        )
    }

    /// Add a screen-space pointer delta to the translation. Not scaled.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.x += dx;
        self.y += dy;
    }

    pub fn zoom_in(&mut self) {
        self.set_scale(self.scale + self.step);
    }

    pub fn zoom_out(&mut self) {
        self.set_scale(self.scale - self.step);
    }

    /// Back to `{x: 0, y: 0, scale: 1}`.
    pub fn reset(&mut self) {
        self.x = 0.0;
        self.y = 0.0;
        self.scale = 1.0;
    }

    /// Set the zoom factor, clamped to the configured range. With an
    /// inverted range the upper limit wins.
    pub fn set_scale(&mut self, scale: f64) {
        let rounded = (scale * SCALE_QUANTUM).round() / SCALE_QUANTUM;
        self.scale = rounded.max(self.min_scale).min(self.max_scale);
    }
}
