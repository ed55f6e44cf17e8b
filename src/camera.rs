//! Camera following the player's tank
//!
//! Screen coordinates here are relative to the viewport center with the same
//! axis orientation as the world; flipping for a particular backend is the
//! renderer's business.

use glam::{Affine2, Vec2};

use crate::consts::SCROLL_BASE;
use crate::settings::Settings;
use crate::sim::Aabb;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// World point at the viewport center
    pub pos: Vec2,
    pub zoom: f32,
    zoom_min: f32,
    zoom_max: f32,
    sensitivity: f32,
    margin: f32,
}

impl Camera {
    pub fn new(zoom_min: f32, zoom_max: f32, sensitivity: f32, margin: f32) -> Self {
        Self {
            pos: Vec2::ZERO,
            zoom: 1.0_f32.clamp(zoom_min, zoom_max),
            zoom_min,
            zoom_max,
            sensitivity,
            margin,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let (min, max) = settings.zoom_range();
        Self::new(min, max, settings.scroll_sensitivity, settings.frame_margin)
    }

    /// Apply scroll wheel movement to the zoom
    pub fn scroll(&mut self, amount: f32) {
        if amount == 0.0 {
            return;
        }
        let factor = 1.0 + amount * (self.sensitivity + SCROLL_BASE);
        // A hard scroll must not flip or collapse the view
        if factor > 0.0 {
            self.zoom = (self.zoom * factor).clamp(self.zoom_min, self.zoom_max);
        }
    }

    pub fn follow(&mut self, target: Vec2) {
        self.pos = target;
    }

    /// World to screen transform
    pub fn view(&self) -> Affine2 {
        Affine2::from_scale(Vec2::splat(self.zoom)) * Affine2::from_translation(-self.pos)
    }

    /// Screen point (relative to the viewport center) to world point
    pub fn unproject(&self, cursor: Vec2) -> Vec2 {
        self.pos + cursor / self.zoom
    }

    /// World rectangle visible through a viewport, padded by the margin
    pub fn frame(&self, viewport: Vec2) -> Aabb {
        let half = viewport / (2.0 * self.zoom);
        Aabb::new(self.pos - half, self.pos + half).expanded(Vec2::splat(self.margin))
    }
}
