//! Tanks - a top-down tank arena
//!
//! Core modules:
//! - `sim`: Frame-driven simulation (slot storage, spatial hash, timers, combat, AI)
//! - `catalog`: Tank/bullet/map templates loaded from JSON
//! - `camera`: View transform and culling frame
//! - `scene`: Draw list handed to whatever renders the arena
//! - `settings`: Persisted player preferences
//! - `highscores`: Leaderboard of finished runs

pub mod camera;
pub mod catalog;
pub mod color;
pub mod highscores;
pub mod scene;
pub mod settings;
pub mod sim;

pub use catalog::{BulletTemplate, Catalog, MapTemplate, TankTemplate};
pub use color::Rgba;
pub use highscores::HighScores;
pub use settings::Settings;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    use glam::Vec2;

    /// Largest simulation step; longer frames are clamped to this
    pub const MAX_DELTA: f32 = 0.1;

    /// Group the player always belongs to, enemies use 1..=team_count
    pub const PLAYER_GROUP: u32 = 0;
    /// Where the player's tank appears on map load
    pub const PLAYER_START: Vec2 = Vec2::ZERO;

    /// Duration of the red flash after a hit
    pub const HIT_FLASH: f32 = 0.2;
    /// How long the health ring stays visible after a hit or hover
    pub const BAR_REVEAL: f32 = 2.0;
    /// Opacity the health ring fades out from
    pub const BAR_START_ALPHA: f32 = 0.5;
    /// Health ring radius relative to the tank size
    pub const BAR_RADIUS_FACTOR: f32 = 1.5;

    /// Extra zoom added to the configured scroll sensitivity
    pub const SCROLL_BASE: f32 = 0.2;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    angle %= TAU;
    if angle >= PI {
        angle -= TAU;
    } else if angle < -PI {
        angle += TAU;
    }
    angle
}

/// Shortest signed rotation that takes `from` onto `to`
#[inline]
pub fn angle_to(from: f32, to: f32) -> f32 {
    normalize_angle(to - from)
}

/// Rotate `current` toward `target` by at most `max_step` radians
///
/// Never overshoots: when the remaining difference is smaller than the step
/// the result is exactly `target` (normalized).
pub fn turn_toward(current: f32, target: f32, max_step: f32) -> f32 {
    let delta = angle_to(current, target);
    let step = delta.clamp(-max_step, max_step);
    normalize_angle(current + step)
}

/// Vector of length `len` pointing along `angle`
#[inline]
pub fn polar(angle: f32, len: f32) -> Vec2 {
    Vec2::from_angle(angle) * len
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_normalize_angle() {
        // 3π sits on the ±π seam, so compare around the circle
        let seam = normalize_angle(3.0 * PI);
        assert!((-PI..PI).contains(&seam));
        assert!(angle_to(seam, PI).abs() < 1e-5);
        assert!((normalize_angle(-FRAC_PI_2) + FRAC_PI_2).abs() < 1e-6);
        assert!((normalize_angle(5.0 * PI / 2.0) - FRAC_PI_2).abs() < 1e-5);
    }

    #[test]
    fn test_angle_to_takes_short_way() {
        // From just below +π to just above -π is a small positive step
        let d = angle_to(PI - 0.1, -PI + 0.1);
        assert!((d - 0.2).abs() < 1e-5);
        assert!((angle_to(0.0, FRAC_PI_2) - FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn test_turn_toward_is_bounded() {
        let r = turn_toward(0.0, FRAC_PI_2, 0.1);
        assert!((r - 0.1).abs() < 1e-6);

        // Close enough: snap onto the target instead of overshooting
        let r = turn_toward(0.0, 0.05, 0.1);
        assert!((r - 0.05).abs() < 1e-6);

        let r = turn_toward(0.0, -FRAC_PI_2, 0.1);
        assert!((r + 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_polar() {
        let v = polar(FRAC_PI_2, 2.0);
        assert!(v.x.abs() < 1e-5);
        assert!((v.y - 2.0).abs() < 1e-5);
    }
}
