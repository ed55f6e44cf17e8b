//! Overlap tests between the simple shapes the arena uses
//!
//! Tanks and bullets collide as circles; queries and culling use
//! axis-aligned boxes.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Box spanning from the origin to `size`
    pub fn from_size(size: Vec2) -> Self {
        Self::new(Vec2::ZERO, size)
    }

    /// Square centered on `center` reaching `half` in every direction
    pub fn square(center: Vec2, half: f32) -> Self {
        Self::new(center - Vec2::splat(half), center + Vec2::splat(half))
    }

    /// Inclusive on every edge
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }

    /// Grow by `margin` on every side
    pub fn expanded(&self, margin: Vec2) -> Self {
        Self::new(self.min - margin, self.max + margin)
    }
}

/// Circle used as a collision shape
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub center: Vec2,
    pub radius: f32,
}

impl Circle {
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Strict overlap; touching circles do not intersect
    pub fn intersects(&self, other: &Circle) -> bool {
        let reach = self.radius + other.radius;
        self.center.distance_squared(other.center) < reach * reach
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square() {
        let sq = Aabb::square(Vec2::new(10.0, 10.0), 5.0);
        assert_eq!(sq.min, Vec2::new(5.0, 5.0));
        assert_eq!(sq.max, Vec2::new(15.0, 15.0));
        assert!(sq.contains(Vec2::new(15.0, 5.0)));
        assert!(!sq.contains(Vec2::new(15.1, 5.0)));
    }

    #[test]
    fn test_aabb_intersects() {
        let a = Aabb::square(Vec2::ZERO, 10.0);
        assert!(a.intersects(&Aabb::square(Vec2::new(15.0, 0.0), 10.0)));
        assert!(!a.intersects(&Aabb::square(Vec2::new(25.0, 0.0), 4.0)));
    }

    #[test]
    fn test_circle_intersects() {
        let a = Circle::new(Vec2::ZERO, 20.0);
        assert!(a.intersects(&Circle::new(Vec2::new(24.0, 0.0), 5.0)));
        assert!(!a.intersects(&Circle::new(Vec2::new(25.0, 0.0), 5.0)));
    }

    #[test]
    fn test_expanded() {
        let a = Aabb::from_size(Vec2::new(100.0, 50.0)).expanded(Vec2::splat(10.0));
        assert_eq!(a.min, Vec2::splat(-10.0));
        assert_eq!(a.max, Vec2::new(110.0, 60.0));
    }
}
