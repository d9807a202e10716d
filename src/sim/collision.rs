//! Axis-aligned box geometry for bodies and obstacles
//!
//! Every body in the arena is treated as a box: overlap tests drive the combat
//! engine, and push-out vectors keep walkers out of desks and walls.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box stored as center + half extents
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub center: Vec2,
    pub half: Vec2,
}

impl Aabb {
    pub fn new(center: Vec2, half: Vec2) -> Self {
        Self {
            center,
            half: half.abs(),
        }
    }

    /// Box spanning `[min, max]`
    pub fn from_min_max(min: Vec2, max: Vec2) -> Self {
        Self::new((min + max) * 0.5, (max - min) * 0.5)
    }

    #[inline]
    pub fn min(&self) -> Vec2 {
        self.center - self.half
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.center + self.half
    }

    /// Point containment (edges inclusive)
    pub fn contains(&self, p: Vec2) -> bool {
        let d = (p - self.center).abs();
        d.x <= self.half.x && d.y <= self.half.y
    }

    /// Strict overlap (touching edges do not count)
    pub fn overlaps(&self, other: &Aabb) -> bool {
        let d = (other.center - self.center).abs();
        let reach = self.half + other.half;
        d.x < reach.x && d.y < reach.y
    }

    /// Grow (or shrink with a negative margin) on every side
    pub fn inflate(&self, margin: f32) -> Self {
        Self::new(self.center, (self.half + Vec2::splat(margin)).max(Vec2::ZERO))
    }

    /// Minimum translation that moves `self` out of `other`, if they overlap
    pub fn push_out(&self, other: &Aabb) -> Option<Vec2> {
        if !self.overlaps(other) {
            return None;
        }
        let d = self.center - other.center;
        let pen = self.half + other.half - d.abs();
        // Resolve along the shallower axis
        if pen.x < pen.y {
            let sign = if d.x < 0.0 { -1.0 } else { 1.0 };
            Some(Vec2::new(pen.x * sign, 0.0))
        } else {
            let sign = if d.y < 0.0 { -1.0 } else { 1.0 };
            Some(Vec2::new(0.0, pen.y * sign))
        }
    }

    /// Clamp a box of half extents `half` centered at `center` so it stays inside `self`
    pub fn clamp_inside(&self, center: Vec2, half: Vec2) -> Vec2 {
        let lo = self.min() + half;
        let hi = self.max() - half;
        Vec2::new(
            if lo.x <= hi.x { center.x.clamp(lo.x, hi.x) } else { self.center.x },
            if lo.y <= hi.y { center.y.clamp(lo.y, hi.y) } else { self.center.y },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_point() {
        let b = Aabb::new(Vec2::new(100.0, 100.0), Vec2::new(50.0, 30.0));
        assert!(b.contains(Vec2::new(100.0, 100.0)));
        assert!(b.contains(Vec2::new(150.0, 130.0)));
        assert!(!b.contains(Vec2::new(151.0, 100.0)));
    }

    #[test]
    fn test_overlap_is_strict() {
        let a = Aabb::new(Vec2::ZERO, Vec2::splat(10.0));
        let touching = Aabb::new(Vec2::new(20.0, 0.0), Vec2::splat(10.0));
        let inside = Aabb::new(Vec2::new(15.0, 5.0), Vec2::splat(10.0));
        assert!(!a.overlaps(&touching));
        assert!(a.overlaps(&inside));
        assert!(inside.overlaps(&a));
    }

    #[test]
    fn test_push_out_takes_shallow_axis() {
        let wall = Aabb::new(Vec2::ZERO, Vec2::new(10.0, 100.0));
        let body = Aabb::new(Vec2::new(15.0, 0.0), Vec2::splat(8.0));
        let mtv = body.push_out(&wall).unwrap();
        assert!((mtv.x - 3.0).abs() < 1e-5);
        assert_eq!(mtv.y, 0.0);

        let moved = Aabb::new(body.center + mtv, body.half);
        assert!(!moved.overlaps(&wall));
    }

    #[test]
    fn test_clamp_inside() {
        let arena = Aabb::from_min_max(Vec2::ZERO, Vec2::new(800.0, 600.0));
        let p = arena.clamp_inside(Vec2::new(-50.0, 590.0), Vec2::new(10.0, 20.0));
        assert_eq!(p, Vec2::new(10.0, 580.0));
    }
}
