//! 2D geometry for the side-on submarine cross-section.
//!
//! Positions are in metres with `x` running along the hull and `y` pointing
//! up. Character positions are feet positions (bottom centre of the collider).

use serde::{Deserialize, Serialize};

/// 2D vector / point.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_squared(&self, other: &Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn distance(&self, other: &Self) -> f32 {
        self.distance_squared(other).sqrt()
    }

    pub fn length_squared(&self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    pub fn length(&self) -> f32 {
        self.length_squared().sqrt()
    }

    pub fn dot(&self, other: &Self) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// Unit vector in the same direction, or zero for a zero vector.
    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len > f32::EPSILON {
            Self {
                x: self.x / len,
                y: self.y / len,
            }
        } else {
            Self::ZERO
        }
    }

    /// Scale down to `max` if longer than it.
    pub fn clamp_length(self, max: f32) -> Self {
        let len = self.length();
        if len > max && len > f32::EPSILON {
            self * (max / len)
        } else {
            self
        }
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl std::ops::AddAssign for Vec2 {
    fn add_assign(&mut self, other: Self) {
        self.x += other.x;
        self.y += other.y;
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

impl std::ops::Mul<f32> for Vec2 {
    type Output = Self;
    fn mul(self, scalar: f32) -> Self {
        Self {
            x: self.x * scalar,
            y: self.y * scalar,
        }
    }
}

impl std::ops::Neg for Vec2 {
    type Output = Self;
    fn neg(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
        }
    }
}

/// Linear interpolation with `t` clamped to `[0, 1]`.
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t.clamp(0.0, 1.0)
}

/// Where `value` sits between `a` and `b`, clamped to `[0, 1]`.
pub fn inverse_lerp(a: f32, b: f32, value: f32) -> f32 {
    if (b - a).abs() < f32::EPSILON {
        return if value >= b { 1.0 } else { 0.0 };
    }
    ((value - a) / (b - a)).clamp(0.0, 1.0)
}

/// Axis-aligned rectangle: bottom-left corner plus size.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn min_x(&self) -> f32 {
        self.x
    }
    pub fn max_x(&self) -> f32 {
        self.x + self.width
    }
    pub fn min_y(&self) -> f32 {
        self.y
    }
    pub fn max_y(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Centre of the floor edge, where a walking character stands.
    pub fn floor_center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y)
    }

    /// Check if a point (with padding) is inside. Negative padding grows the rect.
    pub fn contains(&self, point: Vec2, padding: f32) -> bool {
        point.x >= self.min_x() + padding
            && point.x <= self.max_x() - padding
            && point.y >= self.min_y() + padding
            && point.y <= self.max_y() - padding
    }

    /// Clamp a point into the rect (with padding on each side).
    pub fn clamp(&self, point: Vec2, padding: f32) -> Vec2 {
        let lo_x = self.min_x() + padding;
        let hi_x = (self.max_x() - padding).max(lo_x);
        let lo_y = self.min_y() + padding;
        let hi_y = (self.max_y() - padding).max(lo_y);
        Vec2::new(point.x.clamp(lo_x, hi_x), point.y.clamp(lo_y, hi_y))
    }

    /// Shortest distance from a point to the rect (zero inside).
    pub fn distance_to(&self, point: Vec2) -> f32 {
        let dx = (self.min_x() - point.x).max(point.x - self.max_x()).max(0.0);
        let dy = (self.min_y() - point.y).max(point.y - self.max_y()).max(0.0);
        (dx * dx + dy * dy).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec2_operations() {
        let a = Vec2::new(1.0, 2.0);
        let b = Vec2::new(4.0, 6.0);
        assert_eq!(a + b, Vec2::new(5.0, 8.0));
        assert_eq!(b - a, Vec2::new(3.0, 4.0));
        assert_eq!(a * 2.0, Vec2::new(2.0, 4.0));
        assert!((a.distance(&b) - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_normalize_and_clamp() {
        let v = Vec2::new(3.0, 4.0);
        assert!((v.normalize().length() - 1.0).abs() < 1e-5);
        assert_eq!(Vec2::ZERO.normalize(), Vec2::ZERO);
        assert!((v.clamp_length(1.0).length() - 1.0).abs() < 1e-5);
        assert_eq!(v.clamp_length(10.0), v);
    }

    #[test]
    fn test_lerp_helpers() {
        assert_eq!(lerp(0.95, 0.0, 0.0), 0.95);
        assert_eq!(lerp(0.95, 0.0, 1.0), 0.0);
        assert_eq!(lerp(1.0, 10.0, 2.0), 10.0);
        assert!((inverse_lerp(0.1, 0.2, 0.15) - 0.5).abs() < 1e-4);
        assert_eq!(inverse_lerp(0.1, 0.2, 0.5), 1.0);
    }

    #[test]
    fn test_rect_contains_and_clamp() {
        let r = Rect::new(0.0, 0.0, 10.0, 3.0);
        assert!(r.contains(Vec2::new(5.0, 1.0), 0.0));
        assert!(!r.contains(Vec2::new(11.0, 1.0), 0.0));
        assert_eq!(r.clamp(Vec2::new(12.0, -1.0), 0.5), Vec2::new(9.5, 0.5));
        assert_eq!(r.floor_center(), Vec2::new(5.0, 0.0));
        assert!((r.distance_to(Vec2::new(13.0, 1.0)) - 3.0).abs() < 1e-5);
    }
}
