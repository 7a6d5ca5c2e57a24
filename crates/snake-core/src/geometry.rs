//! 2D geometry primitives shared by the world model and the simulation engine.

use glam::Vec2;

/// A point (or, equivalently, a vector) in the 2D arena. All component
/// operations are carried out in `f32`, matching the wire format and the
/// reference formulas in spec §4.B.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    fn as_vec2(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    fn from_vec2(v: Vec2) -> Self {
        Self { x: v.x, y: v.y }
    }

    pub fn dot(self, other: Point) -> f32 {
        self.as_vec2().dot(other.as_vec2())
    }

    /// 2D "cross product" (the z-component of the 3D cross product of the
    /// two vectors extended with z=0). Positive when `other` is
    /// counterclockwise from `self`.
    pub fn cross(self, other: Point) -> f32 {
        self.x * other.y - self.y * other.x
    }

    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Normalizes, returning `Point::ZERO` for a zero-length input rather
    /// than NaN — callers that need to distinguish that case check
    /// `length_squared()` themselves first (the simulation engine always
    /// does, per spec §4.D.d).
    pub fn normalize(self) -> Point {
        let len = self.length();
        if len <= f32::EPSILON {
            Point::ZERO
        } else {
            Point::new(self.x / len, self.y / len)
        }
    }

    /// Signed angle from `self` to `other`, in `(-pi, pi]`, per spec §4.B:
    /// `angle(a,b) = atan2(cross(a,b), dot(a,b))`.
    pub fn angle_to(self, other: Point) -> f32 {
        self.cross(other).atan2(self.dot(other))
    }

    /// Counterclockwise rotation by `theta` radians, standard 2D rotation
    /// matrix.
    pub fn rotate(self, theta: f32) -> Point {
        let (sin, cos) = theta.sin_cos();
        Point::new(
            self.x * cos - self.y * sin,
            self.x * sin + self.y * cos,
        )
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl std::ops::Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::from_vec2(self.as_vec2() + rhs.as_vec2())
    }
}

impl std::ops::Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::from_vec2(self.as_vec2() - rhs.as_vec2())
    }
}

impl std::ops::Mul<f32> for Point {
    type Output = Point;
    fn mul(self, rhs: f32) -> Point {
        Point::from_vec2(self.as_vec2() * rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn dot_and_cross_orthogonal() {
        let a = Point::new(1.0, 0.0);
        let b = Point::new(0.0, 1.0);
        assert_eq!(a.dot(b), 0.0);
        assert_eq!(a.cross(b), 1.0);
    }

    #[test]
    fn angle_quarter_turn() {
        let a = Point::new(1.0, 0.0);
        let b = Point::new(0.0, 1.0);
        assert!((a.angle_to(b) - PI / 2.0).abs() < 1e-5);
    }

    #[test]
    fn rotate_quarter_turn_matches_angle() {
        let a = Point::new(1.0, 0.0);
        let rotated = a.rotate(PI / 2.0);
        assert!((rotated.x - 0.0).abs() < 1e-5);
        assert!((rotated.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn normalize_zero_is_zero() {
        assert_eq!(Point::ZERO.normalize(), Point::ZERO);
    }

    #[test]
    fn normalize_unit_length() {
        let p = Point::new(3.0, 4.0).normalize();
        assert!((p.length() - 1.0).abs() < 1e-5);
    }
}
