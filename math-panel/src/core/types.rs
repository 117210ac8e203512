//! Core value types shared by geometry, kernels and assembly
//!
//! [`Vector3`] is a small `Copy` value type returned by value from every
//! kernel, so no output parameters are needed.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};

/// 3D vector / point in the global (body) frame
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    /// X coordinate (streamwise)
    pub x: f64,
    /// Y coordinate (spanwise)
    pub y: f64,
    /// Z coordinate (vertical)
    pub z: f64,
}

impl Vector3 {
    /// Create a new vector
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// The zero vector (origin)
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Unit vector along x
    pub const fn unit_x() -> Self {
        Self::new(1.0, 0.0, 0.0)
    }

    /// Unit vector along y
    pub const fn unit_y() -> Self {
        Self::new(0.0, 1.0, 0.0)
    }

    /// Unit vector along z
    pub const fn unit_z() -> Self {
        Self::new(0.0, 0.0, 1.0)
    }

    /// Dot product
    #[inline]
    pub fn dot(&self, other: &Vector3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Cross product `self × other`
    #[inline]
    pub fn cross(&self, other: &Vector3) -> Vector3 {
        Vector3 {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    /// Squared Euclidean norm
    #[inline]
    pub fn norm_sqr(&self) -> f64 {
        self.dot(self)
    }

    /// Euclidean norm
    #[inline]
    pub fn norm(&self) -> f64 {
        self.norm_sqr().sqrt()
    }

    /// Distance to another point
    #[inline]
    pub fn distance_to(&self, other: &Vector3) -> f64 {
        (*self - *other).norm()
    }

    /// Unit vector in the same direction, `None` for a (near) zero vector
    pub fn normalized(&self) -> Option<Vector3> {
        let len = self.norm();
        if len > 1e-300 {
            Some(*self / len)
        } else {
            None
        }
    }

    /// Unit vector, or the zero vector when the length vanishes
    pub fn normalized_or_zero(&self) -> Vector3 {
        self.normalized().unwrap_or_default()
    }

    /// True if both points coincide within `tolerance` on every axis
    #[inline]
    pub fn is_same(&self, other: &Vector3, tolerance: f64) -> bool {
        (self.x - other.x).abs() < tolerance
            && (self.y - other.y).abs() < tolerance
            && (self.z - other.z).abs() < tolerance
    }

    /// True if any component is NaN or infinite
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Rotate the point about the axis through `origin` (Rodrigues formula)
    ///
    /// `angle` is in radians; `axis` need not be normalized.
    pub fn rotated_about(&self, origin: &Vector3, axis: &Vector3, angle: f64) -> Vector3 {
        let Some(k) = axis.normalized() else {
            return *self;
        };
        let v = *self - *origin;
        let (s, c) = angle.sin_cos();
        let r = v * c + k.cross(&v) * s + k * (k.dot(&v) * (1.0 - c));
        r + *origin
    }

    /// Linear blend `self·(1-t) + other·t`
    #[inline]
    pub fn lerp(&self, other: &Vector3, t: f64) -> Vector3 {
        *self * (1.0 - t) + *other * t
    }

    /// Components as an array
    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<[f64; 3]> for Vector3 {
    fn from(v: [f64; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

impl Add for Vector3 {
    type Output = Vector3;
    #[inline]
    fn add(self, rhs: Vector3) -> Vector3 {
        Vector3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vector3 {
    type Output = Vector3;
    #[inline]
    fn sub(self, rhs: Vector3) -> Vector3 {
        Vector3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vector3 {
    type Output = Vector3;
    #[inline]
    fn mul(self, rhs: f64) -> Vector3 {
        Vector3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Div<f64> for Vector3 {
    type Output = Vector3;
    #[inline]
    fn div(self, rhs: f64) -> Vector3 {
        Vector3::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl Neg for Vector3 {
    type Output = Vector3;
    #[inline]
    fn neg(self) -> Vector3 {
        Vector3::new(-self.x, -self.y, -self.z)
    }
}

impl AddAssign for Vector3 {
    #[inline]
    fn add_assign(&mut self, rhs: Vector3) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl SubAssign for Vector3 {
    #[inline]
    fn sub_assign(&mut self, rhs: Vector3) {
        self.x -= rhs.x;
        self.y -= rhs.y;
        self.z -= rhs.z;
    }
}

impl MulAssign<f64> for Vector3 {
    #[inline]
    fn mul_assign(&mut self, rhs: f64) {
        self.x *= rhs;
        self.y *= rhs;
        self.z *= rhs;
    }
}

impl std::iter::Sum for Vector3 {
    fn sum<I: Iterator<Item = Vector3>>(iter: I) -> Self {
        iter.fold(Vector3::zero(), |acc, v| acc + v)
    }
}

/// Surface a panel belongs to
///
/// Mid panels model a zero-thickness lifting surface and never carry a
/// source density. Top/Bot panels belong to a thick surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SurfaceKind {
    /// Lower surface of a thick wing
    Bot,
    /// Thin (mid-camber) surface
    Mid,
    /// Upper surface of a thick wing
    #[default]
    Top,
    /// Wing tip patch
    Side,
    /// Fuselage / closed body
    Fuse,
    /// Wake panel
    Wake,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_cross_follows_right_hand_rule() {
        let z = Vector3::unit_x().cross(&Vector3::unit_y());
        assert_eq!(z, Vector3::unit_z());
    }

    #[test]
    fn test_normalized_zero_vector() {
        assert!(Vector3::zero().normalized().is_none());
        assert_eq!(Vector3::zero().normalized_or_zero(), Vector3::zero());
    }

    #[test]
    fn test_rotation_about_offset_axis() {
        let p = Vector3::new(2.0, 1.0, 0.0);
        let origin = Vector3::new(1.0, 1.0, 0.0);
        let r = p.rotated_about(&origin, &Vector3::unit_z(), PI / 2.0);
        assert_relative_eq!(r.x, 1.0, epsilon = 1e-14);
        assert_relative_eq!(r.y, 2.0, epsilon = 1e-14);
        assert_relative_eq!(r.z, 0.0, epsilon = 1e-14);
    }

    #[test]
    fn test_is_same_tolerance() {
        let a = Vector3::new(1.0, 2.0, 3.0);
        assert!(a.is_same(&Vector3::new(1.0005, 2.0, 3.0), 1e-3));
        assert!(!a.is_same(&Vector3::new(1.002, 2.0, 3.0), 1e-3));
    }
}
