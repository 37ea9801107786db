//! Image-plane (2D) angle functions

use serde::{Deserialize, Serialize};

/// Point or free vector in the image plane
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Vector from `self` to `other`
    pub fn to(self, other: Point2) -> Point2 {
        Point2::new(other.x - self.x, other.y - self.y)
    }

    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn dot(self, other: Point2) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Direction in radians, measured with `atan2(y, x)`
    pub fn heading(self) -> f64 {
        self.y.atan2(self.x)
    }
}

/// Wrap an angle in degrees into (-180, 180]
pub fn normalize_degrees(degrees: f64) -> f64 {
    let wrapped = (degrees + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 {
        180.0
    } else {
        wrapped
    }
}

/// Unsigned angle between two free vectors, in degrees [0, 180]
///
/// Returns 0 when either vector has zero length.
pub fn angle_between(v1: Point2, v2: Point2) -> f64 {
    let mag1 = v1.length();
    let mag2 = v2.length();
    if mag1 == 0.0 || mag2 == 0.0 {
        return 0.0;
    }

    // Clamp against floating point overshoot before acos
    let cos_angle = (v1.dot(v2) / (mag1 * mag2)).clamp(-1.0, 1.0);
    cos_angle.acos().to_degrees()
}

/// Signed rotation from `v1` to `v2`, in degrees (-180, 180]
pub fn signed_angle_between(v1: Point2, v2: Point2) -> f64 {
    normalize_degrees((v2.heading() - v1.heading()).to_degrees())
}

/// Unsigned angle at vertex `b` formed by rays b→a and b→c, in degrees [0, 180]
pub fn angle3(a: Point2, b: Point2, c: Point2) -> f64 {
    angle_between(b.to(a), b.to(c))
}

/// Signed angle at vertex `b`: heading of b→a minus heading of b→c, in (-180, 180]
pub fn signed_angle(a: Point2, b: Point2, c: Point2) -> f64 {
    normalize_degrees((b.to(a).heading() - b.to(c).heading()).to_degrees())
}

/// Unsigned angle between segments p1→p2 and p3→p4, in degrees [0, 180]
///
/// Used when the moving segment and the reference segment share no vertex.
pub fn angle4(p1: Point2, p2: Point2, p3: Point2, p4: Point2) -> f64 {
    angle_between(p1.to(p2), p3.to(p4))
}

/// Arithmetic mean of two points
pub fn midpoint(p1: Point2, p2: Point2) -> Point2 {
    Point2::new((p1.x + p2.x) / 2.0, (p1.y + p2.y) / 2.0)
}
