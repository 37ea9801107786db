//! 3D vector operations for world-landmark geometry

use serde::{Deserialize, Serialize};

/// Point or free vector in 3D
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    fn scaled(self, k: f64) -> Point3 {
        Point3::new(self.x * k, self.y * k, self.z * k)
    }
}

/// Vector from `a` to `b`
pub fn subtract(a: Point3, b: Point3) -> Point3 {
    Point3::new(b.x - a.x, b.y - a.y, b.z - a.z)
}

pub fn dot(v1: Point3, v2: Point3) -> f64 {
    v1.x * v2.x + v1.y * v2.y + v1.z * v2.z
}

pub fn magnitude(v: Point3) -> f64 {
    dot(v, v).sqrt()
}

/// Unit vector along `v`; the zero vector stays zero
pub fn normalize(v: Point3) -> Point3 {
    let mag = magnitude(v);
    if mag == 0.0 {
        return Point3::default();
    }
    v.scaled(1.0 / mag)
}

pub fn cross(a: Point3, b: Point3) -> Point3 {
    Point3::new(
        a.y * b.z - a.z * b.y,
        a.z * b.x - a.x * b.z,
        a.x * b.y - a.y * b.x,
    )
}

/// Component of `v` orthogonal to the unit vector `axis`
pub fn reject(v: Point3, axis: Point3) -> Point3 {
    let along = dot(v, axis);
    Point3::new(v.x - along * axis.x, v.y - along * axis.y, v.z - along * axis.z)
}

/// Unsigned angle between two 3D vectors, in degrees [0, 180]
pub fn angle_between_3d(v1: Point3, v2: Point3) -> f64 {
    let mag1 = magnitude(v1);
    let mag2 = magnitude(v2);
    if mag1 == 0.0 || mag2 == 0.0 {
        return 0.0;
    }
    let cos_angle = (dot(v1, v2) / (mag1 * mag2)).clamp(-1.0, 1.0);
    cos_angle.acos().to_degrees()
}

pub fn midpoint_3d(p1: Point3, p2: Point3) -> Point3 {
    Point3::new(
        (p1.x + p2.x) / 2.0,
        (p1.y + p2.y) / 2.0,
        (p1.z + p2.z) / 2.0,
    )
}
