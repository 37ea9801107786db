//! Geometric Angle Kernel
//!
//! Stateless vector math used by the joint resolver:
//! - Vertex angles between two rays (unsigned and signed)
//! - Angles between free segments
//! - 3D vector algebra for torso-frame projections
//! - Midpoints for synthetic landmarks
//!
//! Every function is total over finite inputs. Zero-length vectors produce an
//! angle of 0 instead of NaN.

mod planar;
mod spatial;

pub use planar::{
    angle3, angle4, angle_between, midpoint, normalize_degrees, signed_angle,
    signed_angle_between, Point2,
};
pub use spatial::{
    angle_between_3d, cross, dot, magnitude, midpoint_3d, normalize, reject, subtract, Point3,
};
