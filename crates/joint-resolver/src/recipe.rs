//! Landmark recipes: which points feed which angle kernel, and how the
//! signed kernel angle is read out as a non-negative ROM value.

use pose_landmarks::schema::*;

use crate::joint::{JointType, MovementDirection, Side};

/// Landmark reference: a single point or the midpoint of two
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointRef {
    Landmark(usize),
    Midpoint(usize, usize),
}

impl PointRef {
    pub fn indices(&self) -> impl Iterator<Item = usize> {
        let (a, b) = match *self {
            PointRef::Landmark(idx) => (idx, None),
            PointRef::Midpoint(a, b) => (a, Some(b)),
        };
        std::iter::once(a).chain(b)
    }
}

/// Reference direction a moving segment is measured against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference {
    /// Vector from the first point to the second
    Segment(PointRef, PointRef),
    /// Straight up in image space
    VerticalUp,
}

/// Anatomical plane for 3D cervical decomposition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyPlane {
    Sagittal,
    Coronal,
    Transverse,
}

/// Angle kernel evaluated on a frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Kernel {
    /// Signed angle at `vertex`, from ray vertex→a to ray vertex→c
    Vertex {
        a: PointRef,
        vertex: PointRef,
        c: PointRef,
    },
    /// Signed angle from the reference direction to segment from→to.
    /// With `facing` set, the sign flips when the nose sits left of the ear.
    Segments {
        reference: Reference,
        from: PointRef,
        to: PointRef,
        facing: Option<(usize, usize)>,
    },
    /// Head yaw from nose offset against the ear midpoint, depth-weighted
    HeadYaw {
        nose: usize,
        left_ear: usize,
        right_ear: usize,
    },
    /// Neck or ear-line angle in a torso-anchored 3D frame
    TorsoPlane(BodyPlane),
}

impl Kernel {
    /// Every landmark index the kernel reads
    pub fn indices(&self) -> Vec<usize> {
        let mut out = Vec::with_capacity(6);
        match *self {
            Kernel::Vertex { a, vertex, c } => {
                out.extend(a.indices());
                out.extend(vertex.indices());
                out.extend(c.indices());
            }
            Kernel::Segments {
                reference,
                from,
                to,
                facing,
            } => {
                if let Reference::Segment(p, q) = reference {
                    out.extend(p.indices());
                    out.extend(q.indices());
                }
                out.extend(from.indices());
                out.extend(to.indices());
                if let Some((nose, ear)) = facing {
                    out.push(nose);
                    out.push(ear);
                }
            }
            Kernel::HeadYaw {
                nose,
                left_ear,
                right_ear,
            } => out.extend([nose, left_ear, right_ear]),
            Kernel::TorsoPlane(_) => out.extend([
                LEFT_SHOULDER,
                RIGHT_SHOULDER,
                LEFT_HIP,
                RIGHT_HIP,
                LEFT_EAR,
                RIGHT_EAR,
            ]),
        }
        out.sort_unstable();
        out.dedup();
        out
    }
}

/// How a signed kernel angle θ becomes a reported value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readout {
    /// max(0, θ)
    Positive,
    /// max(0, -θ)
    Negative,
    /// |θ|
    Magnitude,
    /// 180 - |θ|, bend away from a straight limb
    FromStraight,
    /// 180 - θ for θ > 0, else 0: bend in the positive orientation only
    BendPositive,
    /// 180 + θ for θ < 0, else 0
    BendNegative,
    /// max(0, 90 - |θ|)
    BelowPerpendicular,
    /// max(0, |θ| - 90)
    AbovePerpendicular,
}

impl Readout {
    pub fn apply(self, theta: f64) -> f64 {
        match self {
            Readout::Positive => theta.max(0.0),
            Readout::Negative => (-theta).max(0.0),
            Readout::Magnitude => theta.abs(),
            Readout::FromStraight => 180.0 - theta.abs(),
            Readout::BendPositive if theta > 0.0 => 180.0 - theta,
            Readout::BendNegative if theta < 0.0 => 180.0 + theta,
            Readout::BendPositive | Readout::BendNegative => 0.0,
            Readout::BelowPerpendicular => (90.0 - theta.abs()).max(0.0),
            Readout::AbovePerpendicular => (theta.abs() - 90.0).max(0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Recipe {
    pub kernel: Kernel,
    pub readout: Readout,
}

/// Recipes for one measurement: the image-space recipe always exists, a
/// world-space recipe only where 3D landmarks give a better estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecipeSet {
    pub image: Recipe,
    pub world: Option<Recipe>,
}

fn pick(side: Side, left: usize, right: usize) -> PointRef {
    match side {
        Side::Left => PointRef::Landmark(left),
        Side::Right => PointRef::Landmark(right),
    }
}

/// Sign that reads positive on the side's own outward motion in the image
fn outward(side: Side) -> Readout {
    match side {
        Side::Left => Readout::Positive,
        Side::Right => Readout::Negative,
    }
}

fn inward(side: Side) -> Readout {
    match side {
        Side::Left => Readout::Negative,
        Side::Right => Readout::Positive,
    }
}

/// Bend past straight, opposite to the side's flexion orientation
fn hyperextension(side: Side) -> Readout {
    match side {
        Side::Left => Readout::BendNegative,
        Side::Right => Readout::BendPositive,
    }
}

fn signed(direction_is_positive: bool) -> Readout {
    if direction_is_positive {
        Readout::Positive
    } else {
        Readout::Negative
    }
}

fn image_only(kernel: Kernel, readout: Readout) -> RecipeSet {
    RecipeSet {
        image: Recipe { kernel, readout },
        world: None,
    }
}

/// Recipe table. Returns None for pairs outside the joint's direction table
/// or limb joints without a side.
pub fn recipes_for(
    joint: JointType,
    direction: MovementDirection,
    side: Option<Side>,
) -> Option<RecipeSet> {
    use MovementDirection::*;

    if !joint.supports(direction) {
        return None;
    }

    let shoulder_mid = PointRef::Midpoint(LEFT_SHOULDER, RIGHT_SHOULDER);
    let hip_mid = PointRef::Midpoint(LEFT_HIP, RIGHT_HIP);
    let ear_mid = PointRef::Midpoint(LEFT_EAR, RIGHT_EAR);

    if joint.is_spinal() {
        let positive = matches!(
            direction,
            Flexion | RightLateralFlexion | RightRotation
        );
        return Some(match (joint, direction) {
            (JointType::Cervical, Flexion | Extension) => RecipeSet {
                image: Recipe {
                    kernel: Kernel::Segments {
                        reference: Reference::Segment(hip_mid, shoulder_mid),
                        from: shoulder_mid,
                        to: ear_mid,
                        facing: Some((NOSE, LEFT_EAR)),
                    },
                    readout: signed(positive),
                },
                world: Some(Recipe {
                    kernel: Kernel::TorsoPlane(BodyPlane::Sagittal),
                    readout: signed(positive),
                }),
            },
            (JointType::Cervical, LeftLateralFlexion | RightLateralFlexion) => RecipeSet {
                image: Recipe {
                    kernel: Kernel::Segments {
                        reference: Reference::Segment(hip_mid, shoulder_mid),
                        from: shoulder_mid,
                        to: ear_mid,
                        facing: None,
                    },
                    readout: signed(positive),
                },
                world: Some(Recipe {
                    kernel: Kernel::TorsoPlane(BodyPlane::Coronal),
                    readout: signed(positive),
                }),
            },
            (JointType::Cervical, _) => RecipeSet {
                image: Recipe {
                    kernel: Kernel::HeadYaw {
                        nose: NOSE,
                        left_ear: LEFT_EAR,
                        right_ear: RIGHT_EAR,
                    },
                    readout: signed(positive),
                },
                // ear line turns toward forward on a left turn
                world: Some(Recipe {
                    kernel: Kernel::TorsoPlane(BodyPlane::Transverse),
                    readout: signed(!positive),
                }),
            },
            (_, Flexion | Extension) => image_only(
                Kernel::Segments {
                    reference: Reference::VerticalUp,
                    from: hip_mid,
                    to: shoulder_mid,
                    facing: None,
                },
                Readout::Magnitude,
            ),
            _ => image_only(
                Kernel::Segments {
                    reference: Reference::VerticalUp,
                    from: hip_mid,
                    to: shoulder_mid,
                    facing: None,
                },
                signed(positive),
            ),
        });
    }

    let side = side?;
    let shoulder = pick(side, LEFT_SHOULDER, RIGHT_SHOULDER);
    let elbow = pick(side, LEFT_ELBOW, RIGHT_ELBOW);
    let wrist = pick(side, LEFT_WRIST, RIGHT_WRIST);
    let hip = pick(side, LEFT_HIP, RIGHT_HIP);
    let knee = pick(side, LEFT_KNEE, RIGHT_KNEE);
    let ankle = pick(side, LEFT_ANKLE, RIGHT_ANKLE);

    let set = match (joint, direction) {
        (JointType::Shoulder, Flexion | Extension) => image_only(
            Kernel::Vertex {
                a: hip,
                vertex: shoulder,
                c: elbow,
            },
            signed(direction == Flexion),
        ),
        (JointType::Shoulder, _) => image_only(
            Kernel::Vertex {
                a: hip,
                vertex: shoulder,
                c: elbow,
            },
            outward(side),
        ),
        (JointType::Elbow, Extension) => image_only(
            Kernel::Vertex {
                a: shoulder,
                vertex: elbow,
                c: wrist,
            },
            hyperextension(side),
        ),
        (JointType::Elbow, _) => image_only(
            Kernel::Vertex {
                a: shoulder,
                vertex: elbow,
                c: wrist,
            },
            Readout::FromStraight,
        ),
        (JointType::Wrist, _) => {
            let distal = match direction {
                UlnarDeviation => pick(side, LEFT_PINKY, RIGHT_PINKY),
                RadialDeviation => pick(side, LEFT_THUMB, RIGHT_THUMB),
                _ => pick(side, LEFT_INDEX, RIGHT_INDEX),
            };
            image_only(
                Kernel::Vertex {
                    a: elbow,
                    vertex: wrist,
                    c: distal,
                },
                Readout::FromStraight,
            )
        }
        (JointType::Hip, _) => {
            let thigh = Kernel::Segments {
                reference: Reference::Segment(shoulder, hip),
                from: hip,
                to: knee,
                facing: None,
            };
            let readout = match direction {
                Flexion => Readout::Positive,
                Extension => Readout::Negative,
                Abduction => outward(side),
                _ => inward(side),
            };
            image_only(thigh, readout)
        }
        (JointType::Knee, _) => image_only(
            Kernel::Vertex {
                a: hip,
                vertex: knee,
                c: ankle,
            },
            Readout::FromStraight,
        ),
        (JointType::Ankle, _) => image_only(
            Kernel::Vertex {
                a: knee,
                vertex: ankle,
                c: pick(side, LEFT_FOOT_INDEX, RIGHT_FOOT_INDEX),
            },
            if direction == Dorsiflexion {
                Readout::BelowPerpendicular
            } else {
                Readout::AbovePerpendicular
            },
        ),
        _ => return None,
    };
    Some(set)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_valid_pair_has_recipe() {
        for joint in JointType::ALL {
            for &direction in joint.directions() {
                for side in [Side::Left, Side::Right] {
                    assert!(
                        recipes_for(joint, direction, Some(side)).is_some(),
                        "{joint} {direction} {side}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_invalid_pair_has_no_recipe() {
        let knee = recipes_for(JointType::Knee, MovementDirection::Extension, Some(Side::Left));
        assert!(knee.is_none());
        assert!(recipes_for(JointType::Elbow, MovementDirection::Flexion, None).is_none());
    }

    #[test]
    fn test_midpoint_indices_included() {
        let set = recipes_for(JointType::Thoracolumbar, MovementDirection::Flexion, None).unwrap();
        assert_eq!(
            set.image.kernel.indices(),
            vec![LEFT_SHOULDER, RIGHT_SHOULDER, LEFT_HIP, RIGHT_HIP]
        );
    }

    #[test]
    fn test_readouts() {
        assert_eq!(Readout::Positive.apply(-10.0), 0.0);
        assert_eq!(Readout::Negative.apply(-10.0), 10.0);
        assert_eq!(Readout::FromStraight.apply(-150.0), 30.0);
        assert_eq!(Readout::BendPositive.apply(150.0), 30.0);
        assert_eq!(Readout::BendPositive.apply(-150.0), 0.0);
        assert_eq!(Readout::BendNegative.apply(-170.0), 10.0);
        assert_eq!(Readout::BendNegative.apply(90.0), 0.0);
        assert_eq!(Readout::BelowPerpendicular.apply(80.0), 10.0);
        assert_eq!(Readout::BelowPerpendicular.apply(100.0), 0.0);
        assert_eq!(Readout::AbovePerpendicular.apply(-120.0), 30.0);
    }
}
