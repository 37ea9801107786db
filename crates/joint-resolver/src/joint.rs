//! Joints, movement directions, and the per-joint direction table

use serde::{Deserialize, Serialize};
use std::fmt;

/// Measured joint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JointType {
    Cervical,
    Shoulder,
    Thoracolumbar,
    Elbow,
    Wrist,
    Hip,
    Knee,
    Ankle,
}

/// Movement direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MovementDirection {
    Flexion,
    Extension,
    Abduction,
    Adduction,
    InternalRotation,
    ExternalRotation,
    LeftRotation,
    RightRotation,
    LeftLateralFlexion,
    RightLateralFlexion,
    UlnarDeviation,
    RadialDeviation,
    Dorsiflexion,
    Plantarflexion,
}

/// Body side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Side {
    Left,
    Right,
}

impl JointType {
    pub const ALL: [JointType; 8] = [
        JointType::Cervical,
        JointType::Shoulder,
        JointType::Thoracolumbar,
        JointType::Elbow,
        JointType::Wrist,
        JointType::Hip,
        JointType::Knee,
        JointType::Ankle,
    ];

    /// Midline joints, measured without a body side for flexion/extension
    pub fn is_spinal(self) -> bool {
        matches!(self, JointType::Cervical | JointType::Thoracolumbar)
    }

    /// Directions this joint can be measured in, in presentation order
    pub fn directions(self) -> &'static [MovementDirection] {
        use MovementDirection::*;
        match self {
            JointType::Cervical => &[
                Flexion,
                Extension,
                LeftRotation,
                RightRotation,
                LeftLateralFlexion,
                RightLateralFlexion,
            ],
            JointType::Shoulder => &[Flexion, Extension, Abduction],
            JointType::Thoracolumbar => {
                &[Flexion, Extension, LeftLateralFlexion, RightLateralFlexion]
            }
            JointType::Elbow => &[Flexion, Extension],
            JointType::Wrist => &[Flexion, Extension, UlnarDeviation, RadialDeviation],
            JointType::Hip => &[Flexion, Extension, Abduction, Adduction],
            JointType::Knee => &[Flexion],
            JointType::Ankle => &[Dorsiflexion, Plantarflexion],
        }
    }

    pub fn supports(self, direction: MovementDirection) -> bool {
        self.directions().contains(&direction)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JointType::Cervical => "cervical",
            JointType::Shoulder => "shoulder",
            JointType::Thoracolumbar => "thoracolumbar",
            JointType::Elbow => "elbow",
            JointType::Wrist => "wrist",
            JointType::Hip => "hip",
            JointType::Knee => "knee",
            JointType::Ankle => "ankle",
        }
    }
}

impl MovementDirection {
    pub const ALL: [MovementDirection; 14] = [
        MovementDirection::Flexion,
        MovementDirection::Extension,
        MovementDirection::Abduction,
        MovementDirection::Adduction,
        MovementDirection::InternalRotation,
        MovementDirection::ExternalRotation,
        MovementDirection::LeftRotation,
        MovementDirection::RightRotation,
        MovementDirection::LeftLateralFlexion,
        MovementDirection::RightLateralFlexion,
        MovementDirection::UlnarDeviation,
        MovementDirection::RadialDeviation,
        MovementDirection::Dorsiflexion,
        MovementDirection::Plantarflexion,
    ];

    /// Side baked into a left/right spinal direction
    pub fn implied_side(self) -> Option<Side> {
        match self {
            MovementDirection::LeftRotation | MovementDirection::LeftLateralFlexion => {
                Some(Side::Left)
            }
            MovementDirection::RightRotation | MovementDirection::RightLateralFlexion => {
                Some(Side::Right)
            }
            _ => None,
        }
    }

    /// Sagittal midline movement
    pub fn is_midline(self) -> bool {
        matches!(self, MovementDirection::Flexion | MovementDirection::Extension)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MovementDirection::Flexion => "flexion",
            MovementDirection::Extension => "extension",
            MovementDirection::Abduction => "abduction",
            MovementDirection::Adduction => "adduction",
            MovementDirection::InternalRotation => "internal-rotation",
            MovementDirection::ExternalRotation => "external-rotation",
            MovementDirection::LeftRotation => "left-rotation",
            MovementDirection::RightRotation => "right-rotation",
            MovementDirection::LeftLateralFlexion => "left-lateral-flexion",
            MovementDirection::RightLateralFlexion => "right-lateral-flexion",
            MovementDirection::UlnarDeviation => "ulnar-deviation",
            MovementDirection::RadialDeviation => "radial-deviation",
            MovementDirection::Dorsiflexion => "dorsiflexion",
            MovementDirection::Plantarflexion => "plantarflexion",
        }
    }
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

impl fmt::Display for JointType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for MovementDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
