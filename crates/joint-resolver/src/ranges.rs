//! Clinical reference ranges (degrees) per joint and direction

use serde::Serialize;

use crate::joint::{JointType, MovementDirection};

/// Normal active range of motion
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StandardRange {
    pub min: f64,
    pub max: f64,
}

impl StandardRange {
    const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Share of the normal maximum reached, in percent
    pub fn percent_of_max(&self, angle: f64) -> Option<f64> {
        (self.max > 0.0).then(|| angle / self.max * 100.0)
    }

    pub fn contains(&self, angle: f64) -> bool {
        angle >= self.min && angle <= self.max
    }
}

/// Reference range for a pair, None for pairs the joint does not support
pub fn standard_range(
    joint: JointType,
    direction: MovementDirection,
) -> Option<StandardRange> {
    use MovementDirection::*;

    let (min, max) = match (joint, direction) {
        (JointType::Cervical, Flexion) => (80.0, 90.0),
        (JointType::Cervical, Extension) => (50.0, 70.0),
        (JointType::Cervical, LeftRotation | RightRotation) => (70.0, 90.0),
        (JointType::Cervical, LeftLateralFlexion | RightLateralFlexion) => (20.0, 45.0),

        (JointType::Shoulder, Flexion) => (0.0, 180.0),
        (JointType::Shoulder, Extension) => (0.0, 60.0),
        (JointType::Shoulder, Abduction) => (0.0, 180.0),

        (JointType::Thoracolumbar, Flexion) => (0.0, 80.0),
        (JointType::Thoracolumbar, Extension) => (0.0, 25.0),
        (JointType::Thoracolumbar, LeftLateralFlexion | RightLateralFlexion) => (0.0, 35.0),

        (JointType::Elbow, Flexion) => (0.0, 150.0),
        (JointType::Elbow, Extension) => (0.0, 0.0),

        (JointType::Wrist, Flexion) => (0.0, 80.0),
        (JointType::Wrist, Extension) => (0.0, 70.0),
        (JointType::Wrist, UlnarDeviation) => (0.0, 30.0),
        (JointType::Wrist, RadialDeviation) => (0.0, 20.0),

        (JointType::Hip, Flexion) => (0.0, 120.0),
        (JointType::Hip, Extension) => (0.0, 30.0),
        (JointType::Hip, Abduction) => (0.0, 45.0),
        (JointType::Hip, Adduction) => (0.0, 30.0),

        (JointType::Knee, Flexion) => (0.0, 135.0),

        (JointType::Ankle, Dorsiflexion) => (0.0, 20.0),
        (JointType::Ankle, Plantarflexion) => (0.0, 50.0),

        _ => return None,
    };
    Some(StandardRange::new(min, max))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_defined_exactly_for_valid_pairs() {
        for joint in JointType::ALL {
            for direction in MovementDirection::ALL {
                let range = standard_range(joint, direction);
                assert_eq!(range.is_some(), joint.supports(direction), "{joint} {direction}");
                if let Some(range) = range {
                    assert!(range.min <= range.max, "{joint} {direction}: {range:?}");
                }
            }
        }
    }

    #[test]
    fn test_known_ranges() {
        assert_eq!(
            standard_range(JointType::Knee, MovementDirection::Flexion),
            Some(StandardRange::new(0.0, 135.0))
        );
        assert_eq!(
            standard_range(JointType::Cervical, MovementDirection::RightRotation),
            Some(StandardRange::new(70.0, 90.0))
        );
        assert!(
            standard_range(JointType::Thoracolumbar, MovementDirection::LeftRotation).is_none()
        );
    }

    #[test]
    fn test_percent_of_max() {
        let range = StandardRange::new(0.0, 150.0);
        assert_eq!(range.percent_of_max(75.0), Some(50.0));
        assert_eq!(StandardRange::new(0.0, 0.0).percent_of_max(5.0), None);
        assert!(range.contains(150.0));
    }
}
