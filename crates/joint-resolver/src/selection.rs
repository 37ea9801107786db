//! Measurement configurations and the joint/side/direction selector
//!
//! Spinal joints offer "rotation" and "lateral flexion" as single choices;
//! the concrete left/right direction is derived from the chosen side.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::joint::{JointType, MovementDirection, Side};
use crate::ResolverError;

/// Side-agnostic spinal movement offered in place of its left/right pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpinalMotion {
    Rotation,
    LateralFlexion,
}

impl SpinalMotion {
    pub fn with_side(self, side: Side) -> MovementDirection {
        match (self, side) {
            (SpinalMotion::Rotation, Side::Left) => MovementDirection::LeftRotation,
            (SpinalMotion::Rotation, Side::Right) => MovementDirection::RightRotation,
            (SpinalMotion::LateralFlexion, Side::Left) => MovementDirection::LeftLateralFlexion,
            (SpinalMotion::LateralFlexion, Side::Right) => MovementDirection::RightLateralFlexion,
        }
    }

    pub fn of(direction: MovementDirection) -> Option<SpinalMotion> {
        match direction {
            MovementDirection::LeftRotation | MovementDirection::RightRotation => {
                Some(SpinalMotion::Rotation)
            }
            MovementDirection::LeftLateralFlexion | MovementDirection::RightLateralFlexion => {
                Some(SpinalMotion::LateralFlexion)
            }
            _ => None,
        }
    }
}

/// Direction as picked by a user: concrete, or a consolidated spinal movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DirectionChoice {
    Concrete(MovementDirection),
    Spinal(SpinalMotion),
}

impl DirectionChoice {
    /// Choice a concrete direction is presented as for `joint`
    pub fn for_direction(joint: JointType, direction: MovementDirection) -> Self {
        match SpinalMotion::of(direction) {
            Some(motion) if joint.is_spinal() => DirectionChoice::Spinal(motion),
            _ => DirectionChoice::Concrete(direction),
        }
    }
}

/// Choices offered for a joint, spinal left/right pairs consolidated
pub fn direction_choices(joint: JointType) -> Vec<DirectionChoice> {
    let mut choices: Vec<DirectionChoice> = Vec::new();
    for &direction in joint.directions() {
        let choice = DirectionChoice::for_direction(joint, direction);
        if !choices.contains(&choice) {
            choices.push(choice);
        }
    }
    choices
}

/// Resolve a choice to the concrete direction measured
pub fn derive_concrete_direction(
    joint: JointType,
    choice: DirectionChoice,
    side: Option<Side>,
) -> Result<MovementDirection, ResolverError> {
    let direction = match choice {
        DirectionChoice::Concrete(direction) => direction,
        DirectionChoice::Spinal(motion) => {
            if !joint.is_spinal() {
                return Err(ResolverError::UnsupportedChoice { joint, choice });
            }
            let side = side.ok_or(ResolverError::SideRequired { joint })?;
            motion.with_side(side)
        }
    };

    if !joint.supports(direction) {
        return Err(ResolverError::InvalidDirection { joint, direction });
    }
    Ok(direction)
}

/// Validated (joint, direction, side) triple
///
/// Limb joints always carry a side. Spinal flexion/extension never does, and
/// spinal left/right directions carry the side named by the direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct MeasurementConfig {
    joint: JointType,
    direction: MovementDirection,
    side: Option<Side>,
}

impl MeasurementConfig {
    pub fn new(
        joint: JointType,
        direction: MovementDirection,
        side: Option<Side>,
    ) -> Result<Self, ResolverError> {
        if !joint.supports(direction) {
            return Err(ResolverError::InvalidDirection { joint, direction });
        }

        let side = if joint.is_spinal() {
            match direction.implied_side() {
                None => None,
                Some(implied) => match side {
                    Some(given) if given != implied => {
                        return Err(ResolverError::SideMismatch {
                            direction,
                            side: given,
                        })
                    }
                    _ => Some(implied),
                },
            }
        } else {
            Some(side.ok_or(ResolverError::SideRequired { joint })?)
        };

        Ok(Self {
            joint,
            direction,
            side,
        })
    }

    pub fn joint(&self) -> JointType {
        self.joint
    }

    pub fn direction(&self) -> MovementDirection {
        self.direction
    }

    pub fn side(&self) -> Option<Side> {
        self.side
    }
}

impl Default for MeasurementConfig {
    /// Cervical flexion, the session's initial measurement
    fn default() -> Self {
        Self {
            joint: JointType::Cervical,
            direction: MovementDirection::Flexion,
            side: None,
        }
    }
}

#[derive(Deserialize)]
struct RawMeasurementConfig {
    joint: JointType,
    direction: MovementDirection,
    #[serde(default)]
    side: Option<Side>,
}

impl<'de> Deserialize<'de> for MeasurementConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = RawMeasurementConfig::deserialize(deserializer)?;
        MeasurementConfig::new(raw.joint, raw.direction, raw.side).map_err(serde::de::Error::custom)
    }
}

/// Tracks a user's joint, side, and direction picks and produces configurations
#[derive(Debug, Clone)]
pub struct MeasurementSelector {
    joint: JointType,
    side: Side,
    choice: DirectionChoice,
}

impl Default for MeasurementSelector {
    fn default() -> Self {
        Self {
            joint: JointType::Cervical,
            side: Side::Left,
            choice: DirectionChoice::Concrete(MovementDirection::Flexion),
        }
    }
}

impl MeasurementSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn joint(&self) -> JointType {
        self.joint
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn choice(&self) -> DirectionChoice {
        self.choice
    }

    /// Side picker is meaningless for spinal flexion/extension
    pub fn is_side_selectable(&self) -> bool {
        !(self.joint.is_spinal()
            && matches!(self.choice, DirectionChoice::Concrete(d) if d.is_midline()))
    }

    pub fn config(&self) -> Result<MeasurementConfig, ResolverError> {
        let direction = derive_concrete_direction(self.joint, self.choice, Some(self.side))?;
        MeasurementConfig::new(self.joint, direction, Some(self.side))
    }

    /// Switch joint, resetting the direction to the joint's first
    pub fn set_joint(&mut self, joint: JointType) -> Result<MeasurementConfig, ResolverError> {
        let first = joint
            .directions()
            .first()
            .copied()
            .ok_or(ResolverError::NoDirections { joint })?;
        self.joint = joint;
        self.choice = DirectionChoice::for_direction(joint, first);
        debug!("Selector joint -> {} ({})", joint, first);
        self.config()
    }

    /// Switch side; consolidated spinal choices re-derive their direction
    pub fn set_side(&mut self, side: Side) -> Result<MeasurementConfig, ResolverError> {
        self.side = side;
        self.config()
    }

    /// Switch direction; the selector is left untouched on error
    pub fn set_direction(
        &mut self,
        choice: DirectionChoice,
    ) -> Result<MeasurementConfig, ResolverError> {
        derive_concrete_direction(self.joint, choice, Some(self.side))?;
        self.choice = choice;
        self.config()
    }
}
