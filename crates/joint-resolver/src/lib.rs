//! Joint Angle Resolver
//!
//! Maps a (joint, direction, side) configuration and a landmark frame to a
//! single non-negative angle in degrees:
//! - Per-joint direction table and side rules
//! - Landmark recipes with confidence gating
//! - 3D cervical estimates from world landmarks
//! - Standard clinical ranges

mod config;
mod joint;
mod ranges;
pub mod recipe;
mod resolver;
mod selection;

pub use config::ResolverConfig;
pub use joint::{JointType, MovementDirection, Side};
pub use ranges::{standard_range, StandardRange};
pub use resolver::JointResolver;
pub use selection::{
    derive_concrete_direction, direction_choices, DirectionChoice, MeasurementConfig,
    MeasurementSelector, SpinalMotion,
};

use thiserror::Error;

/// Resolver error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolverError {
    #[error("Direction {direction} is not valid for joint {joint}")]
    InvalidDirection {
        joint: JointType,
        direction: MovementDirection,
    },

    #[error("Joint {joint} requires a side")]
    SideRequired { joint: JointType },

    #[error("Side {side} conflicts with direction {direction}")]
    SideMismatch {
        direction: MovementDirection,
        side: Side,
    },

    #[error("Choice {choice:?} is not offered for joint {joint}")]
    UnsupportedChoice {
        joint: JointType,
        choice: DirectionChoice,
    },

    #[error("Joint {joint} has no directions")]
    NoDirections { joint: JointType },
}
