//! Direction table and standard range lookups

use axum::{
    extract::{Path, Query},
    Json,
};
use joint_resolver::{
    direction_choices, standard_range, DirectionChoice, JointType, MovementDirection,
    StandardRange,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    /// Measured angle to place against the reference band
    pub angle: Option<f64>,
}

/// Where a measured angle sits relative to the reference band
#[derive(Debug, Serialize)]
pub struct RangeComparison {
    pub angle: f64,
    /// None when the normal maximum is 0
    pub percent_of_max: Option<f64>,
    pub within_range: bool,
}

#[derive(Debug, Serialize)]
pub struct RangeResponse {
    pub joint: JointType,
    pub direction: MovementDirection,
    /// None for pairs outside the joint's direction table
    pub range: Option<StandardRange>,
    /// Present when an angle was supplied and the pair has a range
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<RangeComparison>,
}

#[derive(Debug, Serialize)]
pub struct DirectionsResponse {
    pub joint: JointType,
    pub directions: &'static [MovementDirection],
    /// Spinal left/right pairs consolidated
    pub choices: Vec<DirectionChoice>,
}

pub async fn get_range(
    Path((joint, direction)): Path<(JointType, MovementDirection)>,
    Query(query): Query<RangeQuery>,
) -> Json<RangeResponse> {
    let range = standard_range(joint, direction);
    let comparison = range.zip(query.angle).map(|(range, angle)| RangeComparison {
        angle,
        percent_of_max: range.percent_of_max(angle),
        within_range: range.contains(angle),
    });

    Json(RangeResponse {
        joint,
        direction,
        range,
        comparison,
    })
}

pub async fn get_directions(Path(joint): Path<JointType>) -> Json<DirectionsResponse> {
    Json(DirectionsResponse {
        joint,
        directions: joint.directions(),
        choices: direction_choices(joint),
    })
}
