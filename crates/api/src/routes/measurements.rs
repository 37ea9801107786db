//! Active measurement configuration routes

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use joint_resolver::{JointType, MovementDirection, Side};
use measurement_session::ActiveMeasurement;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ApiError, SharedState};

/// Body for add and single-measurement configuration
#[derive(Debug, Deserialize)]
pub struct MeasurementRequest {
    pub joint: JointType,
    pub direction: MovementDirection,
    #[serde(default)]
    pub side: Option<Side>,
}

#[derive(Debug, Serialize)]
pub struct MeasurementsResponse {
    pub is_measuring: bool,
    pub count: usize,
    pub data: Vec<ActiveMeasurement>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub id: Uuid,
}

pub async fn list_measurements(State(state): State<SharedState>) -> Json<MeasurementsResponse> {
    let session = state.session.read().await;
    let data = session.measurements().to_vec();
    Json(MeasurementsResponse {
        is_measuring: session.is_measuring(),
        count: data.len(),
        data,
    })
}

pub async fn add_measurement(
    State(state): State<SharedState>,
    Json(req): Json<MeasurementRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let id = state
        .session
        .write()
        .await
        .add_measurement(req.joint, req.direction, req.side)?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

pub async fn remove_measurement(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.session.write().await.remove_measurement(id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_single_measurement(
    State(state): State<SharedState>,
    Json(req): Json<MeasurementRequest>,
) -> Result<Json<CreatedResponse>, ApiError> {
    let id = state
        .session
        .write()
        .await
        .set_single_measurement(req.joint, req.direction, req.side)?;
    Ok(Json(CreatedResponse { id }))
}

/// Peak snapshot image of one measurement
pub async fn get_snapshot(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.session.read().await;
    let measurement = session
        .measurement(id)
        .ok_or_else(|| ApiError::NotFound(format!("Measurement not found: {}", id)))?;
    let snapshot = measurement
        .snapshot
        .clone()
        .ok_or_else(|| ApiError::NotFound(format!("No snapshot for measurement {}", id)))?;

    Ok(([(header::CONTENT_TYPE, snapshot.content_type)], snapshot.data))
}
