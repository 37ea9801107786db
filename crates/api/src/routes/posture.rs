//! Capture-and-average posture routes

use axum::{extract::State, http::StatusCode, Json};
use pose_landmarks::{FrameSize, LandmarkFrame};
use posture_metrics::{PostureAnalysis, PostureView};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{ApiError, SharedState};

#[derive(Debug, Deserialize)]
pub struct CaptureRequest {
    pub view: PostureView,
    /// Frame size used for pixel-space metrics
    #[serde(default)]
    pub size: FrameSize,
}

#[derive(Debug, Serialize)]
pub struct CaptureResponse {
    pub frames_averaged: usize,
    /// Share of the capture window filled; 1.0 means a full averaging window
    pub buffer_fill: f64,
    pub in_capture_position: bool,
    pub landmarks: LandmarkFrame,
    pub analysis: PostureAnalysis,
}

/// Average the buffered frames and compute posture metrics on the result
pub async fn capture(
    State(state): State<SharedState>,
    Json(req): Json<CaptureRequest>,
) -> Result<Json<CaptureResponse>, ApiError> {
    let (landmarks, frames_averaged, buffer_fill) = {
        let session = state.session.read().await;
        let averaged = session
            .capture_average()
            .ok_or(ApiError::EmptyCaptureBuffer)?;
        (
            averaged,
            session.capture_buffer_len(),
            session.capture_fill_ratio(),
        )
    };

    let analysis = state.posture.analyze(req.view, &landmarks, req.size);
    info!(
        "Posture capture ({:?}) over {} frames: {} findings",
        req.view,
        frames_averaged,
        analysis.findings.len()
    );

    Ok(Json(CaptureResponse {
        frames_averaged,
        buffer_fill,
        in_capture_position: state.posture.is_in_capture_position(&landmarks),
        landmarks,
        analysis,
    }))
}

/// Start a fresh capture window
pub async fn clear_buffer(State(state): State<SharedState>) -> StatusCode {
    state.session.write().await.clear_capture_buffer();
    StatusCode::NO_CONTENT
}
