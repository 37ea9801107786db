//! Pose result ingestion

use axum::{extract::State, Json};
use metrics::counter;
use pose_landmarks::PoseResult;
use serde::Serialize;
use tracing::trace;

use crate::SharedState;

#[derive(Debug, Serialize)]
pub struct PublishResponse {
    /// Consumers the result was delivered to
    pub delivered: usize,
}

/// Push one pose result from the external model into the hub
pub async fn publish_frame(
    State(state): State<SharedState>,
    Json(result): Json<PoseResult>,
) -> Json<PublishResponse> {
    trace!("Pose result at {} ms", result.timestamp_ms);
    counter!("rom_api_frames_received_total").increment(1);
    let delivered = state.hub.publish(result);
    Json(PublishResponse { delivered })
}
