//! Session lifecycle and saved session routes

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use measurement_session::{MeasurementSession, SavedSession, SessionState};
use serde::Serialize;
use uuid::Uuid;

use crate::{ApiError, SharedState};

#[derive(Debug, Serialize)]
pub struct SessionStatus {
    pub state: SessionState,
    pub is_measuring: bool,
    pub start_time: Option<DateTime<Utc>>,
    pub measurement_count: usize,
    pub saved_count: usize,
}

impl SessionStatus {
    fn of(session: &MeasurementSession) -> Self {
        Self {
            state: session.state(),
            is_measuring: session.is_measuring(),
            start_time: session.start_time(),
            measurement_count: session.measurements().len(),
            saved_count: session.saved().len(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SaveResponse {
    /// None when nothing had been recorded
    pub id: Option<Uuid>,
}

pub async fn get_status(State(state): State<SharedState>) -> Json<SessionStatus> {
    Json(SessionStatus::of(&*state.session.read().await))
}

pub async fn start(State(state): State<SharedState>) -> Json<SessionStatus> {
    let mut session = state.session.write().await;
    session.start();
    Json(SessionStatus::of(&session))
}

pub async fn stop(State(state): State<SharedState>) -> Json<SessionStatus> {
    let mut session = state.session.write().await;
    session.stop();
    Json(SessionStatus::of(&session))
}

pub async fn reset(State(state): State<SharedState>) -> Json<SessionStatus> {
    let mut session = state.session.write().await;
    session.reset();
    Json(SessionStatus::of(&session))
}

pub async fn save(State(state): State<SharedState>) -> Json<SaveResponse> {
    let id = state.session.write().await.save();
    Json(SaveResponse { id })
}

pub async fn list_saved(State(state): State<SharedState>) -> Json<Vec<SavedSession>> {
    Json(state.session.read().await.saved().to_vec())
}

pub async fn delete_saved(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.session.write().await.delete_saved(id)?;
    Ok(StatusCode::NO_CONTENT)
}
