//! Frame Dispatch
//!
//! Fans pose results out to subscribers and drives the measurement session:
//! - `FrameHub`: broadcast of pose results, model activation gated by a
//!   subscriber count
//! - `MeasurementDispatcher`: resolves every active measurement per frame and
//!   applies the samples to the session
//! - peak snapshot JPEG encoding

mod dispatcher;
mod hub;
mod snapshot;

pub use dispatcher::{FrameReport, MeasurementDispatcher, SharedSession};
pub use hub::{ExternalPoseModel, FrameHub, ModelState, PoseModel, Subscription};
pub use snapshot::encode_jpeg;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Dispatch error types
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Pose model warm-up failed: {0}")]
    WarmUp(String),

    #[error("Snapshot encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

/// Dispatch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Pose result broadcast capacity; slower consumers skip ahead
    pub channel_capacity: usize,

    /// JPEG quality for peak snapshots (1-100)
    pub snapshot_quality: u8,

    /// Encode snapshots at new peaks when the frame carries an image
    pub capture_snapshots: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 64,
            snapshot_quality: 80,
            capture_snapshots: true,
        }
    }
}
