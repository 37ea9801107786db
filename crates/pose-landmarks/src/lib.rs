//! Pose Landmark Types
//!
//! Data delivered by the external pose-estimation model:
//! - Normalized image-plane landmarks with visibility scores
//! - Optional metric-like world landmarks
//! - The source image, for peak snapshots
//!
//! Landmark indices follow the fixed 33-point body schema in [`schema`].

pub mod average;
pub mod frame;
pub mod schema;

pub use average::average_frames;
pub use frame::{FrameSize, Landmark, LandmarkFrame, PoseResult, WorldFrame, WorldLandmark};
