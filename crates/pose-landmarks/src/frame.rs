//! Landmark frame types

use image::RgbImage;
use rom_geometry::{Point2, Point3};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::schema::LANDMARK_COUNT;

fn default_visibility() -> f64 {
    1.0
}

/// Image-plane landmark
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    /// Horizontal position, normalized to [0, 1] of frame width
    pub x: f64,
    /// Vertical position, normalized to [0, 1] of frame height
    pub y: f64,
    /// Relative depth (model-dependent, not metric)
    #[serde(default)]
    pub z: f64,
    /// Confidence score in [0, 1]
    #[serde(default = "default_visibility")]
    pub visibility: f64,
}

impl Landmark {
    pub const fn new(x: f64, y: f64, z: f64, visibility: f64) -> Self {
        Self { x, y, z, visibility }
    }

    /// Fully visible landmark on the image plane
    pub const fn visible(x: f64, y: f64) -> Self {
        Self::new(x, y, 0.0, 1.0)
    }

    /// Pixel position for a frame of the given size
    pub fn to_pixel(&self, size: FrameSize) -> Point2 {
        Point2::new(self.x * size.width as f64, self.y * size.height as f64)
    }
}

/// Ordered landmarks of one processed video frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandmarkFrame {
    pub landmarks: Vec<Landmark>,
}

impl LandmarkFrame {
    pub fn new(landmarks: Vec<Landmark>) -> Self {
        Self { landmarks }
    }

    /// Frame of `LANDMARK_COUNT` copies of one landmark, handy as a base to edit
    pub fn filled(landmark: Landmark) -> Self {
        Self::new(vec![landmark; LANDMARK_COUNT])
    }

    pub fn get(&self, index: usize) -> Option<&Landmark> {
        self.landmarks.get(index)
    }

    pub fn len(&self) -> usize {
        self.landmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }

    /// Whether every schema index is present
    pub fn is_complete(&self) -> bool {
        self.landmarks.len() >= LANDMARK_COUNT
    }

    /// Replace the landmark at `index` (no-op when out of range)
    pub fn set(&mut self, index: usize, landmark: Landmark) {
        if let Some(slot) = self.landmarks.get_mut(index) {
            *slot = landmark;
        }
    }
}

/// World landmark in metric-like 3D coordinates (hip-centred)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldLandmark {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl WorldLandmark {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl From<WorldLandmark> for Point3 {
    fn from(lm: WorldLandmark) -> Self {
        Point3::new(lm.x, lm.y, lm.z)
    }
}

/// World-landmark variant of a frame, same index schema
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorldFrame {
    pub landmarks: Vec<WorldLandmark>,
}

impl WorldFrame {
    pub fn new(landmarks: Vec<WorldLandmark>) -> Self {
        Self { landmarks }
    }

    pub fn point(&self, index: usize) -> Option<Point3> {
        self.landmarks.get(index).copied().map(Point3::from)
    }

    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }
}

/// Source frame dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for FrameSize {
    fn default() -> Self {
        Self::new(640, 480)
    }
}

/// One result delivered by the pose model
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PoseResult {
    /// Capture timestamp (milliseconds)
    #[serde(default)]
    pub timestamp_ms: i64,
    /// Source frame dimensions
    #[serde(default)]
    pub size: FrameSize,
    /// Image-plane landmarks
    pub landmarks: LandmarkFrame,
    /// World landmarks, when the model provides them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub world_landmarks: Option<WorldFrame>,
    /// Source image used for peak snapshots
    #[serde(skip)]
    pub image: Option<Arc<RgbImage>>,
}

impl PoseResult {
    pub fn new(landmarks: LandmarkFrame, size: FrameSize) -> Self {
        Self {
            landmarks,
            size,
            ..Default::default()
        }
    }

    pub fn with_world_landmarks(mut self, world: WorldFrame) -> Self {
        self.world_landmarks = Some(world);
        self
    }

    pub fn with_image(mut self, image: Arc<RgbImage>) -> Self {
        self.image = Some(image);
        self
    }
}
