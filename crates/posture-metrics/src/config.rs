//! Posture reference thresholds

use serde::{Deserialize, Serialize};

/// Normalized region the subject must stand in before capture
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureBox {
    pub x_min: f64,
    pub x_max: f64,
    /// Nose must sit between `y_min` and `head_y_max`
    pub y_min: f64,
    pub head_y_max: f64,
    /// Left ankle must sit between `feet_y_min` and `y_max`
    pub feet_y_min: f64,
    pub y_max: f64,
}

impl Default for CaptureBox {
    fn default() -> Self {
        Self {
            x_min: 0.25,
            x_max: 0.75,
            y_min: 0.1,
            head_y_max: 0.4,
            feet_y_min: 0.6,
            y_max: 0.9,
        }
    }
}

/// Posture configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostureConfig {
    /// Ear-ahead-of-shoulder ratio flagged as head-forward
    pub head_forward_ratio: f64,
    /// Head-forward ratio graded severe
    pub head_forward_severe_ratio: f64,
    /// Shoulder-ahead-of-hip ratio flagged as rounded shoulders
    pub rounded_shoulder_ratio: f64,
    /// Left/right slope (dy/dx) flagged as mild tilt
    pub slope_mild: f64,
    /// Slope graded moderate
    pub slope_moderate: f64,
    /// Nose offset from mid-ankle, relative to shoulder width
    pub midline_ratio: f64,
    /// Minimum visibility (exclusive) of key points for capture
    pub capture_visibility: f64,
    pub capture_box: CaptureBox,
}

impl Default for PostureConfig {
    fn default() -> Self {
        Self {
            head_forward_ratio: 0.25,
            head_forward_severe_ratio: 0.45,
            rounded_shoulder_ratio: 0.15,
            slope_mild: 0.03,
            slope_moderate: 0.08,
            midline_ratio: 0.08,
            capture_visibility: 0.6,
            capture_box: CaptureBox::default(),
        }
    }
}

impl PostureConfig {
    /// Create strict config (flag smaller deviations)
    pub fn strict() -> Self {
        Self {
            head_forward_ratio: 0.18,
            rounded_shoulder_ratio: 0.1,
            slope_mild: 0.02,
            midline_ratio: 0.05,
            ..Default::default()
        }
    }

    /// Create lenient config (flag only pronounced deviations)
    pub fn lenient() -> Self {
        Self {
            head_forward_ratio: 0.35,
            rounded_shoulder_ratio: 0.22,
            slope_mild: 0.05,
            midline_ratio: 0.12,
            ..Default::default()
        }
    }
}
