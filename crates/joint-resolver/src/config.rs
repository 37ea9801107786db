//! Resolver configuration

use serde::{Deserialize, Serialize};

/// Resolver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Minimum landmark visibility (exclusive) for a landmark to take part in a measurement
    pub visibility_threshold: f64,

    /// Use 3D world landmarks for cervical measurements when the frame carries them
    pub prefer_world_landmarks: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            visibility_threshold: 0.5,
            prefer_world_landmarks: true,
        }
    }
}

impl ResolverConfig {
    /// Create strict config (only confidently tracked landmarks)
    pub fn strict() -> Self {
        Self {
            visibility_threshold: 0.75,
            ..Default::default()
        }
    }

    /// Create lenient config (accept weakly tracked landmarks)
    pub fn lenient() -> Self {
        Self {
            visibility_threshold: 0.3,
            ..Default::default()
        }
    }
}
