//! Posture Metrics
//!
//! One-shot alignment metrics computed on a stabilized (averaged) frame:
//! head-forward and rounded-shoulder ratios from the side, shoulder/hip/head
//! tilt and midline shift from the front or back. Findings compare each
//! metric against reference thresholds only.

mod analysis;
mod config;

pub use analysis::{
    Finding, FindingKind, PostureAnalysis, PostureAnalyzer, PostureMetrics, PostureView, Severity,
};
pub use config::{CaptureBox, PostureConfig};
