//! Posture analysis results and findings

use joint_resolver::Side;
use pose_landmarks::schema::*;
use pose_landmarks::{FrameSize, LandmarkFrame};
use rom_geometry::Point2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::PostureConfig;

/// Camera view of the subject
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PostureView {
    Front,
    Back,
    Side,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Severity {
    Mild,
    Moderate,
    Severe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FindingKind {
    HeadForward,
    RoundedShoulders,
    HeadTilt,
    UnevenShoulders,
    UnevenHips,
    MidlineShift,
}

/// Metric outside its reference threshold
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    pub kind: FindingKind,
    pub severity: Severity,
    /// Metric value that triggered the finding
    pub value: f64,
    /// Higher side for tilts, direction of shift for the midline (image side)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side: Option<Side>,
}

/// Raw metrics; only the ones the view supports are filled
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PostureMetrics {
    /// Horizontal ear-shoulder offset over their vertical distance
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head_forward: Option<f64>,
    /// Horizontal shoulder-hip offset over trunk height
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shoulder_rounded: Option<f64>,
    /// Degrees
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shoulder_angle: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hip_angle: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head_tilt: Option<f64>,
    /// Nose offset from mid-ankle over shoulder width
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head_deviation: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostureAnalysis {
    pub view: PostureView,
    pub metrics: PostureMetrics,
    pub findings: Vec<Finding>,
}

impl PostureAnalysis {
    pub fn has_findings(&self) -> bool {
        !self.findings.is_empty()
    }

    pub fn finding(&self, kind: FindingKind) -> Option<&Finding> {
        self.findings.iter().find(|f| f.kind == kind)
    }
}

/// Left/right pair slope in a front or back view
struct Tilt {
    slope: f64,
    degrees: f64,
    left_high: bool,
}

impl Tilt {
    fn between(left: Point2, right: Point2) -> Self {
        let dx = non_zero((left.x - right.x).abs());
        let slope = (left.y - right.y).abs() / dx;
        Self {
            slope,
            degrees: slope.atan().to_degrees(),
            left_high: left.y < right.y,
        }
    }
}

/// Denominator guard: a zero span counts as one pixel
fn non_zero(value: f64) -> f64 {
    if value == 0.0 {
        1.0
    } else {
        value
    }
}

pub struct PostureAnalyzer {
    config: PostureConfig,
}

impl Default for PostureAnalyzer {
    fn default() -> Self {
        Self::new(PostureConfig::default())
    }
}

impl PostureAnalyzer {
    pub fn new(config: PostureConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PostureConfig {
        &self.config
    }

    /// Metrics and findings for one averaged frame. Metrics whose landmarks
    /// are absent from the frame are left empty.
    pub fn analyze(
        &self,
        view: PostureView,
        frame: &LandmarkFrame,
        size: FrameSize,
    ) -> PostureAnalysis {
        let point = |idx: usize| frame.get(idx).map(|lm| lm.to_pixel(size));
        let mut metrics = PostureMetrics::default();
        let mut findings = Vec::new();

        match view {
            PostureView::Side => {
                if let (Some(ear), Some(shoulder)) = (point(LEFT_EAR), point(LEFT_SHOULDER)) {
                    let ratio = (ear.x - shoulder.x).abs() / non_zero((shoulder.y - ear.y).abs());
                    metrics.head_forward = Some(ratio);
                    if ratio > self.config.head_forward_ratio {
                        let severity = if ratio > self.config.head_forward_severe_ratio {
                            Severity::Severe
                        } else {
                            Severity::Moderate
                        };
                        findings.push(Finding {
                            kind: FindingKind::HeadForward,
                            severity,
                            value: ratio,
                            side: None,
                        });
                    }
                }

                if let (Some(shoulder), Some(hip)) = (point(LEFT_SHOULDER), point(LEFT_HIP)) {
                    let ratio = (shoulder.x - hip.x).abs() / non_zero((hip.y - shoulder.y).abs());
                    metrics.shoulder_rounded = Some(ratio);
                    if ratio > self.config.rounded_shoulder_ratio {
                        findings.push(Finding {
                            kind: FindingKind::RoundedShoulders,
                            severity: Severity::Mild,
                            value: ratio,
                            side: None,
                        });
                    }
                }
            }
            PostureView::Front | PostureView::Back => {
                let pairs = [
                    (LEFT_EAR, RIGHT_EAR, FindingKind::HeadTilt),
                    (LEFT_SHOULDER, RIGHT_SHOULDER, FindingKind::UnevenShoulders),
                    (LEFT_HIP, RIGHT_HIP, FindingKind::UnevenHips),
                ];
                for (left, right, kind) in pairs {
                    let (Some(left), Some(right)) = (point(left), point(right)) else {
                        continue;
                    };
                    let tilt = Tilt::between(left, right);
                    match kind {
                        FindingKind::HeadTilt => metrics.head_tilt = Some(tilt.degrees),
                        FindingKind::UnevenShoulders => metrics.shoulder_angle = Some(tilt.degrees),
                        _ => metrics.hip_angle = Some(tilt.degrees),
                    }
                    if let Some(finding) = self.tilt_finding(kind, &tilt) {
                        findings.push(finding);
                    }
                }

                if let (Some(nose), Some(l_ankle), Some(r_ankle), Some(l_sh), Some(r_sh)) = (
                    point(NOSE),
                    point(LEFT_ANKLE),
                    point(RIGHT_ANKLE),
                    point(LEFT_SHOULDER),
                    point(RIGHT_SHOULDER),
                ) {
                    let mid_ankle_x = (l_ankle.x + r_ankle.x) / 2.0;
                    let deviation = nose.x - mid_ankle_x;
                    let ratio = deviation.abs() / non_zero((l_sh.x - r_sh.x).abs());
                    metrics.head_deviation = Some(ratio);
                    if ratio > self.config.midline_ratio {
                        findings.push(Finding {
                            kind: FindingKind::MidlineShift,
                            severity: Severity::Moderate,
                            value: ratio,
                            side: Some(if deviation < 0.0 { Side::Left } else { Side::Right }),
                        });
                    }
                }
            }
        }

        debug!("Posture ({:?}): {} findings", view, findings.len());
        PostureAnalysis {
            view,
            metrics,
            findings,
        }
    }

    fn tilt_finding(&self, kind: FindingKind, tilt: &Tilt) -> Option<Finding> {
        if tilt.slope <= self.config.slope_mild {
            return None;
        }
        let severity = if tilt.slope > self.config.slope_moderate {
            Severity::Moderate
        } else {
            Severity::Mild
        };
        Some(Finding {
            kind,
            severity,
            value: tilt.degrees,
            side: Some(if tilt.left_high { Side::Left } else { Side::Right }),
        })
    }

    /// Whether the subject is fully visible and framed for a posture capture
    pub fn is_in_capture_position(&self, frame: &LandmarkFrame) -> bool {
        if !frame.is_complete() {
            return false;
        }
        let key_points = [
            NOSE,
            LEFT_SHOULDER,
            RIGHT_SHOULDER,
            LEFT_HIP,
            RIGHT_HIP,
            LEFT_ANKLE,
            RIGHT_ANKLE,
        ];
        let visible = key_points.iter().all(|&idx| {
            frame
                .get(idx)
                .map_or(false, |lm| lm.visibility > self.config.capture_visibility)
        });
        if !visible {
            return false;
        }

        let (Some(nose), Some(left_ankle), Some(left_shoulder), Some(right_shoulder)) = (
            frame.get(NOSE),
            frame.get(LEFT_ANKLE),
            frame.get(LEFT_SHOULDER),
            frame.get(RIGHT_SHOULDER),
        ) else {
            return false;
        };

        let b = &self.config.capture_box;
        let in_x = nose.x > b.x_min
            && nose.x < b.x_max
            && left_shoulder.x > b.x_min
            && right_shoulder.x < b.x_max;
        let in_y = nose.y > b.y_min
            && nose.y < b.head_y_max
            && left_ankle.y > b.feet_y_min
            && left_ankle.y < b.y_max;
        in_x && in_y
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pose_landmarks::Landmark;

    const SIZE: FrameSize = FrameSize::new(1000, 1000);

    fn frame(points: &[(usize, f64, f64)]) -> LandmarkFrame {
        let mut frame = LandmarkFrame::filled(Landmark::visible(0.5, 0.5));
        for &(idx, x, y) in points {
            frame.set(idx, Landmark::visible(x, y));
        }
        frame
    }

    fn standing() -> LandmarkFrame {
        frame(&[
            (NOSE, 0.5, 0.2),
            (LEFT_EAR, 0.46, 0.2),
            (RIGHT_EAR, 0.54, 0.2),
            (LEFT_SHOULDER, 0.4, 0.3),
            (RIGHT_SHOULDER, 0.6, 0.3),
            (LEFT_HIP, 0.45, 0.55),
            (RIGHT_HIP, 0.55, 0.55),
            (LEFT_ANKLE, 0.45, 0.85),
            (RIGHT_ANKLE, 0.55, 0.85),
        ])
    }

    #[test]
    fn test_side_view_head_forward_severe() {
        let frame = frame(&[(LEFT_EAR, 0.6, 0.2), (LEFT_SHOULDER, 0.5, 0.4), (LEFT_HIP, 0.5, 0.7)]);
        let analysis = PostureAnalyzer::default().analyze(PostureView::Side, &frame, SIZE);

        assert!((analysis.metrics.head_forward.unwrap() - 0.5).abs() < 1e-9);
        assert_eq!(analysis.metrics.shoulder_rounded, Some(0.0));
        let finding = analysis.finding(FindingKind::HeadForward).unwrap();
        assert_eq!(finding.severity, Severity::Severe);
        assert!(analysis.finding(FindingKind::RoundedShoulders).is_none());
        assert!(analysis.metrics.shoulder_angle.is_none());
    }

    #[test]
    fn test_side_view_rounded_shoulders() {
        let frame = frame(&[
            (LEFT_EAR, 0.58, 0.2),
            (LEFT_SHOULDER, 0.56, 0.4),
            (LEFT_HIP, 0.5, 0.7),
        ]);
        let analysis = PostureAnalyzer::default().analyze(PostureView::Side, &frame, SIZE);
        assert!(analysis.finding(FindingKind::HeadForward).is_none());
        assert_eq!(
            analysis.finding(FindingKind::RoundedShoulders).unwrap().severity,
            Severity::Mild
        );
    }

    #[test]
    fn test_front_view_level_has_no_findings() {
        let analysis = PostureAnalyzer::default().analyze(PostureView::Front, &standing(), SIZE);
        assert!(!analysis.has_findings(), "{:?}", analysis.findings);
        assert_eq!(analysis.metrics.shoulder_angle, Some(0.0));
        assert_eq!(analysis.metrics.head_deviation, Some(0.0));
    }

    #[test]
    fn test_front_view_tilts() {
        let mut frame = standing();
        frame.set(LEFT_SHOULDER, Landmark::visible(0.4, 0.30));
        frame.set(RIGHT_SHOULDER, Landmark::visible(0.6, 0.32));
        frame.set(LEFT_HIP, Landmark::visible(0.45, 0.555));
        frame.set(RIGHT_HIP, Landmark::visible(0.55, 0.55));
        let analysis = PostureAnalyzer::default().analyze(PostureView::Back, &frame, SIZE);

        let shoulders = analysis.finding(FindingKind::UnevenShoulders).unwrap();
        assert_eq!(shoulders.severity, Severity::Moderate);
        assert_eq!(shoulders.side, Some(Side::Left));

        let hips = analysis.finding(FindingKind::UnevenHips).unwrap();
        assert_eq!(hips.severity, Severity::Mild);
        assert_eq!(hips.side, Some(Side::Right));

        let expected = (0.1f64).atan().to_degrees();
        assert!((analysis.metrics.shoulder_angle.unwrap() - expected).abs() < 1e-6);
    }

    #[test]
    fn test_midline_shift() {
        let mut frame = standing();
        frame.set(NOSE, Landmark::visible(0.55, 0.2));
        let analysis = PostureAnalyzer::default().analyze(PostureView::Front, &frame, SIZE);
        let finding = analysis.finding(FindingKind::MidlineShift).unwrap();
        assert!((finding.value - 0.25).abs() < 1e-9);
        assert_eq!(finding.side, Some(Side::Right));
    }

    #[test]
    fn test_short_frame_leaves_metrics_empty() {
        let frame = LandmarkFrame::new(vec![Landmark::visible(0.5, 0.5); 5]);
        let analysis = PostureAnalyzer::default().analyze(PostureView::Front, &frame, SIZE);
        assert_eq!(analysis.metrics, PostureMetrics::default());
        assert!(!analysis.has_findings());
    }

    #[test]
    fn test_capture_position() {
        let analyzer = PostureAnalyzer::default();
        assert!(analyzer.is_in_capture_position(&standing()));

        let mut off_center = standing();
        off_center.set(NOSE, Landmark::visible(0.8, 0.2));
        assert!(!analyzer.is_in_capture_position(&off_center));

        let mut occluded = standing();
        occluded.set(RIGHT_ANKLE, Landmark::new(0.55, 0.85, 0.0, 0.4));
        assert!(!analyzer.is_in_capture_position(&occluded));

        let short = LandmarkFrame::new(vec![Landmark::visible(0.5, 0.5); 20]);
        assert!(!analyzer.is_in_capture_position(&short));
    }

    #[test]
    fn test_analysis_serializes_kebab_case() {
        let frame = frame(&[(LEFT_EAR, 0.6, 0.2), (LEFT_SHOULDER, 0.5, 0.4), (LEFT_HIP, 0.5, 0.7)]);
        let analysis = PostureAnalyzer::default().analyze(PostureView::Side, &frame, SIZE);
        let json = serde_json::to_value(&analysis).unwrap();
        assert_eq!(json["view"], "side");
        assert_eq!(json["findings"][0]["kind"], "head-forward");
        assert_eq!(json["findings"][0]["severity"], "severe");
    }
}
