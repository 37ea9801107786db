//! Active measurement record

use joint_resolver::{JointType, MeasurementConfig, MovementDirection, Side};
use serde::Serialize;
use uuid::Uuid;

/// Display colours, assigned in order as measurements are created
pub const PALETTE: [&str; 6] = [
    "#2563eb", "#dc2626", "#16a34a", "#d97706", "#9333ea", "#db2777",
];

/// One recorded sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DataPoint {
    /// Seconds since measuring started
    pub timestamp: f64,
    /// Angle in degrees
    pub angle: f64,
}

/// Encoded image captured at a new peak
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub content_type: String,
    pub data: Vec<u8>,
}

impl Snapshot {
    pub fn jpeg(data: Vec<u8>) -> Self {
        Self {
            content_type: "image/jpeg".to_string(),
            data,
        }
    }
}

/// Live tracked quantity
///
/// `max_angle` starts at -inf and `min_angle` at +inf until a sample is
/// recorded; both serialize as `null` in that state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveMeasurement {
    pub id: Uuid,
    #[serde(flatten)]
    pub config: MeasurementConfig,
    pub current_angle: f64,
    pub max_angle: f64,
    pub min_angle: f64,
    #[serde(skip)]
    pub snapshot: Option<Snapshot>,
    pub has_snapshot: bool,
    pub data: Vec<DataPoint>,
    pub color: &'static str,
}

impl ActiveMeasurement {
    pub fn new(config: MeasurementConfig, color: &'static str) -> Self {
        Self {
            id: Uuid::new_v4(),
            config,
            current_angle: 0.0,
            max_angle: f64::NEG_INFINITY,
            min_angle: f64::INFINITY,
            snapshot: None,
            has_snapshot: false,
            data: Vec::new(),
            color,
        }
    }

    pub fn joint(&self) -> JointType {
        self.config.joint()
    }

    pub fn direction(&self) -> MovementDirection {
        self.config.direction()
    }

    pub fn side(&self) -> Option<Side> {
        self.config.side()
    }

    /// Peak angle, None before the first recorded sample
    pub fn max(&self) -> Option<f64> {
        self.max_angle.is_finite().then_some(self.max_angle)
    }

    pub fn min(&self) -> Option<f64> {
        self.min_angle.is_finite().then_some(self.min_angle)
    }

    pub fn set_snapshot(&mut self, snapshot: Option<Snapshot>) {
        self.has_snapshot = snapshot.is_some();
        self.snapshot = snapshot;
    }

    /// Drop series, extrema, and snapshot
    pub(crate) fn clear_history(&mut self) {
        self.data.clear();
        self.max_angle = f64::NEG_INFINITY;
        self.min_angle = f64::INFINITY;
        self.set_snapshot(None);
    }

    /// Record a sample taken while measuring; returns true on a new maximum
    pub(crate) fn record(
        &mut self,
        timestamp: f64,
        angle: f64,
        snapshot: Option<Snapshot>,
    ) -> bool {
        self.data.push(DataPoint { timestamp, angle });
        let new_max = angle > self.max_angle;
        if new_max {
            self.max_angle = angle;
            if snapshot.is_some() {
                self.set_snapshot(snapshot);
            }
        }
        self.min_angle = self.min_angle.min(angle);
        new_max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn elbow() -> ActiveMeasurement {
        let config =
            MeasurementConfig::new(JointType::Elbow, MovementDirection::Flexion, Some(Side::Left))
                .unwrap();
        ActiveMeasurement::new(config, PALETTE[0])
    }

    #[test]
    fn test_record_tracks_extrema() {
        let mut m = elbow();
        assert_eq!(m.max(), None);
        assert!(m.record(0.0, 10.0, None));
        assert!(!m.record(0.1, 5.0, None));
        assert_eq!(m.max(), Some(10.0));
        assert_eq!(m.min(), Some(5.0));
        assert_eq!(m.data.len(), 2);
    }

    #[test]
    fn test_serialized_shape() {
        let m = elbow();
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["joint"], "elbow");
        assert_eq!(json["direction"], "flexion");
        assert_eq!(json["side"], "left");
        assert_eq!(json["maxAngle"], serde_json::Value::Null);
        assert_eq!(json["hasSnapshot"], false);
        assert!(json.get("snapshot").is_none());
    }
}
