//! Session state machine

use chrono::{DateTime, Utc};
use frame_buffer::RingBuffer;
use joint_resolver::{JointType, MeasurementConfig, MovementDirection, Side};
use metrics::gauge;
use pose_landmarks::{average_frames, LandmarkFrame};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::measurement::{ActiveMeasurement, Snapshot, PALETTE};
use crate::SessionError;

/// Session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Frames kept for capture-and-average (about one second at 30 fps)
    pub capture_buffer_capacity: usize,

    /// Session event channel capacity
    pub event_channel_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            capture_buffer_capacity: frame_buffer::DEFAULT_CAPACITY,
            event_channel_capacity: 256,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionState {
    Idle,
    Measuring,
}

/// Change notification for observers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SessionEvent {
    MeasurementsChanged,
    StateChanged { state: SessionState },
    Sample { id: Uuid, angle: f64, recorded: bool },
    Saved { id: Uuid },
    SavedDeleted { id: Uuid },
}

/// Effect of one `update_measurement_data` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleOutcome {
    /// No angle for this frame; nothing touched
    Skipped,
    /// Live readout updated, not recording
    Live,
    /// Appended to the series
    Recorded { new_max: bool },
}

/// Deep copy of the active set at save time
#[derive(Debug, Clone, Serialize)]
pub struct SavedSession {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub measurements: Vec<ActiveMeasurement>,
}

/// Active measurements, measuring state, saved records, and capture buffer
pub struct MeasurementSession {
    active: Vec<ActiveMeasurement>,
    measuring: bool,
    start_time: Option<DateTime<Utc>>,
    saved: Vec<SavedSession>,
    capture_buffer: RingBuffer<LandmarkFrame>,
    /// Next palette slot; only rewinds on single-measurement reconfiguration
    color_cursor: usize,
    clock: Arc<dyn Clock>,
    events: broadcast::Sender<SessionEvent>,
}

impl MeasurementSession {
    /// Create a session with the default cervical flexion measurement
    pub fn new(config: SessionConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: SessionConfig, clock: Arc<dyn Clock>) -> Self {
        info!("Creating measurement session with config: {:?}", config);
        let (events, _) = broadcast::channel(config.event_channel_capacity.max(1));
        let mut session = Self {
            active: Vec::new(),
            measuring: false,
            start_time: None,
            saved: Vec::new(),
            capture_buffer: RingBuffer::new(config.capture_buffer_capacity),
            color_cursor: 0,
            clock,
            events,
        };
        let color = session.next_color();
        session
            .active
            .push(ActiveMeasurement::new(MeasurementConfig::default(), color));
        session
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn measurements(&self) -> &[ActiveMeasurement] {
        &self.active
    }

    pub fn measurement(&self, id: Uuid) -> Option<&ActiveMeasurement> {
        self.active.iter().find(|m| m.id == id)
    }

    pub fn is_measuring(&self) -> bool {
        self.measuring
    }

    pub fn state(&self) -> SessionState {
        if self.measuring {
            SessionState::Measuring
        } else {
            SessionState::Idle
        }
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    /// Saved records, most recent first
    pub fn saved(&self) -> &[SavedSession] {
        &self.saved
    }

    /// Append a measurement; identical (joint, direction, side) is rejected
    pub fn add_measurement(
        &mut self,
        joint: JointType,
        direction: MovementDirection,
        side: Option<Side>,
    ) -> Result<Uuid, SessionError> {
        let config = MeasurementConfig::new(joint, direction, side)?;
        if let Some(existing) = self.active.iter().find(|m| m.config == config) {
            debug!("Duplicate measurement {:?} ignored", config);
            return Err(SessionError::DuplicateMeasurement { id: existing.id });
        }

        let measurement = ActiveMeasurement::new(config, self.next_color());
        let id = measurement.id;
        self.active.push(measurement);
        info!("Added measurement {} ({} {})", id, joint, direction);
        self.configuration_changed();
        Ok(id)
    }

    pub fn remove_measurement(&mut self, id: Uuid) -> Result<(), SessionError> {
        let before = self.active.len();
        self.active.retain(|m| m.id != id);
        if self.active.len() == before {
            return Err(SessionError::MeasurementNotFound(id));
        }
        info!("Removed measurement {}", id);
        self.configuration_changed();
        Ok(())
    }

    /// Replace the whole active set with one fresh measurement
    pub fn set_single_measurement(
        &mut self,
        joint: JointType,
        direction: MovementDirection,
        side: Option<Side>,
    ) -> Result<Uuid, SessionError> {
        let config = MeasurementConfig::new(joint, direction, side)?;
        self.color_cursor = 0;
        let measurement = ActiveMeasurement::new(config, self.next_color());
        let id = measurement.id;
        self.active = vec![measurement];
        info!("Single measurement set: {} ({} {})", id, joint, direction);
        self.configuration_changed();
        Ok(id)
    }

    /// idle → measuring; clears every series and records the start time
    pub fn start(&mut self) {
        for m in &mut self.active {
            m.clear_history();
        }
        self.start_time = Some(self.clock.now());
        self.measuring = true;
        info!("Measurement started ({} active)", self.active.len());
        self.emit(SessionEvent::StateChanged {
            state: SessionState::Measuring,
        });
    }

    /// measuring → idle; recorded data is kept
    pub fn stop(&mut self) {
        self.measuring = false;
        info!("Measurement stopped");
        self.emit(SessionEvent::StateChanged {
            state: SessionState::Idle,
        });
    }

    /// Any state → idle, discarding history and live readouts
    pub fn reset(&mut self) {
        for m in &mut self.active {
            m.clear_history();
            m.current_angle = 0.0;
        }
        self.measuring = false;
        self.start_time = None;
        info!("Measurement reset");
        self.emit(SessionEvent::StateChanged {
            state: SessionState::Idle,
        });
    }

    /// Store a deep copy of the active set; None when nothing was recorded
    pub fn save(&mut self) -> Option<Uuid> {
        if !self.active.iter().any(|m| !m.data.is_empty()) {
            debug!("Save skipped: no recorded data");
            return None;
        }

        let record = SavedSession {
            id: Uuid::new_v4(),
            date: self.clock.now(),
            measurements: self.active.clone(),
        };
        let id = record.id;
        self.saved.insert(0, record);
        info!("Saved session {} ({} total)", id, self.saved.len());
        self.emit(SessionEvent::Saved { id });
        Some(id)
    }

    pub fn delete_saved(&mut self, id: Uuid) -> Result<(), SessionError> {
        let before = self.saved.len();
        self.saved.retain(|s| s.id != id);
        if self.saved.len() == before {
            return Err(SessionError::SavedSessionNotFound(id));
        }
        info!("Deleted saved session {}", id);
        self.emit(SessionEvent::SavedDeleted { id });
        Ok(())
    }

    /// Whether `angle` would become a new recorded maximum for `id`
    pub fn would_set_new_max(&self, id: Uuid, angle: f64) -> bool {
        self.measuring
            && self
                .measurement(id)
                .map_or(false, |m| angle > m.max_angle)
    }

    /// Apply one resolved sample
    ///
    /// A `None` angle leaves the measurement untouched, including the live
    /// readout. The snapshot is kept only when the sample sets a new maximum.
    pub fn update_measurement_data(
        &mut self,
        id: Uuid,
        angle: Option<f64>,
        snapshot: Option<Snapshot>,
    ) -> Result<SampleOutcome, SessionError> {
        let timestamp = self
            .start_time
            .map(|start| (self.clock.now() - start).num_milliseconds() as f64 / 1000.0);
        let measuring = self.measuring;

        let measurement = self
            .active
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(SessionError::MeasurementNotFound(id))?;

        let Some(angle) = angle else {
            return Ok(SampleOutcome::Skipped);
        };
        measurement.current_angle = angle;

        let outcome = match (measuring, timestamp) {
            (true, Some(timestamp)) => SampleOutcome::Recorded {
                new_max: measurement.record(timestamp, angle, snapshot),
            },
            _ => SampleOutcome::Live,
        };

        self.emit(SessionEvent::Sample {
            id,
            angle,
            recorded: matches!(outcome, SampleOutcome::Recorded { .. }),
        });
        Ok(outcome)
    }

    /// Add a raw frame to the capture window
    pub fn push_frame(&mut self, frame: LandmarkFrame) {
        self.capture_buffer.push(frame);
    }

    pub fn capture_buffer_len(&self) -> usize {
        self.capture_buffer.len()
    }

    /// Share of the capture window currently filled (0.0 to 1.0)
    pub fn capture_fill_ratio(&self) -> f64 {
        self.capture_buffer.fill_ratio()
    }

    pub fn clear_capture_buffer(&mut self) {
        self.capture_buffer.clear();
        debug!("Capture buffer cleared");
    }

    /// Per-index mean of every buffered frame; None when the buffer is empty
    pub fn capture_average(&self) -> Option<LandmarkFrame> {
        if self.capture_buffer.is_empty() {
            warn!("Capture requested with an empty frame buffer");
            return None;
        }
        average_frames(self.capture_buffer.iter())
    }

    fn next_color(&mut self) -> &'static str {
        let color = PALETTE[self.color_cursor % PALETTE.len()];
        self.color_cursor += 1;
        color
    }

    fn configuration_changed(&mut self) {
        gauge!("rom_active_measurements").set(self.active.len() as f64);
        self.emit(SessionEvent::MeasurementsChanged);
    }

    fn emit(&self, event: SessionEvent) {
        // no receivers is fine
        let _ = self.events.send(event);
    }
}

impl Default for MeasurementSession {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use pose_landmarks::Landmark;

    fn session() -> (MeasurementSession, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let session = MeasurementSession::with_clock(SessionConfig::default(), clock.clone());
        (session, clock)
    }

    fn first_id(session: &MeasurementSession) -> Uuid {
        session.measurements()[0].id
    }

    fn jpeg(tag: u8) -> Snapshot {
        Snapshot::jpeg(vec![tag])
    }

    #[test]
    fn test_default_measurement() {
        let (session, _) = session();
        let m = &session.measurements()[0];
        assert_eq!(session.measurements().len(), 1);
        assert_eq!(m.joint(), JointType::Cervical);
        assert_eq!(m.direction(), MovementDirection::Flexion);
        assert_eq!(m.side(), None);
        assert_eq!(m.color, PALETTE[0]);
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_start_then_update() {
        let (mut session, _) = session();
        let id = first_id(&session);
        session.start();
        session.update_measurement_data(id, Some(45.0), None).unwrap();

        let m = session.measurement(id).unwrap();
        assert_eq!(m.data, vec![crate::DataPoint { timestamp: 0.0, angle: 45.0 }]);
        assert_eq!(m.max_angle, 45.0);
        assert_eq!(m.min_angle, 45.0);
    }

    #[test]
    fn test_snapshot_taken_at_new_max_only() {
        let (mut session, clock) = session();
        let id = first_id(&session);
        session.start();
        for (angle, tag) in [(30.0, 1), (50.0, 2), (20.0, 3)] {
            clock.advance_ms(100);
            session
                .update_measurement_data(id, Some(angle), Some(jpeg(tag)))
                .unwrap();
        }
        session.stop();

        let m = session.measurement(id).unwrap();
        assert_eq!(m.max_angle, 50.0);
        assert_eq!(m.min_angle, 20.0);
        assert_eq!(m.data.len(), 3);
        assert_eq!(m.snapshot, Some(jpeg(2)));
        assert!((m.data[2].timestamp - 0.3).abs() < 1e-9);
        assert!(!session.is_measuring());
    }

    #[test]
    fn test_reset_clears_everything() {
        let (mut session, _) = session();
        let id = first_id(&session);
        session.start();
        session.update_measurement_data(id, Some(30.0), Some(jpeg(1))).unwrap();
        session.reset();

        let m = session.measurement(id).unwrap();
        assert!(m.data.is_empty());
        assert_eq!(m.max_angle, f64::NEG_INFINITY);
        assert_eq!(m.min_angle, f64::INFINITY);
        assert_eq!(m.current_angle, 0.0);
        assert!(m.snapshot.is_none());
        assert!(!session.is_measuring());
    }

    #[test]
    fn test_stop_keeps_data() {
        let (mut session, _) = session();
        let id = first_id(&session);
        session.start();
        session.update_measurement_data(id, Some(12.0), None).unwrap();
        session.stop();
        assert_eq!(session.measurement(id).unwrap().data.len(), 1);
    }

    #[test]
    fn test_null_angle_skips_update() {
        let (mut session, _) = session();
        let id = first_id(&session);
        session.start();
        session.update_measurement_data(id, Some(40.0), None).unwrap();
        let outcome = session.update_measurement_data(id, None, Some(jpeg(9))).unwrap();

        assert_eq!(outcome, SampleOutcome::Skipped);
        let m = session.measurement(id).unwrap();
        assert_eq!(m.current_angle, 40.0);
        assert_eq!(m.data.len(), 1);
        assert_eq!(m.max_angle, 40.0);
        assert!(m.snapshot.is_none());
    }

    #[test]
    fn test_idle_updates_live_readout_only() {
        let (mut session, _) = session();
        let id = first_id(&session);
        let outcome = session.update_measurement_data(id, Some(33.0), Some(jpeg(1))).unwrap();
        assert_eq!(outcome, SampleOutcome::Live);
        let m = session.measurement(id).unwrap();
        assert_eq!(m.current_angle, 33.0);
        assert!(m.data.is_empty());
        assert_eq!(m.max(), None);
        assert!(m.snapshot.is_none());
    }

    #[test]
    fn test_start_clears_previous_run() {
        let (mut session, _) = session();
        let id = first_id(&session);
        session.start();
        session.update_measurement_data(id, Some(70.0), Some(jpeg(1))).unwrap();
        session.stop();
        session.start();
        let m = session.measurement(id).unwrap();
        assert!(m.data.is_empty());
        assert_eq!(m.max(), None);
        assert!(m.snapshot.is_none());
    }

    #[test]
    fn test_save_requires_data() {
        let (mut session, _) = session();
        assert_eq!(session.save(), None);
        assert!(session.saved().is_empty());
    }

    #[test]
    fn test_save_is_deep_copy_and_prepended() {
        let (mut session, _) = session();
        let id = first_id(&session);
        session.start();
        session.update_measurement_data(id, Some(10.0), None).unwrap();
        let first = session.save().unwrap();

        session.update_measurement_data(id, Some(20.0), None).unwrap();
        assert_eq!(session.saved()[0].measurements[0].data.len(), 1);
        assert_eq!(session.saved()[0].measurements[0].max_angle, 10.0);

        let second = session.save().unwrap();
        assert_eq!(session.saved()[0].id, second);
        assert_eq!(session.saved()[1].id, first);
    }

    #[test]
    fn test_delete_saved() {
        let (mut session, _) = session();
        let id = first_id(&session);
        session.start();
        session.update_measurement_data(id, Some(10.0), None).unwrap();
        let saved = session.save().unwrap();
        session.delete_saved(saved).unwrap();
        assert!(session.saved().is_empty());
        assert_eq!(
            session.delete_saved(saved),
            Err(SessionError::SavedSessionNotFound(saved))
        );
    }

    #[test]
    fn test_duplicate_add_rejected() {
        let (mut session, _) = session();
        let id = session
            .add_measurement(JointType::Knee, MovementDirection::Flexion, Some(Side::Left))
            .unwrap();
        let err = session
            .add_measurement(JointType::Knee, MovementDirection::Flexion, Some(Side::Left))
            .unwrap_err();
        assert_eq!(err, SessionError::DuplicateMeasurement { id });
        assert_eq!(session.measurements().len(), 2);

        // midline side is normalized before comparison
        assert!(session
            .add_measurement(JointType::Cervical, MovementDirection::Flexion, Some(Side::Right))
            .is_err());
    }

    #[test]
    fn test_invalid_configuration_rejected() {
        let (mut session, _) = session();
        let err = session
            .add_measurement(JointType::Knee, MovementDirection::Abduction, Some(Side::Left))
            .unwrap_err();
        assert!(matches!(err, SessionError::InvalidConfiguration(_)));
        assert!(session
            .set_single_measurement(JointType::Hip, MovementDirection::Flexion, None)
            .is_err());
        assert_eq!(session.measurements().len(), 1);
    }

    #[test]
    fn test_palette_round_robin_and_single_rewind() {
        let (mut session, _) = session();
        let a = session
            .add_measurement(JointType::Elbow, MovementDirection::Flexion, Some(Side::Left))
            .unwrap();
        session.remove_measurement(a).unwrap();
        let b = session
            .add_measurement(JointType::Elbow, MovementDirection::Flexion, Some(Side::Right))
            .unwrap();
        // removed colour is not reused
        assert_eq!(session.measurement(b).unwrap().color, PALETTE[2]);

        let single = session
            .set_single_measurement(JointType::Hip, MovementDirection::Abduction, Some(Side::Left))
            .unwrap();
        assert_eq!(session.measurements().len(), 1);
        assert_eq!(session.measurement(single).unwrap().color, PALETTE[0]);
    }

    #[test]
    fn test_remove_unknown_measurement() {
        let (mut session, _) = session();
        let id = Uuid::new_v4();
        assert_eq!(
            session.remove_measurement(id),
            Err(SessionError::MeasurementNotFound(id))
        );
        assert!(session.update_measurement_data(id, Some(1.0), None).is_err());
    }

    #[test]
    fn test_would_set_new_max() {
        let (mut session, _) = session();
        let id = first_id(&session);
        assert!(!session.would_set_new_max(id, 10.0));
        session.start();
        assert!(session.would_set_new_max(id, 10.0));
        session.update_measurement_data(id, Some(10.0), None).unwrap();
        assert!(!session.would_set_new_max(id, 10.0));
        assert!(session.would_set_new_max(id, 10.5));
    }

    #[test]
    fn test_capture_average() {
        let (mut session, _) = session();
        assert!(session.capture_average().is_none());

        session.push_frame(LandmarkFrame::filled(Landmark::visible(0.2, 0.4)));
        session.push_frame(LandmarkFrame::filled(Landmark::visible(0.4, 0.6)));
        let avg = session.capture_average().unwrap();
        assert!((avg.get(0).unwrap().x - 0.3).abs() < 1e-12);
        assert!((avg.get(32).unwrap().y - 0.5).abs() < 1e-12);

        assert!((session.capture_fill_ratio() - 2.0 / 30.0).abs() < 1e-12);

        session.clear_capture_buffer();
        assert_eq!(session.capture_buffer_len(), 0);
        assert_eq!(session.capture_fill_ratio(), 0.0);
        assert!(session.capture_average().is_none());
    }

    #[test]
    fn test_capture_buffer_bounded() {
        let (mut session, _) = session();
        for i in 0..45 {
            session.push_frame(LandmarkFrame::filled(Landmark::visible(i as f64 / 100.0, 0.5)));
        }
        assert_eq!(session.capture_buffer_len(), frame_buffer::DEFAULT_CAPACITY);
        assert_eq!(session.capture_fill_ratio(), 1.0);
    }

    #[tokio::test]
    async fn test_events_published() {
        let (mut session, _) = session();
        let mut rx = session.subscribe();
        let id = first_id(&session);

        session.start();
        session.update_measurement_data(id, Some(5.0), None).unwrap();

        assert_eq!(
            rx.recv().await.unwrap(),
            SessionEvent::StateChanged { state: SessionState::Measuring }
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            SessionEvent::Sample { id, angle: 5.0, recorded: true }
        );
    }
}
