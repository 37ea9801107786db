//! Per-frame measurement dispatch

use joint_resolver::JointResolver;
use measurement_session::{MeasurementSession, SampleOutcome};
use metrics::counter;
use pose_landmarks::PoseResult;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tracing::{debug, info, warn};

use crate::hub::Subscription;
use crate::snapshot::encode_jpeg;
use crate::DispatchConfig;

/// Session handle shared by the dispatcher and the HTTP surface
pub type SharedSession = Arc<RwLock<MeasurementSession>>;

/// Counts for one processed frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Measurements with an angle this frame
    pub resolved: usize,
    /// Measurements gated out (missing or low-visibility landmarks)
    pub skipped: usize,
    /// Samples appended to a series
    pub recorded: usize,
    /// Peak snapshots stored
    pub snapshots: usize,
}

/// Resolves active measurements for each frame and applies the samples
pub struct MeasurementDispatcher {
    resolver: JointResolver,
    config: DispatchConfig,
}

impl MeasurementDispatcher {
    pub fn new(resolver: JointResolver, config: DispatchConfig) -> Self {
        info!("Creating measurement dispatcher with config: {:?}", config);
        Self { resolver, config }
    }

    /// Apply one frame to the session atomically
    pub fn process(&self, session: &mut MeasurementSession, result: &PoseResult) -> FrameReport {
        let mut report = FrameReport::default();
        session.push_frame(result.landmarks.clone());

        let targets: Vec<_> = session
            .measurements()
            .iter()
            .map(|m| (m.id, m.config))
            .collect();

        for (id, config) in targets {
            let angle = self.resolver.resolve(&config, result);
            let snapshot = match (angle, result.image.as_deref()) {
                (Some(angle), Some(image))
                    if self.config.capture_snapshots && session.would_set_new_max(id, angle) =>
                {
                    match encode_jpeg(image, self.config.snapshot_quality) {
                        Ok(snapshot) => Some(snapshot),
                        Err(e) => {
                            warn!("Peak snapshot for {} not stored: {}", id, e);
                            None
                        }
                    }
                }
                _ => None,
            };
            let has_snapshot = snapshot.is_some();

            match session.update_measurement_data(id, angle, snapshot) {
                Ok(SampleOutcome::Skipped) => report.skipped += 1,
                Ok(SampleOutcome::Live) => report.resolved += 1,
                Ok(SampleOutcome::Recorded { new_max }) => {
                    report.resolved += 1;
                    report.recorded += 1;
                    if new_max && has_snapshot {
                        report.snapshots += 1;
                    }
                }
                Err(e) => warn!("Sample for {} dropped: {}", id, e),
            }
        }

        counter!("rom_frames_dispatched_total").increment(1);
        counter!("rom_samples_recorded_total").increment(report.recorded as u64);
        counter!("rom_samples_skipped_total").increment(report.skipped as u64);
        report
    }

    /// Consume results until shutdown or the hub closes. Shutdown wins over a
    /// pending frame, so no frame is applied after it is signalled.
    pub async fn run(
        &self,
        mut subscription: Subscription,
        session: SharedSession,
        mut shutdown: watch::Receiver<bool>,
    ) {
        info!("Measurement dispatcher started");
        loop {
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                next = subscription.recv() => {
                    let Some(result) = next else {
                        debug!("Pose hub closed");
                        break;
                    };
                    let mut session = session.write().await;
                    self.process(&mut session, &result);
                }
            }
        }
        info!("Measurement dispatcher stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ExternalPoseModel, FrameHub};
    use image::RgbImage;
    use joint_resolver::{JointType, MovementDirection, Side};
    use pose_landmarks::schema::*;
    use pose_landmarks::{FrameSize, Landmark, LandmarkFrame};
    use std::time::Duration;

    fn elbow_frame(wrist_x: f64, wrist_y: f64) -> LandmarkFrame {
        let mut frame = LandmarkFrame::filled(Landmark::visible(0.5, 0.5));
        frame.set(LEFT_SHOULDER, Landmark::visible(0.5, 0.2));
        frame.set(LEFT_ELBOW, Landmark::visible(0.5, 0.5));
        frame.set(LEFT_WRIST, Landmark::visible(wrist_x, wrist_y));
        frame
    }

    fn elbow_session() -> MeasurementSession {
        let mut session = MeasurementSession::default();
        session
            .set_single_measurement(JointType::Elbow, MovementDirection::Flexion, Some(Side::Left))
            .unwrap();
        session
    }

    fn dispatcher() -> MeasurementDispatcher {
        MeasurementDispatcher::new(JointResolver::default(), DispatchConfig::default())
    }

    fn with_image(frame: LandmarkFrame) -> PoseResult {
        PoseResult::new(frame, FrameSize::new(1000, 1000))
            .with_image(Arc::new(RgbImage::new(8, 8)))
    }

    #[test]
    fn test_no_active_measurements_is_noop() {
        let mut session = MeasurementSession::default();
        let id = session.measurements()[0].id;
        session.remove_measurement(id).unwrap();

        let report = dispatcher().process(&mut session, &with_image(elbow_frame(0.8, 0.5)));
        assert_eq!(report, FrameReport::default());
        assert_eq!(session.capture_buffer_len(), 1);
    }

    #[test]
    fn test_short_frame_is_skipped() {
        let mut session = elbow_session();
        session.start();
        let short = PoseResult::new(
            LandmarkFrame::new(vec![Landmark::visible(0.5, 0.5); 5]),
            FrameSize::default(),
        );
        let report = dispatcher().process(&mut session, &short);
        assert_eq!(report.skipped, 1);
        assert!(session.measurements()[0].data.is_empty());
    }

    #[test]
    fn test_snapshot_only_on_new_peak() {
        let mut session = elbow_session();
        let dispatcher = dispatcher();
        session.start();

        // 90° bend, then 45°
        let first = dispatcher.process(&mut session, &with_image(elbow_frame(0.8, 0.5)));
        assert_eq!(first.snapshots, 1);
        let second = dispatcher.process(&mut session, &with_image(elbow_frame(0.8, 0.8)));
        assert_eq!(second.recorded, 1);
        assert_eq!(second.snapshots, 0);

        let m = &session.measurements()[0];
        assert_eq!(m.data.len(), 2);
        assert!((m.max_angle - 90.0).abs() < 1e-9);
        assert!(m.snapshot.is_some());
    }

    #[test]
    fn test_idle_session_updates_live_angle_without_snapshot() {
        let mut session = elbow_session();
        let report = dispatcher().process(&mut session, &with_image(elbow_frame(0.8, 0.5)));
        assert_eq!(report.resolved, 1);
        assert_eq!(report.recorded, 0);
        let m = &session.measurements()[0];
        assert!((m.current_angle - 90.0).abs() < 1e-9);
        assert!(m.snapshot.is_none());
    }

    #[tokio::test]
    async fn test_run_until_shutdown() {
        let hub = FrameHub::new(ExternalPoseModel::default(), &DispatchConfig::default());
        let session: SharedSession = Arc::new(RwLock::new(elbow_session()));
        session.write().await.start();

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let subscription = hub.subscribe().unwrap();
        let task = {
            let session = Arc::clone(&session);
            tokio::spawn(async move {
                dispatcher().run(subscription, session, shutdown_rx).await;
            })
        };

        hub.publish(PoseResult::new(elbow_frame(0.8, 0.5), FrameSize::new(1000, 1000)));
        tokio::time::timeout(Duration::from_secs(2), async {
            while session.read().await.measurements()[0].data.is_empty() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        shutdown_tx.send(true).unwrap();
        task.await.unwrap();

        // dispatcher's subscription released on exit
        assert_eq!(hub.subscriber_count(), 0);
        assert!(!hub.is_running());
    }
}
