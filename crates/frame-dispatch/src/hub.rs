//! Pose result hub with reference-counted model activation

use metrics::counter;
use pose_landmarks::PoseResult;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};

use crate::{DispatchConfig, DispatchError};

/// Lifecycle hooks of the external pose model
pub trait PoseModel: Send {
    /// Load weights and allocate buffers; called once before the first resume
    fn warm_up(&mut self) -> Result<(), DispatchError>;
    /// Start issuing inference requests
    fn resume(&mut self);
    /// Stop issuing inference requests; warm state is kept
    fn pause(&mut self);
}

/// Model whose inference loop runs outside the process and pushes results in
#[derive(Debug, Default)]
pub struct ExternalPoseModel;

impl PoseModel for ExternalPoseModel {
    fn warm_up(&mut self) -> Result<(), DispatchError> {
        debug!("External pose model needs no warm-up");
        Ok(())
    }

    fn resume(&mut self) {
        debug!("Accepting pose results from the external model");
    }

    fn pause(&mut self) {
        debug!("Ignoring pose results until a consumer subscribes");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelState {
    /// Never warmed up
    Cold,
    Running,
    /// Warm, no consumers
    Paused,
}

struct Activation {
    model: Box<dyn PoseModel>,
    state: ModelState,
    subscribers: usize,
}

struct Shared {
    sender: broadcast::Sender<Arc<PoseResult>>,
    activation: Mutex<Activation>,
}

impl Shared {
    fn activation(&self) -> MutexGuard<'_, Activation> {
        self.activation
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn release(&self) {
        let mut activation = self.activation();
        activation.subscribers = activation.subscribers.saturating_sub(1);
        if activation.subscribers == 0 && activation.state == ModelState::Running {
            activation.model.pause();
            activation.state = ModelState::Paused;
            info!("Last consumer left, pose model paused");
        } else {
            debug!("Consumer left ({} remaining)", activation.subscribers);
        }
    }
}

/// Order-preserving fan-out of pose results to every subscriber
#[derive(Clone)]
pub struct FrameHub {
    shared: Arc<Shared>,
}

impl FrameHub {
    pub fn new(model: impl PoseModel + 'static, config: &DispatchConfig) -> Self {
        let (sender, _) = broadcast::channel(config.channel_capacity.max(1));
        Self {
            shared: Arc::new(Shared {
                sender,
                activation: Mutex::new(Activation {
                    model: Box::new(model),
                    state: ModelState::Cold,
                    subscribers: 0,
                }),
            }),
        }
    }

    /// Register a consumer; the first one warms up (once) and resumes the model.
    /// Dropping the returned handle unsubscribes.
    pub fn subscribe(&self) -> Result<Subscription, DispatchError> {
        let mut activation = self.shared.activation();
        if activation.subscribers == 0 {
            if activation.state == ModelState::Cold {
                info!("Warming up pose model");
                activation.model.warm_up()?;
            }
            activation.model.resume();
            activation.state = ModelState::Running;
            info!("Pose model running");
        }
        activation.subscribers += 1;
        debug!("Consumer joined ({} total)", activation.subscribers);

        Ok(Subscription {
            receiver: self.shared.sender.subscribe(),
            shared: Arc::clone(&self.shared),
        })
    }

    /// Deliver a result to every subscriber; returns how many received it
    pub fn publish(&self, result: PoseResult) -> usize {
        if !self.is_running() {
            debug!("Pose result dropped: no consumers");
            counter!("rom_frames_dropped_total").increment(1);
            return 0;
        }
        match self.shared.sender.send(Arc::new(result)) {
            Ok(receivers) => {
                counter!("rom_frames_published_total").increment(1);
                receivers
            }
            Err(_) => 0,
        }
    }

    pub fn state(&self) -> ModelState {
        self.shared.activation().state
    }

    pub fn is_running(&self) -> bool {
        self.state() == ModelState::Running
    }

    pub fn subscriber_count(&self) -> usize {
        self.shared.activation().subscribers
    }
}

/// Consumer handle; unsubscribes on drop
pub struct Subscription {
    receiver: broadcast::Receiver<Arc<PoseResult>>,
    shared: Arc<Shared>,
}

impl Subscription {
    /// Next result in publish order. A consumer that falls behind skips to
    /// the oldest retained result.
    pub async fn recv(&mut self) -> Option<Arc<PoseResult>> {
        loop {
            match self.receiver.recv().await {
                Ok(result) => return Some(result),
                Err(RecvError::Lagged(missed)) => {
                    warn!("Consumer lagged, skipped {} pose results", missed);
                    counter!("rom_frames_lagged_total").increment(missed);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.shared.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pose_landmarks::{FrameSize, LandmarkFrame};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Calls {
        warm_ups: AtomicUsize,
        resumes: AtomicUsize,
        pauses: AtomicUsize,
    }

    struct CountingModel {
        calls: Arc<Calls>,
        fail_warm_up: bool,
    }

    impl PoseModel for CountingModel {
        fn warm_up(&mut self) -> Result<(), DispatchError> {
            self.calls.warm_ups.fetch_add(1, Ordering::SeqCst);
            if self.fail_warm_up {
                return Err(DispatchError::WarmUp("weights missing".to_string()));
            }
            Ok(())
        }

        fn resume(&mut self) {
            self.calls.resumes.fetch_add(1, Ordering::SeqCst);
        }

        fn pause(&mut self) {
            self.calls.pauses.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn hub(fail_warm_up: bool) -> (FrameHub, Arc<Calls>) {
        let calls = Arc::new(Calls::default());
        let model = CountingModel {
            calls: Arc::clone(&calls),
            fail_warm_up,
        };
        (FrameHub::new(model, &DispatchConfig::default()), calls)
    }

    fn result(timestamp_ms: i64) -> PoseResult {
        let mut result = PoseResult::new(LandmarkFrame::default(), FrameSize::default());
        result.timestamp_ms = timestamp_ms;
        result
    }

    #[test]
    fn test_reference_counted_activation() {
        let (hub, calls) = hub(false);
        assert_eq!(hub.state(), ModelState::Cold);

        let first = hub.subscribe().unwrap();
        let second = hub.subscribe().unwrap();
        assert!(hub.is_running());
        assert_eq!(calls.warm_ups.load(Ordering::SeqCst), 1);
        assert_eq!(calls.resumes.load(Ordering::SeqCst), 1);

        drop(first);
        assert!(hub.is_running());
        assert_eq!(calls.pauses.load(Ordering::SeqCst), 0);

        drop(second);
        assert_eq!(hub.state(), ModelState::Paused);
        assert_eq!(calls.pauses.load(Ordering::SeqCst), 1);

        // warm state survives; no second warm-up
        let _again = hub.subscribe().unwrap();
        assert_eq!(calls.warm_ups.load(Ordering::SeqCst), 1);
        assert_eq!(calls.resumes.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_failed_warm_up_leaves_hub_cold() {
        let (hub, _) = hub(true);
        assert!(hub.subscribe().is_err());
        assert_eq!(hub.subscriber_count(), 0);
        assert_eq!(hub.state(), ModelState::Cold);
    }

    #[test]
    fn test_publish_without_consumers() {
        let (hub, _) = hub(false);
        assert_eq!(hub.publish(result(1)), 0);
    }

    #[tokio::test]
    async fn test_broadcast_preserves_order() {
        let (hub, _) = hub(false);
        let mut a = hub.subscribe().unwrap();
        let mut b = hub.subscribe().unwrap();

        for ts in 1..=3 {
            assert_eq!(hub.publish(result(ts)), 2);
        }
        for ts in 1..=3 {
            assert_eq!(a.recv().await.unwrap().timestamp_ms, ts);
        }
        for ts in 1..=3 {
            assert_eq!(b.recv().await.unwrap().timestamp_ms, ts);
        }
    }

    #[tokio::test]
    async fn test_lagged_consumer_skips_ahead() {
        let calls = Arc::new(Calls::default());
        let model = CountingModel {
            calls,
            fail_warm_up: false,
        };
        let config = DispatchConfig {
            channel_capacity: 2,
            ..Default::default()
        };
        let hub = FrameHub::new(model, &config);
        let mut sub = hub.subscribe().unwrap();
        for ts in 1..=5 {
            hub.publish(result(ts));
        }
        assert_eq!(sub.recv().await.unwrap().timestamp_ms, 4);
        assert_eq!(sub.recv().await.unwrap().timestamp_ms, 5);
    }
}
