use std::sync::{Arc, Mutex};

use super::{AccumulatorState, OdometryAccumulator, SampleOutcome, StatusReport};
use crate::backend::RenderBackend;
use crate::config::{ConfigChange, DisplayConfig};
use crate::error::{TrailError, TrailResult};
use crate::types::OdometryMessage;

/// Accumulator handle shared between the ingest thread and the control
/// surface; every operation runs under one lock
pub struct SharedAccumulator<B: RenderBackend> {
    inner: Arc<Mutex<OdometryAccumulator<B>>>,
}

impl<B: RenderBackend> Clone for SharedAccumulator<B> {
    fn clone(&self) -> Self {
        SharedAccumulator {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: RenderBackend> SharedAccumulator<B> {
    pub fn new(accumulator: OdometryAccumulator<B>) -> Self {
        SharedAccumulator {
            inner: Arc::new(Mutex::new(accumulator)),
        }
    }

    /// Run `f` with exclusive access to the accumulator
    pub fn with<R>(&self, f: impl FnOnce(&mut OdometryAccumulator<B>) -> R) -> TrailResult<R> {
        let mut acc = self.inner.lock().map_err(|_| TrailError::LockPoisoned)?;
        Ok(f(&mut acc))
    }

    pub fn on_message(&self, message: &OdometryMessage) -> TrailResult<SampleOutcome> {
        self.with(|acc| acc.on_message(message))
    }

    pub fn update_config(
        &self,
        update: impl FnOnce(&mut DisplayConfig) -> Option<ConfigChange>,
    ) -> TrailResult<Option<ConfigChange>> {
        self.with(|acc| acc.update_config(update))
    }

    pub fn replace_config(&self, config: DisplayConfig) -> TrailResult<Vec<ConfigChange>> {
        self.with(|acc| acc.replace_config(config))
    }

    pub fn on_reset(&self) -> TrailResult<()> {
        self.with(|acc| acc.on_reset())
    }

    pub fn on_enable(&self) -> TrailResult<()> {
        self.with(|acc| acc.on_enable())
    }

    pub fn on_disable(&self) -> TrailResult<()> {
        self.with(|acc| acc.on_disable())
    }

    pub fn state(&self) -> TrailResult<AccumulatorState> {
        self.with(|acc| acc.state())
    }

    pub fn status(&self) -> TrailResult<StatusReport> {
        self.with(|acc| acc.status().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{NodeKind, RecordingBackend};
    use std::thread;

    fn message(x: f64) -> OdometryMessage {
        OdometryMessage {
            timestamp: x,
            frame_id: "odom".to_string(),
            position: [x, 0.0, 0.0],
            orientation: [0.0, 0.0, 0.0, 1.0],
            covariance: vec![0.0; 36],
        }
    }

    #[test]
    fn test_shared_across_threads() {
        let shared = SharedAccumulator::new(OdometryAccumulator::new(
            RecordingBackend::new(),
            DisplayConfig::default(),
        ));

        let producer = shared.clone();
        let handle = thread::spawn(move || {
            for i in 0..20 {
                producer.on_message(&message(i as f64)).unwrap();
            }
        });
        handle.join().unwrap();

        shared.update_config(|c| c.set_keep(5)).unwrap();
        let status = shared.status().unwrap();
        assert_eq!(status.messages_received, 20);
        assert_eq!(shared.with(|acc| acc.history().len()).unwrap(), 5);
        assert_eq!(
            shared.with(|acc| acc.backend().live(NodeKind::Arrow)).unwrap(),
            5
        );
    }

    #[test]
    fn test_reset_through_handle() {
        let shared = SharedAccumulator::new(OdometryAccumulator::new(
            RecordingBackend::new(),
            DisplayConfig::default(),
        ));
        shared.on_message(&message(0.0)).unwrap();
        assert_eq!(shared.state().unwrap(), AccumulatorState::Accumulating);
        shared.on_reset().unwrap();
        assert_eq!(shared.state().unwrap(), AccumulatorState::Idle);
    }
}
