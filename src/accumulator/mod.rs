//! Odometry accumulator state machine
//!
//! Consumes pose samples one at a time, thins them through the decimation
//! policy, keeps a bounded trail of glyphs and restyles that trail in place
//! when the display configuration changes.

pub mod shared;
pub mod status;

pub use self::shared::SharedAccumulator;
pub use self::status::{StatusLevel, StatusReport};

use log::{debug, error, info, warn};

use crate::backend::RenderBackend;
use crate::config::{ConfigChange, DisplayConfig};
use crate::decimation::DecimationPolicy;
use crate::error::TrailError;
use crate::frames::{FrameTransformer, IdentityTransform};
use crate::glyph::{Glyph, GlyphFactory};
use crate::history::{EntryId, HistoryStore, RetainedEntry};
use crate::types::{OdometryMessage, Orientation, PoseSample, Position};
use crate::uncertainty::{UncertaintyRenderer, UncertaintyVisual};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccumulatorState {
    /// No sample retained since construction or the last reset
    Idle,
    Accumulating,
}

/// What happened to one incoming sample
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SampleOutcome {
    Retained(EntryId),
    /// Kept in history but its primary glyph could not be built
    RetainedWithoutGlyph(EntryId),
    Decimated,
    Rejected,
}

impl SampleOutcome {
    pub fn is_retained(&self) -> bool {
        matches!(
            self,
            SampleOutcome::Retained(_) | SampleOutcome::RetainedWithoutGlyph(_)
        )
    }
}

pub struct OdometryAccumulator<B: RenderBackend> {
    config: DisplayConfig,
    history: HistoryStore,
    factory: GlyphFactory<B>,
    uncertainty: UncertaintyRenderer,
    transformer: Box<dyn FrameTransformer>,
    enabled: bool,
    last_retained: Option<PoseSample>,
    last_received: Option<PoseSample>,
    status: StatusReport,
}

/// Borrowed view used to draw and restyle entries while the history is
/// mutably borrowed
struct Painter<'a, B: RenderBackend> {
    factory: &'a mut GlyphFactory<B>,
    renderer: &'a UncertaintyRenderer,
    config: &'a DisplayConfig,
    transformer: &'a dyn FrameTransformer,
    status: &'a mut StatusReport,
    visible: bool,
}

impl<'a, B: RenderBackend> Painter<'a, B> {
    fn resolve(&mut self, sample: &PoseSample) -> (Position, Orientation) {
        match self.transformer.transform(sample) {
            Some(pose) => pose,
            None => {
                error!(
                    "Error transforming odometry from frame '{}' to frame '{}'",
                    sample.frame_id,
                    self.transformer.fixed_frame()
                );
                self.status.transform_failures += 1;
                (sample.position, sample.orientation)
            }
        }
    }

    fn fault(&mut self, err: TrailError) {
        warn!("{}", err);
        self.status.record_glyph_fault(&err);
    }

    /// Build the primary glyph and uncertainty parts of a new entry
    fn draw(&mut self, sample: &PoseSample) -> (Option<Glyph>, UncertaintyVisual) {
        let (position, orientation) = self.resolve(sample);

        let glyph = match self.factory.create(self.config) {
            Ok(mut glyph) => {
                self.factory.place(&glyph, &position, &orientation);
                self.factory.style(&mut glyph, self.config);
                self.factory.set_visible(glyph.handle(), self.visible);
                Some(glyph)
            }
            Err(e) => {
                self.fault(e);
                None
            }
        };

        let mut visual = UncertaintyVisual::default();
        if let Err(e) = self.renderer.apply(
            self.factory,
            &mut visual,
            &position,
            &orientation,
            &sample.covariance,
            &self.config.covariance,
            self.visible,
        ) {
            self.fault(e);
        }
        (glyph, visual)
    }

    /// Reapply colors, dimensions and covariance toggles without touching
    /// the entry's primary glyph handle
    fn restyle(&mut self, entry: &mut RetainedEntry) {
        if let Some(glyph) = entry.glyph.as_mut() {
            self.factory.style(glyph, self.config);
        }
        let (position, orientation) = self.resolve(&entry.sample);
        if let Err(e) = self.renderer.apply(
            self.factory,
            &mut entry.uncertainty,
            &position,
            &orientation,
            &entry.sample.covariance,
            &self.config.covariance,
            self.visible,
        ) {
            self.fault(e);
        }
    }

    fn set_visible(&mut self, entry: &RetainedEntry) {
        if let Some(glyph) = entry.glyph.as_ref() {
            self.factory.set_visible(glyph.handle(), self.visible);
        }
        self.renderer.set_visible(self.factory, &entry.uncertainty, self.visible);
    }
}

impl<B: RenderBackend> OdometryAccumulator<B> {
    pub fn new(backend: B, config: DisplayConfig) -> Self {
        let config = config.sanitized();
        OdometryAccumulator {
            history: HistoryStore::new(config.keep),
            config,
            factory: GlyphFactory::new(backend),
            uncertainty: UncertaintyRenderer::new(),
            transformer: Box::new(IdentityTransform::default()),
            enabled: true,
            last_retained: None,
            last_received: None,
            status: StatusReport::new(),
        }
    }

    pub fn with_transformer(mut self, transformer: Box<dyn FrameTransformer>) -> Self {
        self.transformer = transformer;
        self
    }

    pub fn state(&self) -> AccumulatorState {
        if self.last_retained.is_some() {
            AccumulatorState::Accumulating
        } else {
            AccumulatorState::Idle
        }
    }

    /// Validate a transport message and feed it through the pipeline
    pub fn on_message(&mut self, message: &OdometryMessage) -> SampleOutcome {
        match PoseSample::try_from(message) {
            Ok(sample) => self.ingest(sample),
            Err(e) => self.reject(e),
        }
    }

    pub fn on_sample(&mut self, sample: PoseSample) -> SampleOutcome {
        match sample.validate() {
            Ok(()) => self.ingest(sample),
            Err(e) => self.reject(e),
        }
    }

    fn reject(&mut self, err: TrailError) -> SampleOutcome {
        warn!("Dropping odometry sample: {}", err);
        self.status.record_malformed(&err);
        SampleOutcome::Rejected
    }

    fn ingest(&mut self, sample: PoseSample) -> SampleOutcome {
        self.status.record_received();
        self.last_received = Some(sample.clone());

        let policy = DecimationPolicy::from_config(&self.config);
        if !policy.accept(self.last_retained.as_ref(), &sample) {
            self.status.samples_decimated += 1;
            return SampleOutcome::Decimated;
        }

        self.factory.backend_mut().set_time(sample.timestamp);
        let (history, mut painter) = self.split();
        let (glyph, visual) = painter.draw(&sample);
        let drawn = glyph.is_some();
        let id = history.push(sample.clone(), glyph, visual, painter.factory);

        self.last_retained = Some(sample);
        self.status.samples_retained += 1;
        self.factory.backend_mut().flush();

        if drawn {
            SampleOutcome::Retained(id)
        } else {
            SampleOutcome::RetainedWithoutGlyph(id)
        }
    }

    /// React to a configuration change already applied to `self.config`
    pub fn on_style_change(&mut self, change: ConfigChange) {
        debug!("config change: {:?}", change);
        match change {
            ConfigChange::ShapeChanged => self.rebuild(),
            ConfigChange::StyleChanged | ConfigChange::CovarianceToggled => {
                let (history, mut painter) = self.split();
                history.for_each_mut(|entry| painter.restyle(entry));
            }
            ConfigChange::CapacityChanged => {
                let keep = self.config.keep;
                self.history.resize_capacity(keep, &mut self.factory);
            }
            // Only future decimation decisions change
            ConfigChange::ToleranceChanged => {}
        }
        self.factory.backend_mut().flush();
    }

    /// Mutate the config through one of its setters and apply the result
    pub fn update_config(
        &mut self,
        update: impl FnOnce(&mut DisplayConfig) -> Option<ConfigChange>,
    ) -> Option<ConfigChange> {
        let change = update(&mut self.config);
        if let Some(change) = change {
            self.on_style_change(change);
        }
        change
    }

    /// Swap in a whole config snapshot, applying every resulting change
    pub fn replace_config(&mut self, config: DisplayConfig) -> Vec<ConfigChange> {
        let config = config.sanitized();
        let changes = self.config.diff(&config);
        self.config = config;
        for change in &changes {
            self.on_style_change(*change);
        }
        changes
    }

    pub fn on_capacity_change(&mut self, keep: usize) {
        self.update_config(|config| config.set_keep(keep));
    }

    pub fn on_reset(&mut self) {
        self.history.clear(&mut self.factory);
        self.last_retained = None;
        self.last_received = None;
        self.status.reset();
        self.factory.backend_mut().flush();
        info!("Odometry trail reset");
    }

    pub fn on_enable(&mut self) {
        self.set_enabled(true);
    }

    pub fn on_disable(&mut self) {
        self.set_enabled(false);
    }

    fn set_enabled(&mut self, enabled: bool) {
        if self.enabled == enabled {
            return;
        }
        self.enabled = enabled;
        let (history, mut painter) = self.split();
        history.for_each(|entry| painter.set_visible(entry));
        self.factory.backend_mut().flush();
    }

    /// Install a new fixed-frame resolver; the existing trail is discarded
    pub fn set_transformer(&mut self, transformer: Box<dyn FrameTransformer>) {
        info!("Fixed frame changed to '{}'", transformer.fixed_frame());
        self.transformer = transformer;
        self.on_reset();
    }

    /// Re-emit every live node at the time of the last received sample
    pub fn redraw(&mut self) -> bool {
        let Some(timestamp) = self.last_received.as_ref().map(|s| s.timestamp) else {
            return false;
        };
        let backend = self.factory.backend_mut();
        backend.set_time(timestamp);
        backend.invalidate_all();
        backend.flush();
        true
    }

    /// Drop every glyph and rebuild the trail from retained samples
    ///
    /// Replay skips decimation: every retained sample stays retained.
    fn rebuild(&mut self) {
        let samples = self.history.drain_samples(&mut self.factory);
        debug!("rebuilding {} entries as {:?}", samples.len(), self.config.shape);
        let (history, mut painter) = self.split();
        for sample in samples {
            let (glyph, visual) = painter.draw(&sample);
            history.push(sample, glyph, visual, &mut *painter.factory);
        }
    }

    fn split(&mut self) -> (&mut HistoryStore, Painter<'_, B>) {
        (
            &mut self.history,
            Painter {
                factory: &mut self.factory,
                renderer: &self.uncertainty,
                config: &self.config,
                transformer: &*self.transformer,
                status: &mut self.status,
                visible: self.enabled,
            },
        )
    }

    pub fn config(&self) -> &DisplayConfig {
        &self.config
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn status(&self) -> &StatusReport {
        &self.status
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn last_retained(&self) -> Option<&PoseSample> {
        self.last_retained.as_ref()
    }

    pub fn last_received(&self) -> Option<&PoseSample> {
        self.last_received.as_ref()
    }

    pub fn backend(&self) -> &B {
        self.factory.backend()
    }

    pub fn backend_mut(&mut self) -> &mut B {
        self.factory.backend_mut()
    }
}

impl<B: RenderBackend> Drop for OdometryAccumulator<B> {
    fn drop(&mut self) {
        self.history.clear(&mut self.factory);
        self.factory.backend_mut().flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{NodeKind, NodeShape, RecordingBackend};
    use crate::config::{ArrowGeometry, CovariancePartKind, ShapeKind};
    use crate::frames::StaticTransforms;
    use crate::types::{PoseCovariance, Rgb};
    use nalgebra::{Isometry3, Translation3};

    fn sample_at(t: f64, x: f64, yaw: f64) -> PoseSample {
        PoseSample::new(
            t,
            "odom",
            Position::new(x, 0.0, 0.0),
            Orientation::from_euler_angles(0.0, 0.0, yaw),
            PoseCovariance::identity() * 0.04,
        )
        .unwrap()
    }

    fn sample(x: f64) -> PoseSample {
        sample_at(x, x, 0.0)
    }

    fn no_covariance() -> DisplayConfig {
        let mut config = DisplayConfig::default();
        config.set_covariance_enabled(false);
        config
    }

    fn accumulator(config: DisplayConfig) -> OdometryAccumulator<RecordingBackend> {
        OdometryAccumulator::new(RecordingBackend::new(), config)
    }

    fn retained_x(acc: &OdometryAccumulator<RecordingBackend>) -> Vec<f64> {
        acc.history().iter().map(|e| e.sample.position.x).collect()
    }

    #[test]
    fn test_starts_idle_and_accepts_first_sample() {
        let mut acc = accumulator(no_covariance());
        assert_eq!(acc.state(), AccumulatorState::Idle);
        assert_eq!(acc.status().level, StatusLevel::Warn);

        assert!(acc.on_sample(sample(0.0)).is_retained());
        assert_eq!(acc.state(), AccumulatorState::Accumulating);
        assert_eq!(acc.backend().live(NodeKind::Arrow), 1);
        assert_eq!(acc.status().level, StatusLevel::Ok);
    }

    #[test]
    fn test_position_decimation_sequence() {
        let mut config = no_covariance();
        config.set_position_tolerance(1.0);
        config.set_angle_tolerance(1.0);
        let mut acc = accumulator(config);

        for x in [0.0, 0.5, 1.2, 1.3, 2.5] {
            acc.on_sample(sample(x));
        }
        assert_eq!(retained_x(&acc), vec![0.0, 1.2, 2.5]);
        assert_eq!(acc.status().samples_decimated, 2);
        assert_eq!(acc.status().messages_received, 5);
    }

    #[test]
    fn test_angle_tolerance_alone_accepts_rotation() {
        let mut config = no_covariance();
        config.set_position_tolerance(10.0);
        config.set_angle_tolerance(0.5);
        let mut acc = accumulator(config);

        assert!(acc.on_sample(sample_at(0.0, 0.0, 0.0)).is_retained());
        assert_eq!(acc.on_sample(sample_at(1.0, 0.0, 0.2)), SampleOutcome::Decimated);
        assert!(acc.on_sample(sample_at(2.0, 0.0, 0.6)).is_retained());
    }

    #[test]
    fn test_decimation_is_deterministic() {
        let inputs: Vec<PoseSample> = (0..50)
            .map(|i| sample_at(i as f64, (i as f64 * 0.37).sin() * 3.0, i as f64 * 0.05))
            .collect();
        let run = || {
            let mut acc = accumulator(no_covariance());
            for s in &inputs {
                acc.on_sample(s.clone());
            }
            retained_x(&acc)
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_history_never_exceeds_keep() {
        let mut config = no_covariance();
        config.set_keep(3);
        config.set_position_tolerance(0.0);
        let mut acc = accumulator(config);

        for x in [1.0, 2.0, 3.0, 4.0] {
            acc.on_sample(sample(x));
            assert!(acc.history().len() <= 3);
        }
        assert_eq!(retained_x(&acc), vec![2.0, 3.0, 4.0]);
        assert_eq!(acc.backend().live(NodeKind::Arrow), 3);
    }

    #[test]
    fn test_capacity_shrink_and_grow() {
        let mut config = no_covariance();
        config.set_keep(5);
        let mut acc = accumulator(config);
        for x in [1.0, 2.0, 3.0, 4.0, 5.0] {
            acc.on_sample(sample(x));
        }

        acc.on_capacity_change(2);
        assert_eq!(retained_x(&acc), vec![4.0, 5.0]);
        assert_eq!(acc.backend().live(NodeKind::Arrow), 2);

        acc.on_capacity_change(10);
        assert_eq!(acc.history().len(), 2);
        assert_eq!(acc.config().keep, 10);
    }

    #[test]
    fn test_malformed_sample_is_rejected() {
        let mut acc = accumulator(no_covariance());
        acc.on_sample(sample(0.0));

        let mut bad = sample(5.0);
        bad.position.y = f64::NAN;
        assert_eq!(acc.on_sample(bad), SampleOutcome::Rejected);
        assert_eq!(acc.history().len(), 1);
        assert_eq!(acc.last_retained().unwrap().position.x, 0.0);
        assert_eq!(acc.status().level, StatusLevel::Error);
        assert_eq!(acc.status().malformed_samples, 1);
        assert_eq!(acc.status().messages_received, 2);

        // Stream continues
        assert!(acc.on_sample(sample(1.0)).is_retained());
        assert_eq!(acc.status().level, StatusLevel::Ok);
        assert_eq!(acc.status().message, "3 messages received");
    }

    #[test]
    fn test_malformed_message_is_rejected() {
        let mut acc = accumulator(no_covariance());
        let message = OdometryMessage {
            timestamp: 0.0,
            frame_id: "odom".to_string(),
            position: [0.0, 0.0, 0.0],
            orientation: [0.0, 0.0, 0.0, 1.0],
            covariance: vec![0.0; 12],
        };
        assert_eq!(acc.on_message(&message), SampleOutcome::Rejected);
        assert_eq!(acc.state(), AccumulatorState::Idle);
    }

    #[test]
    fn test_restyle_keeps_handles_and_is_idempotent() {
        let mut acc = accumulator(DisplayConfig::default());
        for x in [0.0, 1.0, 2.0] {
            acc.on_sample(sample(x));
        }
        let handles: Vec<_> = acc.history().iter().flat_map(|e| e.handles().collect::<Vec<_>>()).collect();
        let created = acc.backend().created();

        acc.update_config(|c| c.set_color(Rgb::new(0, 0, 255)));
        let after_first = acc.backend().scene().clone();
        acc.on_style_change(ConfigChange::StyleChanged);

        let handles_after: Vec<_> = acc.history().iter().flat_map(|e| e.handles().collect::<Vec<_>>()).collect();
        assert_eq!(handles, handles_after);
        assert_eq!(acc.backend().created(), created);
        assert_eq!(acc.backend().scene(), &after_first);

        let glyph = acc.history().newest().unwrap().glyph.unwrap();
        let node = acc.backend().node(glyph.handle()).unwrap();
        assert_eq!(node.color.to_u8(), [0, 0, 255, 255]);
    }

    #[test]
    fn test_geometry_change_restyles_in_place() {
        let mut acc = accumulator(no_covariance());
        acc.on_sample(sample(0.0));
        let geometry = ArrowGeometry {
            head_radius: 0.4,
            ..ArrowGeometry::default()
        };
        assert_eq!(
            acc.update_config(|c| c.set_arrow_geometry(geometry)),
            Some(ConfigChange::StyleChanged)
        );
        let glyph = acc.history().newest().unwrap().glyph.unwrap();
        assert_eq!(
            acc.backend().node(glyph.handle()).unwrap().shape,
            Some(NodeShape::Arrow(geometry))
        );
    }

    #[test]
    fn test_shape_change_replays_history() {
        let mut acc = accumulator(no_covariance());
        for x in [0.0, 1.0, 2.0] {
            acc.on_sample(sample(x));
        }
        acc.update_config(|c| c.set_shape(ShapeKind::Axes));

        assert_eq!(acc.backend().live(NodeKind::Arrow), 0);
        assert_eq!(acc.backend().live(NodeKind::Axes), 3);
        assert_eq!(retained_x(&acc), vec![0.0, 1.0, 2.0]);
        assert!(acc
            .history()
            .iter()
            .all(|e| e.glyph.map(|g| g.kind()) == Some(ShapeKind::Axes)));
    }

    #[test]
    fn test_covariance_toggle_destroys_and_rebuilds() {
        let mut acc = accumulator(DisplayConfig::default());
        for x in [0.0, 1.0] {
            acc.on_sample(sample(x));
        }
        assert_eq!(acc.backend().live(NodeKind::Ellipsoid), 4);

        acc.update_config(|c| c.set_covariance_enabled(false));
        assert_eq!(acc.backend().live(NodeKind::Ellipsoid), 0);
        assert_eq!(acc.backend().live(NodeKind::Arrow), 2);

        acc.update_config(|c| c.set_covariance_enabled(true));
        assert_eq!(acc.backend().live(NodeKind::Ellipsoid), 4);

        acc.update_config(|c| c.set_covariance_part_shown(CovariancePartKind::Orientation, false));
        assert_eq!(acc.backend().live(NodeKind::Ellipsoid), 2);
        assert!(acc.history().iter().all(|e| e.uncertainty.orientation.is_none()));
    }

    #[test]
    fn test_reset_clears_and_accepts_next_sample() {
        let mut acc = accumulator(DisplayConfig::default());
        acc.on_sample(sample(0.0));
        acc.on_sample(sample(1.0));
        acc.on_reset();

        assert!(acc.history().is_empty());
        assert!(acc.backend().scene().is_empty());
        assert_eq!(acc.state(), AccumulatorState::Idle);
        assert_eq!(acc.status().message, "No messages received");

        // Would have been decimated against the pre-reset sample
        assert!(acc.on_sample(sample(1.0)).is_retained());
    }

    #[test]
    fn test_glyph_fault_keeps_sample() {
        let mut acc = accumulator(DisplayConfig::default());
        acc.backend_mut().set_available(false);

        assert!(matches!(
            acc.on_sample(sample(0.0)),
            SampleOutcome::RetainedWithoutGlyph(_)
        ));
        assert_eq!(acc.history().len(), 1);
        assert_eq!(acc.status().level, StatusLevel::Warn);
        assert!(acc.status().glyph_faults >= 1);
        assert_eq!(acc.state(), AccumulatorState::Accumulating);

        // Recovery on later samples and restyles
        acc.backend_mut().set_available(true);
        assert!(matches!(acc.on_sample(sample(1.0)), SampleOutcome::Retained(_)));
        acc.on_style_change(ConfigChange::StyleChanged);
        assert_eq!(acc.backend().live(NodeKind::Ellipsoid), 4);
    }

    #[test]
    fn test_disable_hides_and_enable_shows() {
        let mut acc = accumulator(DisplayConfig::default());
        acc.on_sample(sample(0.0));
        acc.on_disable();
        assert!(acc.backend().scene().nodes().all(|(_, n)| !n.visible));

        // Accumulation continues while hidden
        assert!(acc.on_sample(sample(1.0)).is_retained());
        assert!(acc.backend().scene().nodes().all(|(_, n)| !n.visible));
        assert_eq!(acc.history().len(), 2);

        acc.on_enable();
        assert!(acc.backend().scene().nodes().all(|(_, n)| n.visible));
    }

    #[test]
    fn test_replace_config_applies_all_changes() {
        let mut acc = accumulator(DisplayConfig::default());
        for x in [0.0, 1.0, 2.0] {
            acc.on_sample(sample(x));
        }
        let mut next = DisplayConfig::default();
        next.keep = 1;
        next.shape = ShapeKind::Axes;
        next.covariance.enabled = false;
        let changes = acc.replace_config(next);

        assert!(changes.contains(&ConfigChange::CapacityChanged));
        assert!(changes.contains(&ConfigChange::ShapeChanged));
        assert_eq!(acc.history().len(), 1);
        assert_eq!(acc.backend().live(NodeKind::Axes), 1);
        assert_eq!(acc.backend().live(NodeKind::Ellipsoid), 0);
    }

    #[test]
    fn test_transform_failure_falls_back_to_raw_pose() {
        let mut tf = StaticTransforms::new("map");
        tf.insert(
            "base",
            Isometry3::from_parts(Translation3::new(0.0, 10.0, 0.0), Orientation::identity()),
        );
        let mut acc = accumulator(no_covariance()).with_transformer(Box::new(tf));

        acc.on_sample(sample(3.0));
        let glyph = acc.history().newest().unwrap().glyph.unwrap();
        assert_eq!(acc.backend().node(glyph.handle()).unwrap().position.x, 3.0);
        assert_eq!(acc.status().transform_failures, 1);
    }

    #[test]
    fn test_fixed_frame_change_clears_trail() {
        let mut acc = accumulator(no_covariance());
        acc.on_sample(sample(0.0));
        acc.set_transformer(Box::new(IdentityTransform::new("map")));
        assert!(acc.history().is_empty());
        assert_eq!(acc.state(), AccumulatorState::Idle);
    }

    #[test]
    fn test_zero_tolerance_retains_repeated_pose() {
        let mut config = no_covariance();
        config.set_position_tolerance(0.0);
        let mut acc = accumulator(config);
        for _ in 0..3 {
            assert!(acc.on_sample(sample(2.0)).is_retained());
        }
        assert_eq!(acc.history().len(), 3);
    }

    #[test]
    fn test_redraw_reemits_every_live_node() {
        let mut acc = accumulator(DisplayConfig::default());
        assert!(!acc.redraw());
        for x in [0.0, 1.0, 2.0] {
            acc.on_sample(sample(x));
        }
        assert!(acc.redraw());

        let mut live: Vec<_> = acc.backend().scene().nodes().map(|(h, _)| *h).collect();
        let mut emitted = acc.backend().last_flushed().to_vec();
        live.sort();
        emitted.sort();
        assert_eq!(live.len(), 9);
        assert_eq!(emitted, live);
    }

    #[test]
    fn test_every_operation_flushes() {
        let mut acc = accumulator(no_covariance());
        acc.on_sample(sample(0.0));
        let flushes = acc.backend().flushes();
        acc.update_config(|c| c.set_alpha(0.5));
        assert!(acc.backend().flushes() > flushes);
        assert!(acc.redraw());
        assert_eq!(acc.backend().time(), 0.0);
    }
}
