use super::{GlyphHandle, NodeKind, NodeShape, RenderBackend, Scene, SceneNode};
use crate::error::{TrailError, TrailResult};
use crate::types::{Orientation, Position, Rgba};

/// In-memory backend used for headless runs and tests
///
/// Keeps the scene it was asked to build and nothing else. Can be switched
/// unavailable to make every `create` fail.
#[derive(Debug)]
pub struct RecordingBackend {
    scene: Scene,
    available: bool,
    created: u64,
    destroyed: u64,
    flushes: u64,
    time: f64,
    last_flushed: Vec<GlyphHandle>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        RecordingBackend {
            scene: Scene::default(),
            available: true,
            created: 0,
            destroyed: 0,
            flushes: 0,
            time: 0.0,
            last_flushed: Vec::new(),
        }
    }

    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn node(&self, handle: GlyphHandle) -> Option<&SceneNode> {
        self.scene.get(handle)
    }

    pub fn live(&self, kind: NodeKind) -> usize {
        self.scene.count(kind)
    }

    pub fn created(&self) -> u64 {
        self.created
    }

    pub fn destroyed(&self) -> u64 {
        self.destroyed
    }

    pub fn flushes(&self) -> u64 {
        self.flushes
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    /// Handles emitted by the most recent flush
    pub fn last_flushed(&self) -> &[GlyphHandle] {
        &self.last_flushed
    }
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderBackend for RecordingBackend {
    fn create(&mut self, kind: NodeKind) -> TrailResult<GlyphHandle> {
        if !self.available {
            return Err(TrailError::GlyphUnavailable(format!(
                "cannot create {:?}: backend offline",
                kind
            )));
        }
        self.created += 1;
        Ok(self.scene.insert(kind))
    }

    fn destroy(&mut self, handle: GlyphHandle) {
        if self.scene.remove(handle).is_some() {
            self.destroyed += 1;
        }
    }

    fn set_pose(&mut self, handle: GlyphHandle, position: &Position, orientation: &Orientation) {
        self.scene.update(handle, |node| {
            node.position = *position;
            node.orientation = *orientation;
        });
    }

    fn set_color(&mut self, handle: GlyphHandle, color: Rgba) {
        self.scene.update(handle, |node| node.color = color);
    }

    fn set_shape(&mut self, handle: GlyphHandle, shape: NodeShape) {
        self.scene.update(handle, |node| node.shape = Some(shape));
    }

    fn set_visible(&mut self, handle: GlyphHandle, visible: bool) {
        self.scene.update(handle, |node| node.visible = visible);
    }

    fn set_time(&mut self, timestamp: f64) {
        self.time = timestamp;
    }

    fn invalidate_all(&mut self) {
        self.scene.mark_all_dirty();
    }

    fn flush(&mut self) {
        let (dirty, _) = self.scene.take_changes();
        self.last_flushed = dirty;
        self.flushes += 1;
    }
}
