//! Rendering collaborator seam
//!
//! The accumulator never talks to a renderer directly: it drives a
//! [`RenderBackend`] through opaque [`GlyphHandle`]s. Both shipped backends
//! keep a retained [`Scene`] of node state; the recording backend stops there,
//! the Rerun backend additionally streams every dirty node on `flush`.

pub mod recording;
pub mod rerun_scene;

pub use self::recording::RecordingBackend;
pub use self::rerun_scene::RerunBackend;

use std::collections::{BTreeMap, BTreeSet};

use crate::config::{ArrowGeometry, AxesGeometry};
use crate::error::TrailResult;
use crate::types::{Orientation, Position, Rgba};

/// Opaque reference to a renderable owned by the backend
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GlyphHandle(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Arrow,
    Axes,
    Ellipsoid,
}

/// Per-kind dimensions of a node
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NodeShape {
    Arrow(ArrowGeometry),
    Axes(AxesGeometry),
    Ellipsoid { half_sizes: Position },
}

pub trait RenderBackend {
    fn create(&mut self, kind: NodeKind) -> TrailResult<GlyphHandle>;
    fn destroy(&mut self, handle: GlyphHandle);

    fn set_pose(&mut self, handle: GlyphHandle, position: &Position, orientation: &Orientation);
    fn set_color(&mut self, handle: GlyphHandle, color: Rgba);
    fn set_shape(&mut self, handle: GlyphHandle, shape: NodeShape);
    fn set_visible(&mut self, handle: GlyphHandle, visible: bool);

    /// Treat every live node as changed
    fn invalidate_all(&mut self);

    /// Stream time for subsequent updates
    fn set_time(&mut self, _timestamp: f64) {}

    /// Queue a render of everything changed since the last flush
    fn flush(&mut self) {}
}

/// Retained state of one backend node
#[derive(Clone, Debug, PartialEq)]
pub struct SceneNode {
    pub kind: NodeKind,
    pub position: Position,
    pub orientation: Orientation,
    pub color: Rgba,
    pub shape: Option<NodeShape>,
    pub visible: bool,
}

impl SceneNode {
    fn new(kind: NodeKind) -> Self {
        SceneNode {
            kind,
            position: Position::zeros(),
            orientation: Orientation::identity(),
            color: Rgba {
                r: 1.0,
                g: 1.0,
                b: 1.0,
                a: 1.0,
            },
            shape: None,
            visible: true,
        }
    }
}

/// Handle-keyed node store shared by the backends
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
    nodes: BTreeMap<GlyphHandle, SceneNode>,
    dirty: BTreeSet<GlyphHandle>,
    removed: Vec<GlyphHandle>,
    next_id: u64,
}

impl Scene {
    pub fn insert(&mut self, kind: NodeKind) -> GlyphHandle {
        let handle = GlyphHandle(self.next_id);
        self.next_id += 1;
        self.nodes.insert(handle, SceneNode::new(kind));
        self.dirty.insert(handle);
        handle
    }

    pub fn remove(&mut self, handle: GlyphHandle) -> Option<SceneNode> {
        let node = self.nodes.remove(&handle)?;
        self.dirty.remove(&handle);
        self.removed.push(handle);
        Some(node)
    }

    pub fn get(&self, handle: GlyphHandle) -> Option<&SceneNode> {
        self.nodes.get(&handle)
    }

    /// Mutate a node and mark it dirty; unknown handles are ignored
    pub fn update(&mut self, handle: GlyphHandle, f: impl FnOnce(&mut SceneNode)) {
        match self.nodes.get_mut(&handle) {
            Some(node) => {
                f(node);
                self.dirty.insert(handle);
            }
            None => log::debug!("update for unknown glyph {:?} ignored", handle),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn count(&self, kind: NodeKind) -> usize {
        self.nodes.values().filter(|n| n.kind == kind).count()
    }

    pub fn nodes(&self) -> impl Iterator<Item = (&GlyphHandle, &SceneNode)> {
        self.nodes.iter()
    }

    /// Mark every live node changed so the next flush re-emits it
    pub fn mark_all_dirty(&mut self) {
        self.dirty.extend(self.nodes.keys().copied());
    }

    /// Take the handles changed and removed since the last call
    pub fn take_changes(&mut self) -> (Vec<GlyphHandle>, Vec<GlyphHandle>) {
        let dirty = std::mem::take(&mut self.dirty).into_iter().collect();
        let removed = std::mem::take(&mut self.removed);
        (dirty, removed)
    }
}
