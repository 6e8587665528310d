//! Primary glyphs and their resource lifecycle
//!
//! A retained entry is drawn either as an arrow or as an axes triad, never
//! both. The kind is a tag on [`Glyph`]; styling dispatches on it in one place.

use crate::backend::{GlyphHandle, NodeKind, NodeShape, RenderBackend};
use crate::config::{ArrowGeometry, AxesGeometry, DisplayConfig, ShapeKind};
use crate::error::TrailResult;
use crate::types::{Orientation, Position};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Glyph {
    Arrow {
        handle: GlyphHandle,
        geometry: ArrowGeometry,
    },
    Axes {
        handle: GlyphHandle,
        geometry: AxesGeometry,
    },
}

impl Glyph {
    pub fn kind(&self) -> ShapeKind {
        match self {
            Glyph::Arrow { .. } => ShapeKind::Arrow,
            Glyph::Axes { .. } => ShapeKind::Axes,
        }
    }

    pub fn handle(&self) -> GlyphHandle {
        match self {
            Glyph::Arrow { handle, .. } | Glyph::Axes { handle, .. } => *handle,
        }
    }
}

/// Creates and destroys backend resources; holds no display policy
pub struct GlyphFactory<B> {
    backend: B,
    live: usize,
}

impl<B: RenderBackend> GlyphFactory<B> {
    pub fn new(backend: B) -> Self {
        GlyphFactory { backend, live: 0 }
    }

    pub fn create_arrow(&mut self, geometry: ArrowGeometry) -> TrailResult<Glyph> {
        let handle = self.create_node(NodeKind::Arrow)?;
        self.backend.set_shape(handle, NodeShape::Arrow(geometry));
        Ok(Glyph::Arrow { handle, geometry })
    }

    pub fn create_axes(&mut self, geometry: AxesGeometry) -> TrailResult<Glyph> {
        let handle = self.create_node(NodeKind::Axes)?;
        self.backend.set_shape(handle, NodeShape::Axes(geometry));
        Ok(Glyph::Axes { handle, geometry })
    }

    /// Create the glyph kind currently selected in `config`
    pub fn create(&mut self, config: &DisplayConfig) -> TrailResult<Glyph> {
        match config.shape {
            ShapeKind::Arrow => self.create_arrow(config.arrow),
            ShapeKind::Axes => self.create_axes(config.axes),
        }
    }

    pub fn create_ellipsoid(&mut self) -> TrailResult<GlyphHandle> {
        self.create_node(NodeKind::Ellipsoid)
    }

    pub fn destroy(&mut self, glyph: Glyph) {
        self.destroy_handle(glyph.handle());
    }

    pub fn destroy_handle(&mut self, handle: GlyphHandle) {
        self.backend.destroy(handle);
        self.live = self.live.saturating_sub(1);
    }

    pub fn place(&mut self, glyph: &Glyph, position: &Position, orientation: &Orientation) {
        self.backend.set_pose(glyph.handle(), position, orientation);
    }

    /// Apply the current color and the per-kind dimensions from `config`
    pub fn style(&mut self, glyph: &mut Glyph, config: &DisplayConfig) {
        let color = config.color.with_alpha(config.alpha);
        match glyph {
            Glyph::Arrow { handle, geometry } => {
                *geometry = config.arrow;
                self.backend.set_shape(*handle, NodeShape::Arrow(*geometry));
                self.backend.set_color(*handle, color);
            }
            Glyph::Axes { handle, geometry } => {
                *geometry = config.axes;
                self.backend.set_shape(*handle, NodeShape::Axes(*geometry));
                self.backend.set_color(*handle, color);
            }
        }
    }

    pub fn set_visible(&mut self, handle: GlyphHandle, visible: bool) {
        self.backend.set_visible(handle, visible);
    }

    /// Resources created here and not yet destroyed
    pub fn live(&self) -> usize {
        self.live
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    fn create_node(&mut self, kind: NodeKind) -> TrailResult<GlyphHandle> {
        let handle = self.backend.create(kind)?;
        self.live += 1;
        Ok(handle)
    }
}
