use anyhow::Result;
use log::{info, warn};
use rerun::{RecordingStream, RecordingStreamBuilder, RecordingStreamResult};

use super::{GlyphHandle, NodeKind, NodeShape, RenderBackend, Scene, SceneNode};
use crate::error::TrailResult;
use crate::types::{Orientation, Position, Rgba};

const ENTITY_ROOT: &str = "world/odometry";

/// Rerun 3D backend: arrows, axes triads and uncertainty ellipsoids
///
/// Node state is retained locally and re-logged on `flush`; hidden nodes are
/// cleared from the viewer and logged again once shown.
pub struct RerunBackend {
    rec: RecordingStream,
    scene: Scene,
}

impl RerunBackend {
    /// Initialize Rerun recording to file
    /// Takes output path (e.g., "odometry_sessions/trail_20251122_120000.rrd")
    pub fn new(output_path: &str) -> Result<Self> {
        let rec = RecordingStreamBuilder::new("odometry_trail")
            .save(output_path)
            .map_err(|e| anyhow::anyhow!("Failed to create Rerun recording: {}", e))?;

        info!("[RERUN] Recording initialized to: {}", output_path);

        Self::with_stream(rec)
    }

    /// Wrap an existing recording stream
    pub fn with_stream(rec: RecordingStream) -> Result<Self> {
        rec.log_static("world", &rerun::ViewCoordinates::RIGHT_HAND_Z_UP)?;
        Ok(RerunBackend {
            rec,
            scene: Scene::default(),
        })
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }
}

impl RenderBackend for RerunBackend {
    fn create(&mut self, kind: NodeKind) -> TrailResult<GlyphHandle> {
        Ok(self.scene.insert(kind))
    }

    fn destroy(&mut self, handle: GlyphHandle) {
        self.scene.remove(handle);
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

    fn invalidate_all(&mut self) {
        self.scene.mark_all_dirty();
    }

    fn set_time(&mut self, timestamp: f64) {
        self.rec.set_time_seconds("stable_time", timestamp);
    }

    fn flush(&mut self) {
        let (dirty, removed) = self.scene.take_changes();

        for handle in removed {
            if let Err(e) = self.rec.log(entity_path(handle), &rerun::Clear::recursive()) {
                warn!("[RERUN] Failed to clear glyph {}: {}", handle.0, e);
            }
        }

        for handle in dirty {
            let Some(node) = self.scene.get(handle) else {
                continue;
            };
            if let Err(e) = log_node(&self.rec, &entity_path(handle), node) {
                warn!("[RERUN] Failed to log glyph {}: {}", handle.0, e);
            }
        }
    }
}

fn entity_path(handle: GlyphHandle) -> String {
    format!("{}/{}", ENTITY_ROOT, handle.0)
}

fn log_node(rec: &RecordingStream, path: &str, node: &SceneNode) -> RecordingStreamResult<()> {
    if !node.visible {
        return rec.log(path, &rerun::Clear::flat());
    }
    // Not styled yet, nothing to draw
    let Some(shape) = node.shape else {
        return Ok(());
    };

    let origin = vec3(&node.position);
    match shape {
        NodeShape::Arrow(geometry) => {
            // Arrows point along the pose's local +X axis
            let tip = node.orientation * Position::x() * geometry.total_length();
            rec.log(
                path,
                &rerun::Arrows3D::from_vectors([vec3(&tip)])
                    .with_origins([origin])
                    .with_colors([color(node.color)])
                    .with_radii([geometry.shaft_radius as f32]),
            )
        }
        NodeShape::Axes(geometry) => {
            // Triad keeps the conventional X=red, Y=green, Z=blue; only alpha is styled
            let alpha = node.color.to_u8()[3];
            let axes = [Position::x(), Position::y(), Position::z()]
                .map(|axis| vec3(&(node.orientation * axis * geometry.length)));
            rec.log(
                path,
                &rerun::Arrows3D::from_vectors(axes)
                    .with_origins([origin; 3])
                    .with_colors([
                        rerun::Color::from_unmultiplied_rgba(255, 0, 0, alpha),
                        rerun::Color::from_unmultiplied_rgba(0, 255, 0, alpha),
                        rerun::Color::from_unmultiplied_rgba(0, 0, 255, alpha),
                    ])
                    .with_radii([geometry.radius as f32]),
            )
        }
        NodeShape::Ellipsoid { half_sizes } => {
            let q = node.orientation.quaternion();
            rec.log(
                path,
                &rerun::Ellipsoids3D::from_centers_and_half_sizes([origin], [vec3(&half_sizes)])
                    .with_quaternions([rerun::Quaternion::from_xyzw([
                        q.i as f32, q.j as f32, q.k as f32, q.w as f32,
                    ])])
                    .with_colors([color(node.color)])
                    .with_fill_mode(rerun::FillMode::Solid),
            )
        }
    }
}

fn vec3(v: &Position) -> [f32; 3] {
    [v.x as f32, v.y as f32, v.z as f32]
}

fn color(rgba: Rgba) -> rerun::Color {
    let [r, g, b, a] = rgba.to_u8();
    rerun::Color::from_unmultiplied_rgba(r, g, b, a)
}
