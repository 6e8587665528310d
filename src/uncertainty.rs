//! Covariance overlay: eigen-decomposed ellipsoids per retained entry
//!
//! The position part comes from the upper-left 3×3 block of the pose
//! covariance, the orientation part from the lower-right block. Principal
//! half-axes are `sqrt(eigenvalue) * scale`; the eigenvector basis gives the
//! ellipsoid rotation.

use log::debug;
use nalgebra::{Rotation3, SymmetricEigen};

use crate::backend::{GlyphHandle, NodeShape, RenderBackend};
use crate::config::{CovariancePartKind, CovarianceStyle, OrientationFrame};
use crate::error::{TrailError, TrailResult};
use crate::glyph::GlyphFactory;
use crate::types::{
    covariance_block, BlockCovariance, Orientation, PoseCovariance, Position, ORIENTATION_OFFSET,
};

/// Extent and rotation of an ellipsoid before it is placed in the scene
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EllipsoidShape {
    pub half_sizes: Position,
    pub rotation: Orientation,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ellipsoid {
    pub handle: GlyphHandle,
    pub shape: EllipsoidShape,
}

/// Uncertainty glyphs of one entry; a part is `None` while hidden by config
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct UncertaintyVisual {
    pub position: Option<Ellipsoid>,
    pub orientation: Option<Ellipsoid>,
}

impl UncertaintyVisual {
    fn part_mut(&mut self, kind: CovariancePartKind) -> &mut Option<Ellipsoid> {
        match kind {
            CovariancePartKind::Position => &mut self.position,
            CovariancePartKind::Orientation => &mut self.orientation,
        }
    }

    pub fn handles(&self) -> impl Iterator<Item = GlyphHandle> + '_ {
        self.position
            .iter()
            .chain(self.orientation.iter())
            .map(|e| e.handle)
    }

    pub fn is_empty(&self) -> bool {
        self.position.is_none() && self.orientation.is_none()
    }
}

const PARTS: [CovariancePartKind; 2] = [CovariancePartKind::Position, CovariancePartKind::Orientation];

#[derive(Clone, Copy, Debug, Default)]
pub struct UncertaintyRenderer;

impl UncertaintyRenderer {
    pub fn new() -> Self {
        UncertaintyRenderer
    }

    /// Unit-scale ellipsoid of a symmetric 3×3 covariance block
    ///
    /// Negative eigenvalues from a near-singular matrix clamp to a zero-extent
    /// axis; this is not reported as a fault.
    pub fn decompose(&self, block: &BlockCovariance) -> EllipsoidShape {
        let symmetric = (block + block.transpose()) * 0.5;
        let eigen = SymmetricEigen::new(symmetric);

        let half_sizes = eigen.eigenvalues.map(|lambda| lambda.max(0.0).sqrt());

        let mut basis = eigen.eigenvectors;
        if !basis.iter().all(|v| v.is_finite()) {
            debug!("eigen basis not finite, using identity");
            return EllipsoidShape {
                half_sizes,
                rotation: Orientation::identity(),
            };
        }
        // Reflection to proper rotation
        if basis.determinant() < 0.0 {
            basis.column_mut(2).neg_mut();
        }
        let rotation = Orientation::from_rotation_matrix(&Rotation3::from_matrix_unchecked(basis));

        EllipsoidShape {
            half_sizes,
            rotation,
        }
    }

    /// Scaled, oriented ellipsoid for one covariance part of a pose
    pub fn shape(
        &self,
        covariance: &PoseCovariance,
        part: CovariancePartKind,
        style: &CovarianceStyle,
        pose_orientation: &Orientation,
    ) -> EllipsoidShape {
        let offset = match part {
            CovariancePartKind::Position => 0,
            CovariancePartKind::Orientation => ORIENTATION_OFFSET,
        };
        let unit = self.decompose(&covariance_block(covariance, offset));
        let rotation = match (part, style.orientation_frame) {
            (CovariancePartKind::Orientation, OrientationFrame::Rotating) => {
                pose_orientation * unit.rotation
            }
            _ => unit.rotation,
        };
        EllipsoidShape {
            half_sizes: unit.half_sizes * style.part(part).scale,
            rotation,
        }
    }

    /// Bring `visual` in line with `style`: create enabled parts, restyle
    /// existing ones, destroy parts that are switched off
    ///
    /// A failed creation leaves that part empty and is returned after the
    /// other part has been handled.
    #[allow(clippy::too_many_arguments)]
    pub fn apply<B: RenderBackend>(
        &self,
        factory: &mut GlyphFactory<B>,
        visual: &mut UncertaintyVisual,
        position: &Position,
        orientation: &Orientation,
        covariance: &PoseCovariance,
        style: &CovarianceStyle,
        visible: bool,
    ) -> TrailResult<()> {
        let mut fault: Option<TrailError> = None;

        for kind in PARTS {
            let slot = visual.part_mut(kind);
            if !style.part_enabled(kind) {
                if let Some(ellipsoid) = slot.take() {
                    factory.destroy_handle(ellipsoid.handle);
                }
                continue;
            }

            let handle = match slot.as_ref() {
                Some(ellipsoid) => ellipsoid.handle,
                None => match factory.create_ellipsoid() {
                    Ok(handle) => handle,
                    Err(e) => {
                        fault.get_or_insert(e);
                        continue;
                    }
                },
            };

            let shape = self.shape(covariance, kind, style, orientation);
            let part = style.part(kind);
            let backend = factory.backend_mut();
            backend.set_pose(handle, position, &shape.rotation);
            backend.set_shape(
                handle,
                NodeShape::Ellipsoid {
                    half_sizes: shape.half_sizes,
                },
            );
            backend.set_color(handle, part.color.with_alpha(part.alpha));
            backend.set_visible(handle, visible);
            *slot = Some(Ellipsoid { handle, shape });
        }

        match fault {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub fn set_visible<B: RenderBackend>(
        &self,
        factory: &mut GlyphFactory<B>,
        visual: &UncertaintyVisual,
        visible: bool,
    ) {
        for handle in visual.handles() {
            factory.set_visible(handle, visible);
        }
    }
}
