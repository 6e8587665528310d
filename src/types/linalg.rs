//! Linear algebra type system for pose samples
//!
//! Fixed-size nalgebra aliases so covariance blocks and pose parts are
//! dimension-checked at compile time.

use nalgebra::{SMatrix, SVector, UnitQuaternion};

// ===== Pose Dimensions =====
pub const POSE_DIM: usize = 6; // (x, y, z, roll, pitch, yaw)
pub const BLOCK_DIM: usize = 3;

/// Offset of the rotation block inside the 6×6 pose covariance
pub const ORIENTATION_OFFSET: usize = 3;

/// Row-major element count of a pose covariance on the wire
pub const COVARIANCE_LEN: usize = POSE_DIM * POSE_DIM; // 36

// ===== Pose Types =====
pub type Position = SVector<f64, BLOCK_DIM>;
pub type Orientation = UnitQuaternion<f64>;

// ===== Covariance Types =====
pub type PoseCovariance = SMatrix<f64, POSE_DIM, POSE_DIM>;
pub type BlockCovariance = SMatrix<f64, BLOCK_DIM, BLOCK_DIM>;

/// Extract one 3×3 diagonal block (0 = position, 3 = orientation)
pub fn covariance_block(covariance: &PoseCovariance, offset: usize) -> BlockCovariance {
    covariance
        .fixed_view::<BLOCK_DIM, BLOCK_DIM>(offset, offset)
        .into_owned()
}
